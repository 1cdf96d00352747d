use std::sync::Arc;

use hypermap_core::graph::{DomainGraph, Entity, GraphCleaner, NodeId};
use hypermap_core::links::{EnrichError, LinkEnricher, RouteUrlBuilder, UrlBuilder};
use hypermap_core::model::{Relation, Resource, ValueKind};
use hypermap_core::naming::{ControllerMapping, ControllerResolver, ResolveError};
use hypermap_core::schema::{EntitySchema, PropertySchema, SchemaError, SchemaRegistry};
use hypermap_core::HalJsonSerializer;
use proptest::prelude::*;
use url::Url;

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(
        SchemaRegistry::builder()
            .register(
                EntitySchema::new("Product")
                    .with(PropertySchema::state("Id", ValueKind::Int).key())
                    .with(PropertySchema::state("Name", ValueKind::String).included()),
            )
            .register(
                EntitySchema::new("Order")
                    .with(PropertySchema::state("Id", ValueKind::String).key())
                    .with(PropertySchema::state("Total", ValueKind::Float).included())
                    .with(PropertySchema::collection("Items", "LineItem")),
            )
            .register(
                EntitySchema::new("LineItem")
                    .with(PropertySchema::state("Id", ValueKind::Int).key())
                    .with(PropertySchema::state("Sku", ValueKind::String).included())
                    .with(PropertySchema::reference("Order", "Order")),
            )
            .build()
            .unwrap(),
    )
}

fn enricher_over(registry: Arc<SchemaRegistry>, resolver: ControllerResolver) -> LinkEnricher {
    let urls: Arc<dyn UrlBuilder> = Arc::new(
        RouteUrlBuilder::new("http://api.test/")
            .unwrap()
            .with_route("DefaultApi", "{controller}/{id?}"),
    );
    LinkEnricher::new(registry, Arc::new(resolver), urls, "DefaultApi")
}

fn enricher_with(resolver: ControllerResolver) -> LinkEnricher {
    enricher_over(registry(), resolver)
}

fn enricher() -> LinkEnricher {
    enricher_with(ControllerResolver::new(ControllerMapping::new([
        ("Product", "products"),
        ("Order", "orders"),
        ("LineItem", "lineitems"),
    ])))
}

fn product(id: i64) -> Resource {
    Resource::new("Product")
        .with_state("Id", id)
        .with_state("Name", "Widget")
}

#[test]
fn test_product_example_end_to_end() {
    let registry = registry();
    let mut graph = DomainGraph::new();
    let root = graph.insert(
        Entity::new("Product")
            .with_value("Id", 42)
            .with_value("Name", "Widget"),
    );

    let mut resource = GraphCleaner::new(&registry).clean(&graph, root).unwrap();
    enricher().enrich_entity(&mut resource).unwrap();

    let json = HalJsonSerializer::new(registry).to_string(&resource).unwrap();
    assert_eq!(
        json,
        r#"{"_links":{"self":{"href":"http://api.test/products/42"}},"Name":"Widget","_embedded":{}}"#
    );
}

#[test]
fn test_rel_is_resource_name() {
    let mut resource = product(1);
    enricher().enrich_entity(&mut resource).unwrap();
    assert_eq!(resource.rel.as_deref(), Some("products"));
}

#[test]
fn test_collection_links_filter_back_to_parent() {
    let registry = registry();
    let mut graph = DomainGraph::new();
    let order = graph.insert(
        Entity::new("Order")
            .with_value("Id", "A1")
            .with_value("Total", 12.5),
    );
    for (id, sku) in [(1, "bolt"), (2, "nut")] {
        let line = graph.insert(
            Entity::new("LineItem")
                .with_value("Id", id)
                .with_value("Sku", sku),
        );
        graph.connect(line, "Order", order, Some("Items"));
    }

    let mut resource = GraphCleaner::new(&registry).clean(&graph, order).unwrap();
    enricher().enrich_entity(&mut resource).unwrap();

    assert_eq!(resource.links.self_href(), Some("http://api.test/orders/A1"));

    let items_link = resource.links.get("Items").expect("parent → collection link");
    let url = Url::parse(items_link.href()).unwrap();
    assert_eq!(url.path(), "/lineitems");
    let filter: Vec<_> = url.query_pairs().collect();
    assert_eq!(filter.len(), 1);
    assert_eq!(filter[0].0, "$filter");
    assert_eq!(filter[0].1, "Order/Id eq 'A1'");

    let collection = resource.relation("Items").and_then(Relation::as_many).unwrap();
    assert_eq!(collection.links.self_href(), Some(items_link.href()));
    assert_eq!(collection.len(), 2);
    assert_eq!(
        collection.items[1].links.self_href(),
        Some("http://api.test/lineitems/2")
    );
    // the back-reference was cut by the cleaner, so it carries no link
    assert!(collection.items[0].links.get("Order").is_none());
}

#[test]
fn test_child_link_uses_property_name() {
    let registry = registry();
    let mut graph = DomainGraph::new();
    let order = graph.insert(Entity::new("Order").with_value("Id", "A1"));
    let line = graph.insert(Entity::new("LineItem").with_value("Id", 9));
    graph.connect(line, "Order", order, Some("Items"));

    let mut resource = GraphCleaner::new(&registry).clean(&graph, line).unwrap();
    enricher().enrich_entity(&mut resource).unwrap();

    assert_eq!(
        resource.links.get("Order").map(|l| l.href()),
        Some("http://api.test/orders/A1")
    );
    let parent = resource.relation("Order").and_then(Relation::as_single).unwrap();
    assert_eq!(parent.links.self_href(), Some("http://api.test/orders/A1"));
    // Order.Items → LineItem 9 is an ancestor, so the collection is empty
    let items = parent.relation("Items").and_then(Relation::as_many).unwrap();
    assert!(items.is_empty());
}

#[test]
fn test_identical_child_link_is_self() {
    let mut graph = DomainGraph::new();
    let id = graph.insert(Entity::new("Product").with_value("Id", 5));

    let mut child = product(5);
    child.origin = Some(id);
    let mut parent = product(5).with_relation("Me", Relation::single(child));
    parent.origin = Some(id);

    enricher().enrich_entity(&mut parent).unwrap();

    assert_eq!(parent.links.count("self"), 1);
    assert!(parent.links.get("Me").is_none());
}

#[test]
fn test_missing_key_skips_self_link() {
    let mut resource = Resource::new("Product").with_state("Name", "Keyless");
    enricher().enrich_entity(&mut resource).unwrap();
    assert!(resource.links.is_empty());
}

#[test]
fn test_unresolvable_controller() {
    let enricher = enricher_with(ControllerResolver::default().with_pluralize_fallback(false));
    let err = enricher.enrich_entity(&mut product(1)).unwrap_err();
    assert_eq!(
        err,
        EnrichError::Resolve(ResolveError::NoController("Product".to_string()))
    );
}

#[test]
fn test_pluralized_fallback_names() {
    let enricher = enricher_with(ControllerResolver::default());
    let mut resource = product(3);
    enricher.enrich_entity(&mut resource).unwrap();
    assert_eq!(resource.links.self_href(), Some("http://api.test/products/3"));
}

#[test]
fn test_unregistered_type() {
    let err = enricher()
        .enrich_entity(&mut Resource::new("Invoice"))
        .unwrap_err();
    assert_eq!(
        err,
        EnrichError::Schema(SchemaError::UnknownType("Invoice".to_string()))
    );
}

fn filter_of(href: &str) -> String {
    let url = Url::parse(href).unwrap();
    url.query_pairs()
        .find(|(name, _)| name == "$filter")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

/// Posts and tags reference each other through collections on both sides.
fn blog_registry() -> Arc<SchemaRegistry> {
    Arc::new(
        SchemaRegistry::builder()
            .register(
                EntitySchema::new("Post")
                    .with(PropertySchema::state("Id", ValueKind::Int).key())
                    .with(PropertySchema::collection("Tags", "Tag").rename("labels")),
            )
            .register(
                EntitySchema::new("Tag")
                    .with(PropertySchema::state("Id", ValueKind::Int).key())
                    .with(PropertySchema::collection("Posts", "Post")),
            )
            .build()
            .unwrap(),
    )
}

fn blog_graph() -> (DomainGraph, NodeId) {
    let mut graph = DomainGraph::new();
    let post = graph.insert(Entity::new("Post").with_value("Id", 1));
    for id in [7, 8] {
        let tag = graph.insert(Entity::new("Tag").with_value("Id", id));
        graph.get_mut(post).unwrap().push_ref("Tags", tag);
        graph.get_mut(tag).unwrap().push_ref("Posts", post);
    }
    (graph, post)
}

#[test]
fn test_many_to_many_filter_uses_any() {
    let registry = blog_registry();
    let (graph, post) = blog_graph();
    let enricher = enricher_over(
        registry.clone(),
        ControllerResolver::new(ControllerMapping::new([("Post", "posts"), ("Tag", "tags")])),
    );

    let mut resource = GraphCleaner::new(&registry).clean(&graph, post).unwrap();
    enricher.enrich_entity(&mut resource).unwrap();

    let link = resource.links.get("labels").expect("post → tags link");
    assert_eq!(Url::parse(link.href()).unwrap().path(), "/tags");
    // tags whose Posts collection contains post 1
    assert_eq!(filter_of(link.href()), "Posts/any(Post: Post/Id eq 1)");

    let tags = resource.relation("Tags").and_then(Relation::as_many).unwrap();
    assert_eq!(tags.links.self_href(), Some(link.href()));
    assert_eq!(tags.items[0].links.self_href(), Some("http://api.test/tags/7"));
}

#[test]
fn test_many_to_many_from_the_other_side() {
    let registry = blog_registry();
    let mut graph = DomainGraph::new();
    let tag = graph.insert(Entity::new("Tag").with_value("Id", 1));
    let post = graph.insert(Entity::new("Post").with_value("Id", 3));
    graph.get_mut(tag).unwrap().push_ref("Posts", post);
    graph.get_mut(post).unwrap().push_ref("Tags", tag);

    let enricher = enricher_over(
        registry.clone(),
        ControllerResolver::new(ControllerMapping::new([("Post", "posts"), ("Tag", "tags")])),
    );
    let mut resource = GraphCleaner::new(&registry).clean(&graph, tag).unwrap();
    enricher.enrich_entity(&mut resource).unwrap();

    let link = resource.links.get("Posts").expect("tag → posts link");
    assert_eq!(Url::parse(link.href()).unwrap().path(), "/posts");
    assert_eq!(filter_of(link.href()), "Tags/any(Tag: Tag/Id eq 1)");
}

#[test]
fn test_link_rel_matches_embedded_name() {
    let registry = blog_registry();
    let (graph, post) = blog_graph();
    let enricher = enricher_over(
        registry.clone(),
        ControllerResolver::new(ControllerMapping::new([("Post", "posts"), ("Tag", "tags")])),
    );

    let mut resource = GraphCleaner::new(&registry).clean(&graph, post).unwrap();
    enricher.enrich_entity(&mut resource).unwrap();
    assert!(resource.links.get("Tags").is_none());

    let json = HalJsonSerializer::new(registry).to_string(&resource).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["_links"]["labels"]["href"].is_string());
    assert!(value["_embedded"]["labels"].is_array());
}

#[test]
fn test_ambiguous_back_reference_skips_collection_link() {
    let registry = Arc::new(
        SchemaRegistry::builder()
            .register(
                EntitySchema::new("Airport")
                    .with(PropertySchema::state("Code", ValueKind::String).key())
                    .with(PropertySchema::collection("Departures", "Flight")),
            )
            .register(
                EntitySchema::new("Flight")
                    .with(PropertySchema::state("Id", ValueKind::Int).key())
                    .with(PropertySchema::reference("Origin", "Airport"))
                    .with(PropertySchema::reference("Destination", "Airport")),
            )
            .build()
            .unwrap(),
    );
    let mut graph = DomainGraph::new();
    let ams = graph.insert(Entity::new("Airport").with_value("Code", "AMS"));
    let lhr = graph.insert(Entity::new("Airport").with_value("Code", "LHR"));
    let flight = graph.insert(Entity::new("Flight").with_value("Id", 1001));
    graph.connect(flight, "Origin", ams, Some("Departures"));
    graph.connect(flight, "Destination", lhr, None);

    let enricher = enricher_over(
        registry.clone(),
        ControllerResolver::new(ControllerMapping::new([
            ("Airport", "airports"),
            ("Flight", "flights"),
        ])),
    );
    let mut resource = GraphCleaner::new(&registry).clean(&graph, ams).unwrap();
    enricher.enrich_entity(&mut resource).unwrap();

    assert_eq!(resource.links.self_href(), Some("http://api.test/airports/AMS"));
    assert!(resource.links.get("Departures").is_none());

    let departures = resource.relation("Departures").and_then(Relation::as_many).unwrap();
    assert_eq!(departures.links.self_href(), None);
    // items are still linked individually
    assert_eq!(
        departures.items[0].links.self_href(),
        Some("http://api.test/flights/1001")
    );
}

proptest! {
    #[test]
    fn prop_single_self_link(id in any::<i64>(), passes in 1usize..4) {
        let enricher = enricher();
        let mut resource = product(id);
        for _ in 0..passes {
            enricher.enrich_entity(&mut resource).unwrap();
        }
        prop_assert_eq!(resource.links.count("self"), 1);
        let expected = format!("http://api.test/products/{}", id);
        prop_assert_eq!(resource.links.self_href(), Some(expected.as_str()));
    }
}
