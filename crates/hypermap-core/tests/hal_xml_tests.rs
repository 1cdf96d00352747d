use std::sync::Arc;

use hypermap_core::hal::{FormatError, HalXmlSerializer};
use hypermap_core::model::{Link, Relation, Resource, ResourceCollection, Value, ValueKind};
use hypermap_core::schema::{EntitySchema, PropertySchema, SchemaRegistry};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(
        SchemaRegistry::builder()
            .register(
                EntitySchema::new("Order")
                    .with(PropertySchema::state("Id", ValueKind::String).key().included())
                    .with(PropertySchema::state("Total", ValueKind::Float).included())
                    .with(PropertySchema::state("Paid", ValueKind::Bool).included())
                    .with(
                        PropertySchema::state("Note", ValueKind::String)
                            .included()
                            .rename("note"),
                    )
                    .with(PropertySchema::reference("Customer", "Customer"))
                    .with(PropertySchema::collection("Items", "LineItem")),
            )
            .register(
                EntitySchema::new("Customer")
                    .with(PropertySchema::state("Id", ValueKind::Int).key().included())
                    .with(PropertySchema::state("Name", ValueKind::String).included()),
            )
            .register(
                EntitySchema::new("LineItem")
                    .with(PropertySchema::state("Id", ValueKind::Int).key().included())
                    .with(PropertySchema::state("Sku", ValueKind::String).included()),
            )
            .build()
            .unwrap(),
    )
}

fn with_self(mut resource: Resource, href: String) -> Resource {
    resource.links.set_self(href).unwrap();
    resource
}

fn customer(id: i64, name: &str) -> Resource {
    with_self(
        Resource::new("Customer")
            .with_state("Id", id)
            .with_state("Name", name),
        format!("http://api.test/customers/{id}"),
    )
}

fn line_item(id: i64, sku: &str) -> Resource {
    with_self(
        Resource::new("LineItem")
            .with_state("Id", id)
            .with_state("Sku", sku),
        format!("http://api.test/lineitems/{id}"),
    )
}

fn items(lines: Vec<Resource>) -> ResourceCollection {
    let mut collection = ResourceCollection::new("LineItem", "Items").with_items(lines);
    collection
        .links
        .set_self("http://api.test/lineitems?$filter=Order/Id eq 'A1'")
        .unwrap();
    collection
}

fn order(id: &str, total: f64, paid: bool, note: Value) -> Resource {
    let mut order = Resource::new("Order")
        .with_state("Id", id)
        .with_state("Total", total)
        .with_state("Paid", paid)
        .with_state("Note", note);
    order.links.set_self(format!("http://api.test/orders/{id}")).unwrap();
    order
}

/// Element rels are positional on the wire; compare everything else.
fn without_rels(mut resource: Resource) -> Resource {
    resource.rel = None;
    for relation in resource.relations.values_mut() {
        match relation {
            Relation::Single(Some(child)) => {
                **child = without_rels(std::mem::replace(child.as_mut(), Resource::new("")));
            }
            Relation::Many(Some(collection)) => {
                collection.items = std::mem::take(&mut collection.items)
                    .into_iter()
                    .map(without_rels)
                    .collect();
            }
            _ => {}
        }
    }
    resource
}

#[test]
fn test_document_shape() {
    let mut resource = order("A1", 12.5, true, Value::from("fragile"))
        .with_relation("Customer", Relation::single(customer(7, "Ada")))
        .with_relation("Items", Relation::many(items(vec![line_item(1, "bolt")])));
    resource.rel = Some("orders".to_string());
    resource
        .links
        .add(Link::new("Items", "http://api.test/lineitems?x=1").unwrap());

    let xml = HalXmlSerializer::new(registry(), true)
        .to_string(&resource)
        .unwrap();

    let expected = concat!(
        r#"<?xml version="1.0" encoding="utf-8"?>"#,
        r#"<resource rel="orders" href="http://api.test/orders/A1">"#,
        r#"<link rel="Items" href="http://api.test/lineitems?x=1"/>"#,
        r#"<Id>A1</Id><Total>12.5</Total><Paid>true</Paid><note>fragile</note>"#,
        r#"<resource rel="Customer" href="http://api.test/customers/7">"#,
        r#"<Id>7</Id><Name>Ada</Name></resource>"#,
        r#"<resource rel="Items" href="http://api.test/lineitems?$filter=Order/Id eq &apos;A1&apos;">"#,
        r#"<resource rel="LineItem" href="http://api.test/lineitems/1">"#,
        r#"<Id>1</Id><Sku>bolt</Sku></resource>"#,
        r#"</resource>"#,
        r#"</resource>"#,
    );
    assert_eq!(xml, expected);
}

#[test]
fn test_round_trip_nested() {
    let serializer = HalXmlSerializer::new(registry(), true);
    let mut resource = order("A1", 12.5, true, Value::from("fragile"))
        .with_relation("Customer", Relation::single(customer(7, "Ada")))
        .with_relation(
            "Items",
            Relation::many(items(vec![line_item(1, "bolt"), line_item(2, "nut & washer")])),
        );
    resource.links.add(
        Link::new("search", "http://api.test/orders{?q}")
            .unwrap()
            .templated()
            .with_title("Search"),
    );

    let bytes = serializer.to_vec(&resource).unwrap();
    let read = serializer.read_resource(&bytes, "Order").unwrap();

    assert_eq!(without_rels(read), without_rels(resource));
}

#[test]
fn test_default_values_are_omitted_by_default() {
    let resource = order("A1", 0.0, false, Value::Null);
    let serializer = HalXmlSerializer::new(registry(), true);

    let xml = serializer.to_string(&resource).unwrap();
    assert!(!xml.contains("<Total>"));
    assert!(!xml.contains("<Paid>"));
    assert!(!xml.contains("<note"));

    let read = serializer.read_resource(xml.as_bytes(), "Order").unwrap();
    assert_eq!(read.get("Total"), None);
    assert_eq!(read.get("Id"), Some(&Value::from("A1")));
}

#[test]
fn test_collection_document() {
    let serializer = HalXmlSerializer::new(registry(), true);
    let mut collection = ResourceCollection::new("LineItem", "lineitems")
        .with_items(vec![line_item(1, "bolt"), line_item(2, "nut")]);
    collection.links.set_self("http://api.test/lineitems").unwrap();
    collection
        .links
        .add(Link::next("http://api.test/lineitems?$skip=2").unwrap());

    let bytes = serializer.collection_to_vec(&collection).unwrap();
    let read = serializer.read_collection(&bytes, "LineItem").unwrap();

    assert_eq!(read.rel, "lineitems");
    assert_eq!(read.links, collection.links);
    assert_eq!(read.len(), 2);
    assert_eq!(read.items[1].get("Sku"), Some(&Value::from("nut")));
    assert_eq!(read.items[0].rel.as_deref(), Some("LineItem"));
}

#[test]
fn test_unknown_nested_rel_is_skipped() {
    let serializer = HalXmlSerializer::new(registry(), true);
    let xml = br#"<?xml version="1.0"?>
<resource rel="orders" href="http://api.test/orders/B2">
  <Id>B2</Id>
  <resource rel="Warehouse" href="http://api.test/warehouses/1"><Id>1</Id></resource>
</resource>"#;

    let read = serializer.read_resource(xml, "Order").unwrap();
    assert_eq!(read.get("Id"), Some(&Value::from("B2")));
    assert!(read.relations.is_empty());
}

#[test]
fn test_malformed_documents() {
    let serializer = HalXmlSerializer::new(registry(), true);

    let truncated = serializer.read_resource(b"<resource rel=\"orders\"><Id>A1</Id>", "Order");
    assert!(truncated.is_err());

    let not_utf8 = serializer.read_resource(&[0xff, 0xfe, 0x00], "Order");
    assert!(matches!(not_utf8, Err(FormatError::Utf8(_))));

    let unknown = serializer.read_resource(b"<resource/>", "Basemap");
    assert!(matches!(unknown, Err(FormatError::UnknownType(_))));
}

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 &<>'\"]{0,16}"
}

proptest! {
    #[test]
    fn prop_round_trip(
        id in "[A-Z][0-9]{1,4}",
        total in -1.0e6f64..1.0e6,
        paid in any::<bool>(),
        note in proptest::option::of(text()),
        customer_id in any::<i64>(),
        customer_name in text(),
        lines in proptest::collection::vec((any::<i64>(), text()), 0..4),
    ) {
        // emit defaults so every declared property survives the trip
        let serializer = HalXmlSerializer::new(registry(), false);
        let resource = order(&id, total, paid, Value::from(note))
            .with_relation("Customer", Relation::single(customer(customer_id, &customer_name)))
            .with_relation(
                "Items",
                Relation::many(items(
                    lines.iter().map(|(i, sku)| line_item(*i, sku)).collect(),
                )),
            );

        let bytes = serializer.to_vec(&resource).unwrap();
        let read = serializer.read_resource(&bytes, "Order").unwrap();

        prop_assert_eq!(read.links.self_href(), resource.links.self_href());
        prop_assert_eq!(without_rels(read), without_rels(resource));
    }
}
