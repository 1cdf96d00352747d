//! Convention-based link enrichment of resource trees.

use std::sync::Arc;

use crate::graph::NodeId;
use crate::model::{Link, Relation, Resource, ResourceCollection, Value, REL_SELF};
use crate::naming::ControllerResolver;
use crate::schema::{EntitySchema, SchemaRegistry};

use super::odata::collection_filter;
use super::routes::{RouteValues, UrlBuilder};
use super::EnrichError;

/// Walks a cleaned resource tree and attaches HAL links.
///
/// For every resource:
/// - a `self` link built from its resource name and key
/// - for each single relation, a link from the parent to the child
///   (rel = the property's output name)
/// - for each collection relation, a `self` link on the collection and a
///   link from the parent (rel = the property's output name), both addressing the child
///   resource set filtered back to this parent
///
/// and then recurses into every related resource.
#[derive(Clone)]
pub struct LinkEnricher {
    registry: Arc<SchemaRegistry>,
    resolver: Arc<ControllerResolver>,
    urls: Arc<dyn UrlBuilder>,
    route_name: String,
}

impl LinkEnricher {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        resolver: Arc<ControllerResolver>,
        urls: Arc<dyn UrlBuilder>,
        route_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            resolver,
            urls,
            route_name: route_name.into(),
        }
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn resolver(&self) -> &ControllerResolver {
        &self.resolver
    }

    /// Enrich a resource and everything reachable through its relations.
    pub fn enrich_entity(&self, resource: &mut Resource) -> Result<(), EnrichError> {
        let schema = self.registry.require(&resource.type_name)?;
        let controller = self.resolver.resolve(&resource.type_name)?;

        if resource.rel.is_none() {
            resource.rel = Some(controller.clone());
        }
        if let Some(href) = self.self_href(schema, &controller, resource)? {
            resource.links.set_self(href)?;
        }

        let parent_type = resource.type_name.clone();
        let parent_origin = resource.origin;
        let parent_key = schema
            .key_value(resource)
            .ok()
            .map(|(p, v)| (p.name.clone(), v.clone()));

        let mut parent_links = Vec::new();
        for (name, relation) in resource.relations.iter_mut() {
            // links use the same name the relation is serialized under
            let rel = schema
                .property(name)
                .map_or(name.as_str(), |p| p.output_name());
            match relation {
                Relation::Many(Some(collection)) => {
                    let href = self.collection_href(&parent_type, parent_key.as_ref(), collection)?;
                    if let Some(href) = href {
                        collection.links.set_self(href.clone())?;
                        parent_links.push(Link::new(rel, href)?);
                    }
                    self.enrich_collection(collection)?;
                }
                Relation::Single(Some(child)) => {
                    if let Some(href) = self.entity_href(child)? {
                        let rel = if is_same_node(parent_origin, child.origin) {
                            REL_SELF
                        } else {
                            rel
                        };
                        parent_links.push(Link::new(rel, href)?);
                    }
                    self.enrich_entity(child)?;
                }
                // missing or cut references get no links
                Relation::Many(None) | Relation::Single(None) => {}
            }
        }

        for link in parent_links {
            resource.links.add(link);
        }
        Ok(())
    }

    /// Enrich every item of a collection.
    pub fn enrich_collection(&self, collection: &mut ResourceCollection) -> Result<(), EnrichError> {
        for item in collection.items.iter_mut() {
            self.enrich_entity(item)?;
        }
        Ok(())
    }

    /// The canonical URI of a resource, or `None` when it has no key.
    pub fn entity_href(&self, resource: &Resource) -> Result<Option<String>, EnrichError> {
        let schema = self.registry.require(&resource.type_name)?;
        let controller = self.resolver.resolve(&resource.type_name)?;
        self.self_href(schema, &controller, resource)
    }

    fn self_href(
        &self,
        schema: &EntitySchema,
        controller: &str,
        resource: &Resource,
    ) -> Result<Option<String>, EnrichError> {
        match schema.key_value(resource) {
            Ok((_, key)) => {
                let href = self
                    .urls
                    .link(&self.route_name, controller, &RouteValues::Key(key))?;
                Ok(Some(href))
            }
            Err(e) if e.is_missing_key() => {
                tracing::trace!(type_name = %resource.type_name, "no key, self link skipped");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn collection_href(
        &self,
        parent_type: &str,
        parent_key: Option<&(String, Value)>,
        collection: &ResourceCollection,
    ) -> Result<Option<String>, EnrichError> {
        let Some((key_name, key_value)) = parent_key else {
            tracing::trace!(parent_type, "parent has no key, collection link skipped");
            return Ok(None);
        };

        let Some(navigation) = self
            .registry
            .navigation_property(&collection.element_type, parent_type)
        else {
            tracing::trace!(
                parent_type,
                element_type = %collection.element_type,
                "no navigation property back to parent, collection link skipped"
            );
            return Ok(None);
        };

        let filter = collection_filter(navigation, parent_type, key_name, key_value);
        let controller = self.resolver.resolve(&collection.element_type)?;
        let href = self
            .urls
            .link(&self.route_name, &controller, &RouteValues::Filter(filter))?;
        Ok(Some(href))
    }
}

fn is_same_node(a: Option<NodeId>, b: Option<NodeId>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}
