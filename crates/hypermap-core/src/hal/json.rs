//! HAL+JSON rendering.
//!
//! ```json
//! {
//!   "_links": { "self": { "href": "http://api.test/products/42" } },
//!   "Name": "Widget",
//!   "_embedded": {}
//! }
//! ```

use std::sync::Arc;

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::model::{Link, Links, Relation, Resource, ResourceCollection};
use crate::schema::{PropertyKind, SchemaRegistry};

use super::{FormatError, HAL_JSON};

/// JSON omits default values only when a property asks for it.
const OMIT_DEFAULT_FALLBACK: bool = false;

/// Writes resources as `application/hal+json`.
///
/// Write-only: reading HAL+JSON back fails with
/// [`FormatError::ReadNotSupported`].
#[derive(Debug, Clone)]
pub struct HalJsonSerializer {
    registry: Arc<SchemaRegistry>,
}

impl HalJsonSerializer {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn to_vec(&self, resource: &Resource) -> Result<Vec<u8>, FormatError> {
        self.check_resource(resource)?;
        Ok(serde_json::to_vec(&JsonResource {
            resource,
            registry: &self.registry,
        })?)
    }

    pub fn to_string(&self, resource: &Resource) -> Result<String, FormatError> {
        self.check_resource(resource)?;
        Ok(serde_json::to_string(&JsonResource {
            resource,
            registry: &self.registry,
        })?)
    }

    pub fn collection_to_vec(&self, collection: &ResourceCollection) -> Result<Vec<u8>, FormatError> {
        self.check_collection(collection)?;
        Ok(serde_json::to_vec(&JsonCollection {
            collection,
            registry: &self.registry,
        })?)
    }

    pub fn collection_to_string(
        &self,
        collection: &ResourceCollection,
    ) -> Result<String, FormatError> {
        self.check_collection(collection)?;
        Ok(serde_json::to_string(&JsonCollection {
            collection,
            registry: &self.registry,
        })?)
    }

    /// HAL+JSON input is not accepted.
    pub fn read(&self, _bytes: &[u8]) -> Result<Resource, FormatError> {
        Err(FormatError::ReadNotSupported(HAL_JSON))
    }

    fn check_resource(&self, resource: &Resource) -> Result<(), FormatError> {
        if !self.registry.contains(&resource.type_name) {
            return Err(FormatError::UnknownType(resource.type_name.clone()));
        }
        for relation in resource.relations.values() {
            match relation {
                Relation::Single(Some(child)) => self.check_resource(child)?,
                Relation::Many(Some(collection)) => self.check_collection(collection)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn check_collection(&self, collection: &ResourceCollection) -> Result<(), FormatError> {
        collection
            .items
            .iter()
            .try_for_each(|item| self.check_resource(item))
    }
}

// =============================================================================
// Serialize Adapters
// =============================================================================

struct JsonResource<'a> {
    resource: &'a Resource,
    registry: &'a SchemaRegistry,
}

impl Serialize for JsonResource<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let schema = self.registry.get(&self.resource.type_name).ok_or_else(|| {
            S::Error::custom(format!("no schema for {}", self.resource.type_name))
        })?;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("_links", &JsonLinks(&self.resource.links))?;

        for property in schema.state_properties() {
            if let Some(value) = self.resource.get(&property.name) {
                if property.should_emit(value, OMIT_DEFAULT_FALLBACK) {
                    map.serialize_entry(property.output_name(), value)?;
                }
            }
        }

        map.serialize_entry(
            "_embedded",
            &JsonEmbedded {
                resource: self.resource,
                registry: self.registry,
            },
        )?;
        map.end()
    }
}

struct JsonEmbedded<'a> {
    resource: &'a Resource,
    registry: &'a SchemaRegistry,
}

impl Serialize for JsonEmbedded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let schema = self.registry.get(&self.resource.type_name).ok_or_else(|| {
            S::Error::custom(format!("no schema for {}", self.resource.type_name))
        })?;

        let mut map = serializer.serialize_map(None)?;
        for property in schema.navigation_properties() {
            if property.emit.ignore {
                continue;
            }
            match (self.resource.relation(&property.name), &property.kind) {
                (Some(Relation::Single(Some(child))), PropertyKind::Reference(_)) => {
                    map.serialize_entry(
                        property.output_name(),
                        &JsonResource {
                            resource: child,
                            registry: self.registry,
                        },
                    )?;
                }
                (Some(Relation::Many(Some(collection))), PropertyKind::Collection(_)) => {
                    map.serialize_entry(
                        property.output_name(),
                        &JsonItems {
                            items: &collection.items,
                            registry: self.registry,
                        },
                    )?;
                }
                _ => {}
            }
        }
        map.end()
    }
}

struct JsonCollection<'a> {
    collection: &'a ResourceCollection,
    registry: &'a SchemaRegistry,
}

impl Serialize for JsonCollection<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("_links", &JsonLinks(&self.collection.links))?;
        map.serialize_entry(
            "_embedded",
            &CollectionEmbedded {
                rel: &self.collection.rel,
                items: JsonItems {
                    items: &self.collection.items,
                    registry: self.registry,
                },
            },
        )?;
        map.end()
    }
}

struct CollectionEmbedded<'a> {
    rel: &'a str,
    items: JsonItems<'a>,
}

impl Serialize for CollectionEmbedded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.rel, &self.items)?;
        map.end()
    }
}

struct JsonItems<'a> {
    items: &'a [Resource],
    registry: &'a SchemaRegistry,
}

impl Serialize for JsonItems<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for resource in self.items {
            seq.serialize_element(&JsonResource {
                resource,
                registry: self.registry,
            })?;
        }
        seq.end()
    }
}

/// Links keyed by relation; a relation used more than once becomes an array.
struct JsonLinks<'a>(&'a Links);

impl Serialize for JsonLinks<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut rels: Vec<&str> = Vec::new();
        for link in self.0 {
            if !rels.contains(&link.rel()) {
                rels.push(link.rel());
            }
        }

        let mut map = serializer.serialize_map(Some(rels.len()))?;
        for rel in rels {
            let group: Vec<&Link> = self.0.with_rel(rel).collect();
            if let [single] = group.as_slice() {
                map.serialize_entry(rel, &JsonLink(*single))?;
            } else {
                let links: Vec<JsonLink<'_>> = group.into_iter().map(JsonLink).collect();
                map.serialize_entry(rel, &links)?;
            }
        }
        map.end()
    }
}

struct JsonLink<'a>(&'a Link);

impl Serialize for JsonLink<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("href", self.0.href())?;
        if let Some(title) = self.0.title() {
            map.serialize_entry("title", title)?;
        }
        if self.0.is_templated() {
            map.serialize_entry("isTemplated", &true)?;
        }
        map.end()
    }
}
