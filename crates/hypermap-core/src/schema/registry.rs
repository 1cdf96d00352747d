//! Immutable registry of entity schemas.

use std::collections::HashMap;

use super::{EntitySchema, PropertySchema, SchemaError};

/// Read-only lookup of entity schemas by type name.
///
/// Built once via [`SchemaRegistry::builder`] and shared (typically behind an
/// `Arc`) by every request afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, EntitySchema>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    pub fn get(&self, type_name: &str) -> Option<&EntitySchema> {
        self.schemas.get(type_name)
    }

    /// Look up a schema, failing with [`SchemaError::UnknownType`].
    pub fn require(&self, type_name: &str) -> Result<&EntitySchema, SchemaError> {
        self.get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Find the navigation property on `primary` that points at `foreign`.
    ///
    /// Matches a single reference to `foreign` or a collection of `foreign`.
    /// Returns `None` when there is no such property or more than one.
    pub fn navigation_property(&self, primary: &str, foreign: &str) -> Option<&PropertySchema> {
        let schema = self.get(primary)?;
        let mut matches = schema
            .navigation_properties()
            .filter(|p| p.kind.target() == Some(foreign));

        let first = matches.next()?;
        if matches.next().is_some() {
            tracing::trace!(primary, foreign, "ambiguous navigation property");
            return None;
        }
        Some(first)
    }
}

/// Collects schemas before freezing them into a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    schemas: Vec<EntitySchema>,
}

impl SchemaRegistryBuilder {
    pub fn register(mut self, schema: EntitySchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Validate every schema and freeze the registry.
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let mut schemas = HashMap::with_capacity(self.schemas.len());

        for schema in self.schemas {
            schema.validate()?;
            if schema.has_unordered_composite_key() {
                tracing::warn!(
                    type_name = %schema.type_name,
                    "several keys without order; the first declared one is used"
                );
            }
            if schemas.contains_key(&schema.type_name) {
                return Err(SchemaError::DuplicateType(schema.type_name));
            }
            schemas.insert(schema.type_name.clone(), schema);
        }

        Ok(SchemaRegistry { schemas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueKind;

    fn order_registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .register(
                EntitySchema::new("Order")
                    .with(PropertySchema::state("Id", ValueKind::String).key())
                    .with(PropertySchema::collection("Items", "LineItem")),
            )
            .register(
                EntitySchema::new("LineItem")
                    .with(PropertySchema::state("Id", ValueKind::Int).key())
                    .with(PropertySchema::reference("Order", "Order")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_navigation_property_discovery() {
        let registry = order_registry();
        let back = registry.navigation_property("LineItem", "Order").unwrap();
        assert_eq!(back.name, "Order");

        let forward = registry.navigation_property("Order", "LineItem").unwrap();
        assert_eq!(forward.name, "Items");
        assert!(forward.kind.is_collection());

        assert!(registry.navigation_property("LineItem", "Customer").is_none());
    }

    #[test]
    fn test_ambiguous_navigation_property() {
        let registry = SchemaRegistry::builder()
            .register(
                EntitySchema::new("Flight")
                    .with(PropertySchema::reference("Origin", "Airport"))
                    .with(PropertySchema::reference("Destination", "Airport")),
            )
            .build()
            .unwrap();
        assert!(registry.navigation_property("Flight", "Airport").is_none());
    }

    #[test]
    fn test_unusable_output_names_rejected() {
        let err = SchemaRegistry::builder()
            .register(
                EntitySchema::new("Invoice")
                    .with(PropertySchema::state("Id", ValueKind::Int).key())
                    .with(
                        PropertySchema::state("Total", ValueKind::Float)
                            .included()
                            .rename("Total Amount"),
                    ),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidOutputName {
                type_name: "Invoice".to_string(),
                property: "Total".to_string(),
                output_name: "Total Amount".to_string(),
            }
        );

        let err = SchemaRegistry::builder()
            .register(
                EntitySchema::new("Invoice")
                    .with(PropertySchema::state("Href", ValueKind::String).rename("link")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidOutputName { .. }));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let err = SchemaRegistry::builder()
            .register(EntitySchema::new("A"))
            .register(EntitySchema::new("A"))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("A".to_string()));
    }

    #[test]
    fn test_require_unknown() {
        let registry = order_registry();
        assert_eq!(
            registry.require("Nope").unwrap_err(),
            SchemaError::UnknownType("Nope".to_string())
        );
    }
}
