//! Authoritative key resolution.

use crate::model::{Resource, Value};

use super::{EntitySchema, PropertySchema, SchemaError};

impl EntitySchema {
    /// The key property used for URLs and relation filters.
    ///
    /// Keys carrying an explicit order always beat keys without one, and the
    /// lowest order wins (first declared on a tie). With no ordered keys the
    /// first declared key is used.
    pub fn key_property(&self) -> Result<&PropertySchema, SchemaError> {
        let keys = self.properties.iter().filter(|p| p.is_key());

        let ordered = keys
            .clone()
            .filter_map(|p| p.key.and_then(|k| k.order).map(|order| (order, p)))
            .fold(None::<(u32, &PropertySchema)>, |best, (order, p)| match best {
                Some((best_order, _)) if best_order <= order => best,
                _ => Some((order, p)),
            });

        if let Some((_, p)) = ordered {
            return Ok(p);
        }

        keys.into_iter()
            .next()
            .ok_or_else(|| SchemaError::NoKeyProperty(self.type_name.clone()))
    }

    /// Number of key-bearing properties.
    pub fn key_count(&self) -> usize {
        self.properties.iter().filter(|p| p.is_key()).count()
    }

    /// True when several keys are declared and none carries an order.
    pub fn has_unordered_composite_key(&self) -> bool {
        self.key_count() > 1
            && self
                .properties
                .iter()
                .all(|p| p.key.map_or(true, |k| k.order.is_none()))
    }

    /// The authoritative key property and its value on `resource`.
    pub fn key_value<'r>(
        &self,
        resource: &'r Resource,
    ) -> Result<(&PropertySchema, &'r Value), SchemaError> {
        let property = self.key_property()?;
        match resource.get(&property.name) {
            Some(value) if !value.is_null() => Ok((property, value)),
            _ => Err(SchemaError::NullKeyValue {
                type_name: self.type_name.clone(),
                property: property.name.clone(),
            }),
        }
    }
}
