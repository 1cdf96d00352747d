//! Entity type → REST resource name resolution.

mod pluralize;

pub use pluralize::pluralize;

use std::collections::HashMap;

use thiserror::Error;

use crate::model::ResourceCollection;

/// Errors raised while resolving resource names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No controller resolvable for type: {0}")]
    NoController(String),
}

/// Explicit type → resource name table.
///
/// Configured once at startup and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerMapping {
    names: HashMap<String, String>,
}

impl ControllerMapping {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&str> {
        self.names.get(type_name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Resolves the resource (controller) name for an entity type.
///
/// Mapped types use the table; unmapped types fall back to the lower-cased
/// plural of the type name unless the fallback is disabled.
#[derive(Debug, Clone)]
pub struct ControllerResolver {
    mapping: ControllerMapping,
    pluralize_unmapped: bool,
}

impl ControllerResolver {
    pub fn new(mapping: ControllerMapping) -> Self {
        Self {
            mapping,
            pluralize_unmapped: true,
        }
    }

    /// Disable or enable the pluralization fallback.
    pub fn with_pluralize_fallback(mut self, enabled: bool) -> Self {
        self.pluralize_unmapped = enabled;
        self
    }

    pub fn resolve(&self, type_name: &str) -> Result<String, ResolveError> {
        if let Some(name) = self.mapping.get(type_name) {
            return Ok(name.to_string());
        }

        if self.pluralize_unmapped {
            let simple = simple_name(type_name).to_lowercase();
            if !simple.is_empty() {
                return Ok(pluralize(&simple));
            }
        }

        Err(ResolveError::NoController(type_name.to_string()))
    }

    /// Resolve a collection through its element type.
    pub fn resolve_collection(&self, collection: &ResourceCollection) -> Result<String, ResolveError> {
        self.resolve(&collection.element_type)
    }

    pub fn mapping(&self) -> &ControllerMapping {
        &self.mapping
    }
}

impl Default for ControllerResolver {
    fn default() -> Self {
        Self::new(ControllerMapping::default())
    }
}

/// Strip a module path and generic arguments: `geo::Layer<T>` → `Layer`.
fn simple_name(type_name: &str) -> &str {
    let name = type_name.split('<').next().unwrap_or(type_name).trim();
    let name = name.rsplit("::").next().unwrap_or(name);
    name.rsplit('.').next().unwrap_or(name)
}
