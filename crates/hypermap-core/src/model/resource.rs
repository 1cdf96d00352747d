//! Hypermedia resources: single entities and homogeneous collections.

use indexmap::IndexMap;

use crate::graph::NodeId;

use super::link::Links;
use super::value::Value;

// =============================================================================
// Relation
// =============================================================================

/// The value of a relation property: another resource or a collection.
///
/// `None` stands for a missing reference, including one the graph cleaner
/// cut because it would have re-entered the traversal path.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    Single(Option<Box<Resource>>),
    Many(Option<ResourceCollection>),
}

impl Relation {
    pub fn single(resource: Resource) -> Self {
        Relation::Single(Some(Box::new(resource)))
    }

    pub fn many(collection: ResourceCollection) -> Self {
        Relation::Many(Some(collection))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Relation::Single(None) | Relation::Many(None))
    }

    pub fn as_single(&self) -> Option<&Resource> {
        match self {
            Relation::Single(Some(r)) => Some(r),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&ResourceCollection> {
        match self {
            Relation::Many(Some(c)) => Some(c),
            _ => None,
        }
    }
}

// =============================================================================
// Resource
// =============================================================================

/// One hypermedia-addressable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Registered entity type name (e.g. `"Product"`).
    pub type_name: String,
    /// The resource's own relation name, set during enrichment.
    pub rel: Option<String>,
    pub links: Links,
    /// Primitive properties in declaration order.
    pub state: IndexMap<String, Value>,
    /// Relation properties in declaration order.
    pub relations: IndexMap<String, Relation>,
    /// Domain graph node this resource was projected from, if any.
    pub origin: Option<NodeId>,
}

impl Resource {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            rel: None,
            links: Links::new(),
            state: IndexMap::new(),
            relations: IndexMap::new(),
            origin: None,
        }
    }

    /// Builder-style state property setter.
    pub fn with_state(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(name.into(), value.into());
        self
    }

    /// Builder-style relation setter.
    pub fn with_relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// True when both resources were projected from the same graph node.
    pub fn same_origin(&self, other: &Resource) -> bool {
        matches!((self.origin, other.origin), (Some(a), Some(b)) if a == b)
    }
}

// =============================================================================
// Resource Collection
// =============================================================================

/// An ordered, homogeneous sequence of resources.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceCollection {
    /// Entity type of every item.
    pub element_type: String,
    /// Name used when embedding the collection (usually the plural resource name).
    pub rel: String,
    pub links: Links,
    pub items: Vec<Resource>,
}

impl ResourceCollection {
    pub fn new(element_type: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            rel: rel.into(),
            links: Links::new(),
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<Resource>) -> Self {
        self.items = items;
        self
    }

    pub fn push(&mut self, item: Resource) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.items.iter()
    }
}
