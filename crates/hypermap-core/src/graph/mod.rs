//! Domain object graphs.
//!
//! Handlers produce their entities as a [`DomainGraph`]: an arena of
//! [`Entity`] nodes whose navigation fields refer to each other by
//! [`NodeId`]. Back-references (child → parent → child) are ordinary edges
//! here, so the graph may contain cycles. The [`GraphCleaner`] projects a
//! graph into the cycle-free [`Resource`](crate::model::Resource) tree that
//! enrichment and serialization walk.

mod cleaner;

pub use cleaner::{CleanError, GraphCleaner};

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::Value;

/// Index of an entity inside a [`DomainGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One field of a domain entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Value(Value),
    Ref(Option<NodeId>),
    Refs(Vec<NodeId>),
}

/// A domain object: a type name plus ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub type_name: String,
    pub fields: IndexMap<String, Field>,
}

impl Entity {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Field::Value(value.into()));
        self
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), Field::Value(value.into()));
    }

    pub fn set_ref(&mut self, name: impl Into<String>, target: Option<NodeId>) {
        self.fields.insert(name.into(), Field::Ref(target));
    }

    pub fn set_refs(&mut self, name: impl Into<String>, targets: Vec<NodeId>) {
        self.fields.insert(name.into(), Field::Refs(targets));
    }

    /// Append one target to a collection field, creating it if needed.
    pub fn push_ref(&mut self, name: &str, target: NodeId) {
        match self.fields.get_mut(name) {
            Some(Field::Refs(targets)) => targets.push(target),
            _ => {
                self.fields.insert(name.to_string(), Field::Refs(vec![target]));
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }
}

/// Arena of domain entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainGraph {
    nodes: Vec<Entity>,
}

impl DomainGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> NodeId {
        self.nodes.push(entity);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&Entity> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Entity> {
        self.nodes.get_mut(id.0)
    }

    /// Link `from.name` to `to`, also setting the inverse collection
    /// `to.inverse` when given. Unknown ids are ignored.
    pub fn connect(&mut self, from: NodeId, name: &str, to: NodeId, inverse: Option<&str>) {
        if self.get(to).is_none() {
            return;
        }
        if let Some(entity) = self.get_mut(from) {
            entity.set_ref(name, Some(to));
        } else {
            return;
        }
        if let Some(inverse) = inverse {
            if let Some(target) = self.get_mut(to) {
                target.push_ref(inverse, from);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_sets_inverse() {
        let mut graph = DomainGraph::new();
        let order = graph.insert(Entity::new("Order").with_value("Id", "A1"));
        let line = graph.insert(Entity::new("LineItem").with_value("Id", 1));

        graph.connect(line, "Order", order, Some("Items"));

        assert_eq!(
            graph.get(line).unwrap().field("Order"),
            Some(&Field::Ref(Some(order)))
        );
        assert_eq!(
            graph.get(order).unwrap().field("Items"),
            Some(&Field::Refs(vec![line]))
        );
    }
}
