//! Projection of a cyclic domain graph into an acyclic resource tree.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Relation, Resource, ResourceCollection};
use crate::schema::SchemaRegistry;

use super::{DomainGraph, Field, NodeId};

/// Errors raised while cleaning a domain graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CleanError {
    #[error("No entity at {0}")]
    MissingEntity(NodeId),

    #[error("No schema registered for entity type: {0}")]
    UnknownType(String),
}

/// Breaks reference cycles by projecting a [`DomainGraph`] into owned
/// [`Resource`] trees.
///
/// A reference that would re-enter a node already on the current traversal
/// path becomes an empty relation, so every node appears at most once along
/// any path from the root. The visited path is owned by each call; the
/// source graph is never mutated.
#[derive(Debug, Clone, Copy)]
pub struct GraphCleaner<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> GraphCleaner<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Clean the graph reachable from `root`.
    pub fn clean(&self, graph: &DomainGraph, root: NodeId) -> Result<Resource, CleanError> {
        let mut path = HashSet::new();
        self.project(graph, root, &mut path)
    }

    /// Clean each root independently.
    pub fn clean_all(
        &self,
        graph: &DomainGraph,
        roots: &[NodeId],
    ) -> Result<Vec<Resource>, CleanError> {
        roots.iter().map(|&root| self.clean(graph, root)).collect()
    }

    fn project(
        &self,
        graph: &DomainGraph,
        id: NodeId,
        path: &mut HashSet<NodeId>,
    ) -> Result<Resource, CleanError> {
        let entity = graph.get(id).ok_or(CleanError::MissingEntity(id))?;
        let schema = self
            .registry
            .get(&entity.type_name)
            .ok_or_else(|| CleanError::UnknownType(entity.type_name.clone()))?;

        path.insert(id);

        let mut resource = Resource::new(entity.type_name.clone());
        resource.origin = Some(id);

        for (name, field) in &entity.fields {
            match field {
                Field::Value(value) => {
                    resource.state.insert(name.clone(), value.clone());
                }
                Field::Ref(target) => {
                    let child = match target {
                        Some(t) if Self::can_enter(graph, *t, path) => {
                            Some(Box::new(self.project(graph, *t, path)?))
                        }
                        _ => None,
                    };
                    resource
                        .relations
                        .insert(name.clone(), Relation::Single(child));
                }
                Field::Refs(targets) => {
                    let element_type = schema
                        .property(name)
                        .and_then(|p| p.kind.target())
                        .map(str::to_string)
                        .or_else(|| {
                            targets
                                .first()
                                .and_then(|t| graph.get(*t))
                                .map(|e| e.type_name.clone())
                        })
                        .unwrap_or_default();

                    let mut collection = ResourceCollection::new(element_type, name.clone());
                    for &t in targets {
                        if Self::can_enter(graph, t, path) {
                            collection.push(self.project(graph, t, path)?);
                        }
                    }
                    resource
                        .relations
                        .insert(name.clone(), Relation::many(collection));
                }
            }
        }

        path.remove(&id);
        Ok(resource)
    }

    /// A target is entered only if it exists and is not an ancestor.
    fn can_enter(graph: &DomainGraph, target: NodeId, path: &HashSet<NodeId>) -> bool {
        graph.get(target).is_some() && !path.contains(&target)
    }
}
