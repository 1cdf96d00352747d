//! Resource graph data model.
//!
//! - `value` - primitive state values
//! - `link` - links and the self-unique link list
//! - `resource` - resources, relations and collections

mod link;
mod resource;
mod value;

pub use link::*;
pub use resource::{Relation, Resource, ResourceCollection};
pub use value::{Value, ValueKind};
