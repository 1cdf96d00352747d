pub mod config;
pub mod graph;
pub mod hal;
pub mod links;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod schema;

pub use config::Config;
pub use graph::{DomainGraph, Entity, GraphCleaner, NodeId};
pub use hal::{HalFormat, HalJsonSerializer, HalXmlSerializer};
pub use links::{LinkEnricher, RouteUrlBuilder, UrlBuilder};
pub use model::{Link, Links, Relation, Resource, ResourceCollection, Value, ValueKind};
pub use naming::{ControllerMapping, ControllerResolver};
pub use pipeline::{Document, EnrichedOutput, HalPipeline, Payload, PipelineError, RequestContext};
pub use schema::{EntitySchema, PropertySchema, SchemaRegistry};
