//! Relation links: URL building, OData filters and the link enricher.
//!
//! # Module Structure
//!
//! - `routes` - [`UrlBuilder`] seam and the route-template implementation
//! - `odata` - `$filter` expressions for child collection links
//! - `enricher` - [`LinkEnricher`], the recursive link walk

mod enricher;
mod odata;
mod routes;

pub use enricher::LinkEnricher;
pub use odata::collection_filter;
pub use routes::{
    RouteUrlBuilder, RouteValues, UrlBuilder, UrlError, DEFAULT_ROUTE_NAME,
    DEFAULT_ROUTE_TEMPLATE,
};

use thiserror::Error;

use crate::model::LinkError;
use crate::naming::ResolveError;
use crate::schema::SchemaError;

/// Errors raised while enriching a resource with links.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnrichError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Url(#[from] UrlError),

    #[error(transparent)]
    Link(#[from] LinkError),
}
