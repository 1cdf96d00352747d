use thiserror::Error;

use crate::graph::CleanError;
use crate::hal::FormatError;
use crate::links::EnrichError;
use crate::model::LinkError;
use crate::naming::ResolveError;
use crate::schema::SchemaError;

/// Errors raised by the response enrichment pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Hypermedia enrichment does not apply to this request")]
    NotApplicable,

    #[error("No hypermedia enrichment available for type: {type_name}")]
    UnsupportedResource { type_name: String },

    #[error("Failed to clean resource graph: {0}")]
    Clean(CleanError),

    #[error("Failed to enrich resource: {0}")]
    Enrich(EnrichError),

    #[error("Failed to render resource: {0}")]
    Format(#[from] FormatError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl PipelineError {
    /// True when the failure means the client cannot use links for this
    /// resource at all, as opposed to a server fault.
    pub fn is_client_unusable(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedResource { .. }
                | PipelineError::Enrich(EnrichError::Resolve(ResolveError::NoController(_)))
        )
    }
}

impl From<CleanError> for PipelineError {
    fn from(e: CleanError) -> Self {
        match e {
            CleanError::UnknownType(type_name) => PipelineError::UnsupportedResource { type_name },
            other => PipelineError::Clean(other),
        }
    }
}

impl From<EnrichError> for PipelineError {
    fn from(e: EnrichError) -> Self {
        match e {
            EnrichError::Schema(SchemaError::UnknownType(type_name)) => {
                PipelineError::UnsupportedResource { type_name }
            }
            other => PipelineError::Enrich(other),
        }
    }
}

impl From<ResolveError> for PipelineError {
    fn from(e: ResolveError) -> Self {
        PipelineError::Enrich(EnrichError::Resolve(e))
    }
}
