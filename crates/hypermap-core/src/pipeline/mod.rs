//! Response enrichment: decide whether a response wants HAL, then
//! clean → enrich → render it.
//!
//! # Module Structure
//!
//! - `context` - [`RequestContext`] and the outgoing [`Payload`]
//! - `paging` - `next` link derivation
//! - `error` - [`PipelineError`]

mod context;
mod error;
mod paging;

pub use context::{parse_query, Payload, RequestContext};
pub use error::PipelineError;
pub use paging::{next_page_uri, sample_next_uri};

use std::sync::Arc;

use crate::config::{Config, ConfigError, FORMAT_PARAM};
use crate::graph::GraphCleaner;
use crate::hal::{FormatError, HalFormat, HalJsonSerializer, HalXmlSerializer};
use crate::links::{LinkEnricher, UrlBuilder};
use crate::model::{Link, Resource, ResourceCollection};
use crate::schema::SchemaRegistry;

/// An enriched resource tree, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Entity(Resource),
    Collection(ResourceCollection),
}

/// A rendered response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedOutput {
    pub format: HalFormat,
    pub body: Vec<u8>,
}

impl EnrichedOutput {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Per-area HAL response pipeline.
///
/// Holds only read-only state and can be shared across requests.
#[derive(Clone)]
pub struct HalPipeline {
    area: String,
    registry: Arc<SchemaRegistry>,
    enricher: LinkEnricher,
    json: HalJsonSerializer,
    xml: HalXmlSerializer,
    page_size: Option<usize>,
}

impl HalPipeline {
    pub fn new(
        area: impl Into<String>,
        registry: Arc<SchemaRegistry>,
        enricher: LinkEnricher,
        xml_omit_defaults: bool,
    ) -> Self {
        Self {
            area: area.into(),
            json: HalJsonSerializer::new(registry.clone()),
            xml: HalXmlSerializer::new(registry.clone(), xml_omit_defaults),
            registry,
            enricher,
            page_size: None,
        }
    }

    /// Build a pipeline from configuration and the application's schemas.
    pub fn from_config(config: &Config, registry: Arc<SchemaRegistry>) -> Result<Self, ConfigError> {
        config.validate()?;
        let urls: Arc<dyn UrlBuilder> = Arc::new(config.url_builder()?);
        let enricher = LinkEnricher::new(
            registry.clone(),
            Arc::new(config.controller_resolver()),
            urls,
            config.hal.route_name.clone(),
        );
        Ok(Self::new(
            config.hal.area.clone(),
            registry,
            enricher,
            config.hal.xml_omit_defaults,
        )
        .with_page_size(config.hal.page_size))
    }

    /// Page size used to derive `next` links when a request has no `$top`.
    pub fn with_page_size(mut self, page_size: Option<usize>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn enricher(&self) -> &LinkEnricher {
        &self.enricher
    }

    // =========================================================================
    // Applicability
    // =========================================================================

    /// The requested HAL format, if any.
    ///
    /// The `f` query flag wins over `Accept`; within `Accept` the first HAL
    /// media type listed wins.
    pub fn negotiate(&self, ctx: &RequestContext) -> Option<HalFormat> {
        if let Some(format) = ctx
            .query_value(FORMAT_PARAM)
            .and_then(HalFormat::from_query_flag)
        {
            return Some(format);
        }
        ctx.accept.as_deref().and_then(|accept| {
            accept
                .split(',')
                .find_map(|media_type| HalFormat::from_media_type(media_type).ok())
        })
    }

    fn area_matches(&self, ctx: &RequestContext) -> bool {
        ctx.area
            .as_deref()
            .is_some_and(|area| area.eq_ignore_ascii_case(&self.area))
    }

    /// Whether `payload` should be replaced by its HAL rendering.
    pub fn can_enrich(&self, ctx: &RequestContext, payload: &Payload) -> bool {
        let hypermedia = match payload {
            Payload::Entity { .. } | Payload::Collection { .. } => payload
                .declared_type()
                .is_some_and(|t| self.registry.contains(t)),
            Payload::Other { .. } => false,
        };
        let applies = hypermedia && self.area_matches(ctx) && self.negotiate(ctx).is_some();
        tracing::debug!(
            area = ?ctx.area,
            declared_type = ?payload.declared_type(),
            applies,
            "hal applicability"
        );
        applies
    }

    // =========================================================================
    // Enrichment
    // =========================================================================

    /// Clean, enrich and render `payload` for this request.
    pub fn enrich(
        &self,
        ctx: &RequestContext,
        payload: &Payload,
    ) -> Result<EnrichedOutput, PipelineError> {
        if !self.area_matches(ctx) {
            return Err(PipelineError::NotApplicable);
        }
        let format = self.negotiate(ctx).ok_or(PipelineError::NotApplicable)?;
        tracing::debug!(%format, uri = %ctx.uri, "enriching response");

        let next = match payload {
            Payload::Collection {
                items, next_page, ..
            } => next_page
                .clone()
                .or_else(|| next_page_uri(ctx, items.len(), self.page_size)),
            _ => None,
        };
        let document = self.document(payload, &ctx.uri, next)?;
        Ok(EnrichedOutput {
            format,
            body: self.render(&document, format)?,
        })
    }

    /// Enriched sample for API documentation.
    ///
    /// Collections get a fabricated `next` link assuming pages of
    /// [`SAMPLE_PAGE_SIZE`](crate::config::SAMPLE_PAGE_SIZE) items.
    pub fn sample_document(&self, url: &str, payload: &Payload) -> Result<Document, PipelineError> {
        let next = payload.is_collection().then(|| sample_next_uri(url));
        self.document(payload, url, next)
    }

    /// [`sample_document`](Self::sample_document), rendered.
    pub fn sample(
        &self,
        url: &str,
        payload: &Payload,
        format: HalFormat,
    ) -> Result<EnrichedOutput, PipelineError> {
        let document = self.sample_document(url, payload)?;
        Ok(EnrichedOutput {
            format,
            body: self.render(&document, format)?,
        })
    }

    /// Clean and enrich a payload.
    ///
    /// `uri` becomes the `self` link of a collection envelope and `next`
    /// its `next` link.
    pub fn document(
        &self,
        payload: &Payload,
        uri: &str,
        next: Option<String>,
    ) -> Result<Document, PipelineError> {
        let cleaner = GraphCleaner::new(&self.registry);
        match payload {
            Payload::Entity { graph, root } => {
                let mut resource = cleaner.clean(graph, *root)?;
                self.enricher.enrich_entity(&mut resource)?;
                Ok(Document::Entity(resource))
            }
            Payload::Collection {
                graph,
                element_type,
                items,
                ..
            } => {
                if !self.registry.contains(element_type) {
                    return Err(PipelineError::UnsupportedResource {
                        type_name: element_type.clone(),
                    });
                }
                let rel = self.enricher.resolver().resolve(element_type)?;
                let mut collection = ResourceCollection::new(element_type.clone(), rel)
                    .with_items(cleaner.clean_all(graph, items)?);
                self.enricher.enrich_collection(&mut collection)?;

                if !uri.is_empty() {
                    collection.links.set_self(uri)?;
                }
                if let Some(next) = next {
                    collection.links.add(Link::next(next)?);
                }
                Ok(Document::Collection(collection))
            }
            Payload::Other { type_name } => Err(PipelineError::UnsupportedResource {
                type_name: type_name.clone(),
            }),
        }
    }

    /// Render an enriched document.
    pub fn render(&self, document: &Document, format: HalFormat) -> Result<Vec<u8>, FormatError> {
        match (document, format) {
            (Document::Entity(r), HalFormat::Json) => self.json.to_vec(r),
            (Document::Entity(r), HalFormat::Xml) => self.xml.to_vec(r),
            (Document::Collection(c), HalFormat::Json) => self.json.collection_to_vec(c),
            (Document::Collection(c), HalFormat::Xml) => self.xml.collection_to_vec(c),
        }
    }
}
