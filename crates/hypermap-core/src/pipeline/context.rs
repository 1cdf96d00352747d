//! What the pipeline sees of a request and its outgoing payload.

use std::sync::Arc;

use crate::graph::{DomainGraph, NodeId};

/// Routing facts about one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Routing area the request was dispatched in.
    pub area: Option<String>,
    /// Raw `Accept` header.
    pub accept: Option<String>,
    /// Decoded query parameters in request order.
    pub query: Vec<(String, String)>,
    /// Absolute request URI, used for collection `self`/`next` links.
    pub uri: String,
}

impl RequestContext {
    /// Context for `uri`, with the query string already decoded.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let query = uri
            .split_once('?')
            .map(|(_, q)| parse_query(q))
            .unwrap_or_default();
        Self {
            area: None,
            accept: None,
            query,
            uri,
        }
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// First value of a query parameter.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode an `application/x-www-form-urlencoded` query string.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// A handler's outgoing value.
#[derive(Debug, Clone)]
pub enum Payload {
    /// One entity of a domain graph.
    Entity { graph: Arc<DomainGraph>, root: NodeId },
    /// A page of entities sharing one declared element type.
    Collection {
        graph: Arc<DomainGraph>,
        element_type: String,
        items: Vec<NodeId>,
        /// URI of the following page, when the handler knows it.
        next_page: Option<String>,
    },
    /// Anything that is not a domain entity.
    Other { type_name: String },
}

impl Payload {
    pub fn entity(graph: Arc<DomainGraph>, root: NodeId) -> Self {
        Payload::Entity { graph, root }
    }

    pub fn collection(
        graph: Arc<DomainGraph>,
        element_type: impl Into<String>,
        items: Vec<NodeId>,
    ) -> Self {
        Payload::Collection {
            graph,
            element_type: element_type.into(),
            items,
            next_page: None,
        }
    }

    /// Attach an explicit next-page URI to a collection payload.
    pub fn with_next_page(mut self, uri: impl Into<String>) -> Self {
        if let Payload::Collection { next_page, .. } = &mut self {
            *next_page = Some(uri.into());
        }
        self
    }

    /// The declared type: the root's type or the collection element type.
    pub fn declared_type(&self) -> Option<&str> {
        match self {
            Payload::Entity { graph, root } => graph.get(*root).map(|e| e.type_name.as_str()),
            Payload::Collection { element_type, .. } => Some(element_type),
            Payload::Other { type_name } => Some(type_name),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Payload::Collection { .. })
    }
}
