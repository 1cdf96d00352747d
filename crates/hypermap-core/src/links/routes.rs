//! URL construction from named route templates.

use std::collections::HashMap;

use thiserror::Error;
use url::Url;

use crate::model::Value;

/// Name of the route registered by default.
pub const DEFAULT_ROUTE_NAME: &str = "DefaultApi";

/// Template of the default route.
///
/// The key segment is optional so that filtered collection links can use the
/// same route.
pub const DEFAULT_ROUTE_TEMPLATE: &str = "api/{controller}/{id?}";

/// Errors raised while building URLs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Invalid base URL {url}: {source}")]
    InvalidBase {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Base URL cannot carry a path: {0}")]
    CannotBeBase(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Route {route} has unknown placeholder {placeholder}")]
    UnknownPlaceholder { route: String, placeholder: String },

    #[error("Route {route} requires a key")]
    MissingKey { route: String },
}

/// Route values passed to a [`UrlBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum RouteValues<'a> {
    /// Address one entity by key.
    Key(&'a Value),
    /// Address the resource collection filtered by an OData expression.
    Filter(String),
}

/// Builds absolute URIs for resources.
///
/// Implementations are shared by concurrent enrichments and must only read
/// their route data.
pub trait UrlBuilder: Send + Sync {
    /// Build the URI of `controller` on route `route_name`.
    fn link(
        &self,
        route_name: &str,
        controller: &str,
        values: &RouteValues<'_>,
    ) -> Result<String, UrlError>;
}

/// [`UrlBuilder`] over a base URL and route templates.
///
/// Templates are `/`-separated segments: literals, `{controller}`, a
/// required `{id}` or an optional `{id?}`. Any other placeholder is an
/// error. A key passed to a template without an id segment is appended as
/// an `id` query parameter.
///
/// ```rust
/// use hypermap_core::links::{RouteUrlBuilder, RouteValues, UrlBuilder};
/// use hypermap_core::model::Value;
///
/// let urls = RouteUrlBuilder::new("http://api.test/")
///     .unwrap()
///     .with_route("DefaultApi", "{controller}/{id}");
/// let href = urls
///     .link("DefaultApi", "products", &RouteValues::Key(&Value::Int(42)))
///     .unwrap();
/// assert_eq!(href, "http://api.test/products/42");
/// ```
#[derive(Debug, Clone)]
pub struct RouteUrlBuilder {
    base: Url,
    routes: HashMap<String, String>,
}

impl RouteUrlBuilder {
    /// Create a builder with no routes registered.
    pub fn new(base_url: &str) -> Result<Self, UrlError> {
        let base = Url::parse(base_url).map_err(|source| UrlError::InvalidBase {
            url: base_url.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(UrlError::CannotBeBase(base_url.to_string()));
        }
        Ok(Self {
            base,
            routes: HashMap::new(),
        })
    }

    /// Register (or replace) a named route template.
    pub fn with_route(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.routes.insert(name.into(), template.into());
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl UrlBuilder for RouteUrlBuilder {
    fn link(
        &self,
        route_name: &str,
        controller: &str,
        values: &RouteValues<'_>,
    ) -> Result<String, UrlError> {
        let template = self
            .routes
            .get(route_name)
            .ok_or_else(|| UrlError::UnknownRoute(route_name.to_string()))?;

        let mut url = self.base.clone();
        let mut key_placed = false;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| UrlError::CannotBeBase(self.base.to_string()))?;
            segments.pop_if_empty();

            for part in template.split('/').filter(|p| !p.is_empty()) {
                match (part, values) {
                    ("{controller}", _) => {
                        segments.push(controller);
                    }
                    ("{id}" | "{id?}", RouteValues::Key(key)) => {
                        segments.push(&key.to_string());
                        key_placed = true;
                    }
                    ("{id}", RouteValues::Filter(_)) => {
                        return Err(UrlError::MissingKey {
                            route: route_name.to_string(),
                        });
                    }
                    ("{id?}", RouteValues::Filter(_)) => {}
                    (placeholder, _) if placeholder.starts_with('{') => {
                        return Err(UrlError::UnknownPlaceholder {
                            route: route_name.to_string(),
                            placeholder: placeholder.to_string(),
                        });
                    }
                    (literal, _) => {
                        segments.push(literal);
                    }
                }
            }
        }

        match values {
            RouteValues::Key(key) if !key_placed => {
                url.query_pairs_mut().append_pair("id", &key.to_string());
            }
            RouteValues::Filter(filter) => {
                url.query_pairs_mut().append_pair("$filter", filter);
            }
            _ => {}
        }

        Ok(url.into())
    }
}
