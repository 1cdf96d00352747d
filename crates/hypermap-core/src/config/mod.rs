//! Configuration management for hypermap.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `hypermap.toml` file
//! 3. User config `~/.config/hypermap/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::links::{RouteUrlBuilder, UrlError};
use crate::naming::{ControllerMapping, ControllerResolver};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid route configuration: {0}")]
    Url(#[from] UrlError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hypermedia output configuration.
    pub hal: HalConfig,

    /// Route name → path template, e.g. `api/{controller}/{id?}`.
    pub routes: BTreeMap<String, String>,

    /// Entity type name → resource name.
    pub controllers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut routes = BTreeMap::new();
        routes.insert(
            DEFAULT_ROUTE_NAME.to_string(),
            DEFAULT_ROUTE_TEMPLATE.to_string(),
        );
        Self {
            hal: HalConfig::default(),
            routes,
            controllers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./hypermap.toml` (project local)
    /// 2. `~/.config/hypermap/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        // Try project-local config first
        if Path::new(LOCAL_CONFIG_FILE).exists() {
            return Self::from_file(LOCAL_CONFIG_FILE);
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(area) = lookup("HYPERMAP_AREA") {
            self.hal.area = area;
        }
        if let Some(url) = lookup("HYPERMAP_BASE_URL") {
            self.hal.base_url = url;
        }
        if let Some(route) = lookup("HYPERMAP_ROUTE_NAME") {
            self.hal.route_name = route;
        }
        if let Some(size) = lookup("HYPERMAP_PAGE_SIZE") {
            if let Ok(n) = size.parse() {
                self.hal.page_size = Some(n);
            }
        }
    }

    /// Check cross-section consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hal.area.trim().is_empty() {
            return Err(ConfigError::Invalid("hal.area must not be empty".into()));
        }
        if !self.routes.contains_key(&self.hal.route_name) {
            return Err(ConfigError::Invalid(format!(
                "hal.route_name '{}' has no entry in [routes]",
                self.hal.route_name
            )));
        }
        if self.hal.page_size == Some(0) {
            return Err(ConfigError::Invalid("hal.page_size must be positive".into()));
        }
        Ok(())
    }

    /// The `[controllers]` table as an immutable mapping.
    pub fn controller_mapping(&self) -> ControllerMapping {
        ControllerMapping::new(
            self.controllers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Resolver over the configured mapping and fallback policy.
    pub fn controller_resolver(&self) -> ControllerResolver {
        ControllerResolver::new(self.controller_mapping())
            .with_pluralize_fallback(self.hal.pluralize_unmapped)
    }

    /// URL builder over the configured base URL and routes.
    pub fn url_builder(&self) -> Result<RouteUrlBuilder, ConfigError> {
        let builder = self
            .routes
            .iter()
            .fold(RouteUrlBuilder::new(&self.hal.base_url)?, |b, (name, template)| {
                b.with_route(name.clone(), template.clone())
            });
        Ok(builder)
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Hypermedia output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    /// Routing area whose responses are enriched (compared case-insensitively).
    pub area: String,

    /// Absolute base URL for generated links.
    pub base_url: String,

    /// Route name used for every generated link.
    pub route_name: String,

    /// Derive names for unmapped types by pluralization.
    pub pluralize_unmapped: bool,

    /// Omit default values in HAL+XML unless a property overrides it.
    pub xml_omit_defaults: bool,

    /// Page size used to derive `next` links for full pages.
    pub page_size: Option<usize>,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            area: DEFAULT_AREA.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            route_name: DEFAULT_ROUTE_NAME.to_string(),
            pluralize_unmapped: DEFAULT_PLURALIZE_UNMAPPED,
            xml_omit_defaults: DEFAULT_XML_OMIT_DEFAULTS,
            page_size: None, // Only explicit $top or next-page URIs
        }
    }
}
