//! Default values for hypermap configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// HAL Defaults
// ============================================================================

/// Routing area whose responses are enriched.
pub const DEFAULT_AREA: &str = "api";

/// Base URL that generated links are resolved against.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333/";

/// Route used for every generated link.
pub const DEFAULT_ROUTE_NAME: &str = crate::links::DEFAULT_ROUTE_NAME;

/// Template of the default route.
pub const DEFAULT_ROUTE_TEMPLATE: &str = crate::links::DEFAULT_ROUTE_TEMPLATE;

/// Unmapped entity types fall back to their pluralized name.
pub const DEFAULT_PLURALIZE_UNMAPPED: bool = true;

/// HAL+XML leaves out default values unless a property says otherwise.
pub const DEFAULT_XML_OMIT_DEFAULTS: bool = true;

// ============================================================================
// Paging Defaults
// ============================================================================

/// Page size assumed when fabricating documentation samples.
pub const SAMPLE_PAGE_SIZE: usize = 100;

/// Query parameter carrying the page size of a request.
pub const TOP_PARAM: &str = "$top";

/// Query parameter carrying the page offset of a request.
pub const SKIP_PARAM: &str = "$skip";

/// Query parameter selecting the HAL format explicitly.
pub const FORMAT_PARAM: &str = "f";

// ============================================================================
// File Locations
// ============================================================================

/// Project-local configuration file.
pub const LOCAL_CONFIG_FILE: &str = "hypermap.toml";

/// Directory under the user config dir.
pub const USER_CONFIG_DIR: &str = "hypermap";

/// File name inside [`USER_CONFIG_DIR`].
pub const USER_CONFIG_FILE: &str = "config.toml";
