//! API response models for the catalog server.
//!
//! These are the plain JSON shapes returned when a client does not ask for
//! HAL. HAL renderings are produced from the catalog graph instead.

use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog Models
// =============================================================================

/// A web map with its spatial reference inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebMapDto {
    pub id: i64,
    pub title: String,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial_reference: Option<SpatialReferenceDto>,
    /// Ids of the map's operational layers, in drawing order.
    pub layer_ids: Vec<i64>,
}

/// One operational layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDto {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub opacity: f64,
    pub visibility: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_id: Option<i64>,
}

/// A spatial reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialReferenceDto {
    pub wkid: i64,
    pub latest_wkid: i64,
}

// =============================================================================
// Index Model (for `/`)
// =============================================================================

/// Entry points of the API.
#[derive(Debug, Serialize)]
pub struct IndexDto {
    pub name: &'static str,
    pub version: &'static str,
    pub resources: Vec<IndexEntry>,
}

#[derive(Debug, Serialize)]
pub struct IndexEntry {
    pub name: String,
    pub href: String,
}

// =============================================================================
// Query and Error Models
// =============================================================================

/// OData-style paging and filtering parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "$top")]
    pub top: Option<usize>,
    #[serde(rename = "$skip", default)]
    pub skip: usize,
    #[serde(rename = "$filter")]
    pub filter: Option<String>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
