//! HTTP route handlers for the catalog server.
//!
//! Handlers answer in plain JSON and attach the domain payload; the HAL
//! layer decides whether the client gets hypermedia instead.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use hypermap_core::graph::NodeId;
use hypermap_core::model::Value;
use hypermap_core::pipeline::Payload;

use super::catalog::{Catalog, LAYER, SPATIAL_REFERENCE, WEB_MAP};
use super::middleware::Hal;
use super::models::{
    ErrorBody, IndexDto, IndexEntry, LayerDto, PageQuery, SpatialReferenceDto, WebMapDto,
};
use super::AppState;

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorBody>)>;

fn not_found(kind: &str, id: i64) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("not_found", format!("{} {} not found", kind, id))),
    )
}

// =============================================================================
// Index
// =============================================================================

/// GET `/` - Entry points of the API.
pub async fn index(State(state): State<Arc<AppState>>) -> Json<IndexDto> {
    let base = state.base_url.trim_end_matches('/');
    let area = state.pipeline.area();
    let resources = ["maps", "layers", "spatialreferences"]
        .into_iter()
        .map(|name| IndexEntry {
            name: name.to_string(),
            href: format!("{}/{}/{}", base, area, name),
        })
        .collect();

    Json(IndexDto {
        name: "hypermap",
        version: env!("CARGO_PKG_VERSION"),
        resources,
    })
}

// =============================================================================
// Web Maps
// =============================================================================

/// GET `/api/maps` - Web maps, paged by `$skip` and `$top`.
pub async fn list_maps(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Hal<Vec<WebMapDto>> {
    let catalog = &state.catalog;
    let ids = page(catalog.maps().to_vec(), &query);
    let body = ids.iter().map(|&id| web_map_dto(catalog, id)).collect();
    Hal::new(body, Payload::collection(catalog.graph().clone(), WEB_MAP, ids))
}

/// GET `/api/maps/{id}` - One web map.
pub async fn get_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Hal<WebMapDto>> {
    let catalog = &state.catalog;
    let node = catalog.map(id).ok_or_else(|| not_found(WEB_MAP, id))?;
    Ok(Hal::new(
        web_map_dto(catalog, node),
        Payload::entity(catalog.graph().clone(), node),
    ))
}

// =============================================================================
// Layers
// =============================================================================

/// GET `/api/layers` - Layers, optionally filtered and paged.
///
/// Query parameters:
/// - `$filter`: `{Navigation}/{Property} eq {literal}`, e.g. `Map/Id eq 1`
/// - `$skip`: Number of layers to skip
/// - `$top`: Maximum number of layers to return
pub async fn list_layers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Hal<Vec<LayerDto>>> {
    let catalog = &state.catalog;

    let matching = match query.filter.as_deref() {
        Some(expr) => catalog.filter(catalog.layers(), expr).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(
                    "invalid_filter",
                    format!("unsupported $filter expression: {}", expr),
                )),
            )
        })?,
        None => catalog.layers().to_vec(),
    };

    let ids = page(matching, &query);
    let body = ids.iter().map(|&id| layer_dto(catalog, id)).collect();
    Ok(Hal::new(
        body,
        Payload::collection(catalog.graph().clone(), LAYER, ids),
    ))
}

/// GET `/api/layers/{id}` - One layer.
pub async fn get_layer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Hal<LayerDto>> {
    let catalog = &state.catalog;
    let node = catalog.layer(id).ok_or_else(|| not_found(LAYER, id))?;
    Ok(Hal::new(
        layer_dto(catalog, node),
        Payload::entity(catalog.graph().clone(), node),
    ))
}

// =============================================================================
// Spatial References
// =============================================================================

/// GET `/api/spatialreferences` - Spatial references, paged by `$skip` and
/// `$top`.
pub async fn list_spatial_references(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Hal<Vec<SpatialReferenceDto>> {
    let catalog = &state.catalog;
    let ids = page(catalog.spatial_references().to_vec(), &query);
    let body = ids
        .iter()
        .map(|&id| spatial_reference_dto(catalog, id))
        .collect();
    Hal::new(
        body,
        Payload::collection(catalog.graph().clone(), SPATIAL_REFERENCE, ids),
    )
}

/// GET `/api/spatialreferences/{wkid}` - One spatial reference, by either
/// its current or legacy wkid.
pub async fn get_spatial_reference(
    State(state): State<Arc<AppState>>,
    Path(wkid): Path<i64>,
) -> ApiResult<Hal<SpatialReferenceDto>> {
    let catalog = &state.catalog;
    let node = catalog
        .spatial_reference(wkid)
        .ok_or_else(|| not_found(SPATIAL_REFERENCE, wkid))?;
    Ok(Hal::new(
        spatial_reference_dto(catalog, node),
        Payload::entity(catalog.graph().clone(), node),
    ))
}

// =============================================================================
// DTO Mapping
// =============================================================================

/// The `$skip`/`$top` window of `ids`.
fn page(ids: Vec<NodeId>, query: &PageQuery) -> Vec<NodeId> {
    ids.into_iter()
        .skip(query.skip)
        .take(query.top.unwrap_or(usize::MAX))
        .collect()
}

fn int(catalog: &Catalog, id: NodeId, name: &str) -> i64 {
    catalog.value(id, name).and_then(Value::as_i64).unwrap_or_default()
}

fn text(catalog: &Catalog, id: NodeId, name: &str) -> String {
    catalog
        .value(id, name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn web_map_dto(catalog: &Catalog, id: NodeId) -> WebMapDto {
    WebMapDto {
        id: int(catalog, id, "Id"),
        title: text(catalog, id, "Title"),
        owner: text(catalog, id, "Owner"),
        spatial_reference: catalog
            .reference(id, "SpatialReference")
            .map(|sr| spatial_reference_dto(catalog, sr)),
        layer_ids: catalog
            .references(id, "Layers")
            .iter()
            .map(|&layer| int(catalog, layer, "Id"))
            .collect(),
    }
}

fn layer_dto(catalog: &Catalog, id: NodeId) -> LayerDto {
    LayerDto {
        id: int(catalog, id, "Id"),
        title: text(catalog, id, "Title"),
        url: text(catalog, id, "Url"),
        opacity: catalog
            .value(id, "Opacity")
            .and_then(Value::as_f64)
            .unwrap_or(1.0),
        visibility: catalog
            .value(id, "Visible")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        map_id: catalog.reference(id, "Map").map(|map| int(catalog, map, "Id")),
    }
}

fn spatial_reference_dto(catalog: &Catalog, id: NodeId) -> SpatialReferenceDto {
    SpatialReferenceDto {
        wkid: int(catalog, id, "Wkid"),
        latest_wkid: int(catalog, id, "LatestWkid"),
    }
}
