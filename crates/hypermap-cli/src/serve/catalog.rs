//! In-memory geospatial catalog served by the API.
//!
//! Web maps own layers and point at a spatial reference; every layer points
//! back at its map, so the graph is cyclic.

use std::sync::Arc;

use hypermap_core::graph::{DomainGraph, Entity, Field, NodeId};
use hypermap_core::model::{Value, ValueKind};
use hypermap_core::schema::{EntitySchema, PropertySchema, SchemaError, SchemaRegistry};

pub const WEB_MAP: &str = "WebMap";
pub const LAYER: &str = "Layer";
pub const SPATIAL_REFERENCE: &str = "SpatialReference";

/// Resource names of the catalog types.
pub const CONTROLLERS: &[(&str, &str)] = &[
    (WEB_MAP, "maps"),
    (LAYER, "layers"),
    (SPATIAL_REFERENCE, "spatialreferences"),
];

/// Demo layers: map id, layer id, title, service url, opacity, visibility.
const LAYERS: &[(i64, i64, &str, &str, f64, bool)] = &[
    (
        1,
        11,
        "World Street Map",
        "https://services.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer",
        1.0,
        true,
    ),
    (
        1,
        12,
        "Reference Overlay",
        "https://services.arcgisonline.com/ArcGIS/rest/services/Reference/World_Reference_Overlay/MapServer",
        0.8,
        true,
    ),
    (
        2,
        21,
        "Rivers",
        "https://hydro.nationalmap.gov/arcgis/rest/services/nhd/MapServer/6",
        1.0,
        true,
    ),
    (
        2,
        22,
        "Lakes",
        "https://hydro.nationalmap.gov/arcgis/rest/services/nhd/MapServer/9",
        0.7,
        true,
    ),
    (
        2,
        23,
        "Watersheds",
        "https://hydro.nationalmap.gov/arcgis/rest/services/wbd/MapServer/4",
        0.5,
        false,
    ),
];

/// Entity schemas of the catalog types.
pub fn schemas() -> Result<SchemaRegistry, SchemaError> {
    SchemaRegistry::builder()
        .register(
            EntitySchema::new(WEB_MAP)
                .with(PropertySchema::state("Id", ValueKind::Int).key().included().rename("id"))
                .with(PropertySchema::state("Title", ValueKind::String).included().rename("title"))
                .with(PropertySchema::state("Owner", ValueKind::String).included().rename("owner"))
                .with(
                    PropertySchema::reference("SpatialReference", SPATIAL_REFERENCE)
                        .rename("spatialReference"),
                )
                .with(PropertySchema::collection("Layers", LAYER).rename("operationalLayers")),
        )
        .register(
            EntitySchema::new(LAYER)
                .with(PropertySchema::state("Id", ValueKind::Int).key().included().rename("id"))
                .with(PropertySchema::state("Title", ValueKind::String).included().rename("title"))
                .with(PropertySchema::state("Url", ValueKind::String).included().rename("url"))
                .with(PropertySchema::state("Opacity", ValueKind::Float).included().rename("opacity"))
                .with(
                    PropertySchema::state("Visible", ValueKind::Bool)
                        .included()
                        .omit_default(false)
                        .rename("visibility"),
                )
                .with(PropertySchema::reference("Map", WEB_MAP)),
        )
        .register(
            // latestWkid is authoritative; wkid is the legacy identifier
            EntitySchema::new(SPATIAL_REFERENCE)
                .with(
                    PropertySchema::state("Wkid", ValueKind::Int)
                        .key_order(1)
                        .included()
                        .rename("wkid"),
                )
                .with(
                    PropertySchema::state("LatestWkid", ValueKind::Int)
                        .key_order(0)
                        .included()
                        .rename("latestWkid"),
                ),
        )
        .build()
}

/// The catalog graph plus per-type indexes.
#[derive(Debug, Clone)]
pub struct Catalog {
    graph: Arc<DomainGraph>,
    maps: Vec<NodeId>,
    layers: Vec<NodeId>,
    spatial_references: Vec<NodeId>,
}

impl Catalog {
    /// A small catalog of public basemaps and hydrology layers.
    pub fn demo() -> Self {
        let mut graph = DomainGraph::new();

        let web_mercator = graph.insert(
            Entity::new(SPATIAL_REFERENCE)
                .with_value("Wkid", 102100)
                .with_value("LatestWkid", 3857),
        );
        let wgs84 = graph.insert(
            Entity::new(SPATIAL_REFERENCE)
                .with_value("Wkid", 4326)
                .with_value("LatestWkid", 4326),
        );

        let streets = add_map(&mut graph, 1, "World Street Map", "esri", web_mercator);
        let hydro = add_map(&mut graph, 2, "Hydrology", "usgs", wgs84);

        let layers = LAYERS
            .iter()
            .map(|&(map, id, title, url, opacity, visible)| {
                let map = if map == 1 { streets } else { hydro };
                add_layer(&mut graph, map, id, title, url, opacity, visible)
            })
            .collect();

        Self {
            graph: Arc::new(graph),
            maps: vec![streets, hydro],
            layers,
            spatial_references: vec![web_mercator, wgs84],
        }
    }

    pub fn graph(&self) -> &Arc<DomainGraph> {
        &self.graph
    }

    pub fn maps(&self) -> &[NodeId] {
        &self.maps
    }

    pub fn layers(&self) -> &[NodeId] {
        &self.layers
    }

    pub fn spatial_references(&self) -> &[NodeId] {
        &self.spatial_references
    }

    pub fn map(&self, id: i64) -> Option<NodeId> {
        self.find(&self.maps, "Id", id)
    }

    pub fn layer(&self, id: i64) -> Option<NodeId> {
        self.find(&self.layers, "Id", id)
    }

    /// A spatial reference by either of its identifiers.
    pub fn spatial_reference(&self, wkid: i64) -> Option<NodeId> {
        self.find(&self.spatial_references, "LatestWkid", wkid)
            .or_else(|| self.find(&self.spatial_references, "Wkid", wkid))
    }

    /// A state value of a node.
    pub fn value(&self, id: NodeId, name: &str) -> Option<&Value> {
        match self.graph.get(id)?.field(name)? {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The single node a reference field points at.
    pub fn reference(&self, id: NodeId, name: &str) -> Option<NodeId> {
        match self.graph.get(id)?.field(name)? {
            Field::Ref(target) => *target,
            _ => None,
        }
    }

    /// The nodes a collection field points at.
    pub fn references(&self, id: NodeId, name: &str) -> &[NodeId] {
        match self.graph.get(id).and_then(|e| e.field(name)) {
            Some(Field::Refs(targets)) => targets,
            _ => &[],
        }
    }

    /// Apply a `{Navigation}/{Property} eq {literal}` filter to `ids`.
    ///
    /// Returns `None` for expressions of any other shape.
    pub fn filter(&self, ids: &[NodeId], expr: &str) -> Option<Vec<NodeId>> {
        let (path, literal) = expr.split_once(" eq ")?;
        let (navigation, property) = path.trim().split_once('/')?;
        let expected = parse_literal(literal.trim())?;

        Some(
            ids.iter()
                .copied()
                .filter(|&id| {
                    self.reference(id, navigation)
                        .and_then(|target| self.value(target, property))
                        .is_some_and(|value| *value == expected)
                })
                .collect(),
        )
    }

    fn find(&self, ids: &[NodeId], field: &str, key: i64) -> Option<NodeId> {
        ids.iter()
            .copied()
            .find(|&id| self.value(id, field).and_then(Value::as_i64) == Some(key))
    }
}

fn add_map(graph: &mut DomainGraph, id: i64, title: &str, owner: &str, sr: NodeId) -> NodeId {
    let map = graph.insert(
        Entity::new(WEB_MAP)
            .with_value("Id", id)
            .with_value("Title", title)
            .with_value("Owner", owner),
    );
    graph.connect(map, "SpatialReference", sr, None);
    map
}

fn add_layer(
    graph: &mut DomainGraph,
    map: NodeId,
    id: i64,
    title: &str,
    url: &str,
    opacity: f64,
    visible: bool,
) -> NodeId {
    let layer = graph.insert(
        Entity::new(LAYER)
            .with_value("Id", id)
            .with_value("Title", title)
            .with_value("Url", url)
            .with_value("Opacity", opacity)
            .with_value("Visible", visible),
    );
    graph.connect(layer, "Map", map, Some("Layers"));
    layer
}

/// Parse an OData literal: `'quoted'` strings, integers, floats, booleans.
fn parse_literal(text: &str) -> Option<Value> {
    if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Some(Value::String(inner.replace("''", "'")));
    }
    match text {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        _ => {}
    }
    text.parse::<i64>()
        .map(Value::Int)
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(Value::Float))
}
