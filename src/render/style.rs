use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::render::geojson::{self, Geometry};

/// The only style spec version the engine understands.
pub const STYLE_VERSION: u32 = 8;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("style payload is empty")]
    Empty,

    #[error("malformed style JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported style version {0}, expected 8")]
    UnsupportedVersion(u32),

    #[error("layer #{0} has an empty id")]
    EmptyLayerId(usize),

    #[error("duplicate layer id {0:?}")]
    DuplicateLayer(String),

    #[error("layer {0:?} needs a source")]
    MissingSource(String),

    #[error("layer {layer:?} references unknown source {source_id:?}")]
    UnknownSource { layer: String, source_id: String },

    #[error("geojson source {source_id:?} is invalid: {message}")]
    GeoJson { source_id: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Vector,
    Raster,
    RasterDem,
    Geojson,
    Image,
    Video,
}

/// A style source. Only inline `geojson` data is ever drawn; nothing is fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Background,
    Fill,
    Line,
    Symbol,
    Raster,
    Circle,
    FillExtrusion,
    Heatmap,
    Hillshade,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Layer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub minzoom: Option<f64>,
    #[serde(default)]
    pub maxzoom: Option<f64>,
    #[serde(default)]
    pub layout: Map<String, Value>,
    #[serde(default)]
    pub paint: Map<String, Value>,
}

impl Layer {
    pub fn is_visible(&self) -> bool {
        self.layout.get("visibility").and_then(Value::as_str) != Some("none")
    }

    /// `minzoom` is inclusive and `maxzoom` exclusive.
    pub fn covers_zoom(&self, zoom: f64) -> bool {
        self.minzoom.map_or(true, |min| zoom >= min) && self.maxzoom.map_or(true, |max| zoom < max)
    }
}

/// A parsed and validated style document.
#[derive(Debug, Clone, Deserialize)]
pub struct Style {
    pub version: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// Default camera center as `[lon, lat]`.
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    #[serde(default)]
    pub zoom: Option<f64>,
    #[serde(default)]
    pub bearing: Option<f64>,
    #[serde(default)]
    pub pitch: Option<f64>,
    #[serde(default)]
    pub sources: IndexMap<String, Source>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(skip)]
    geometries: HashMap<String, Vec<Geometry>>,
}

impl Style {
    /// Parse and validate a style document.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        if json.trim().is_empty() {
            return Err(StyleError::Empty);
        }
        let mut style: Style = serde_json::from_str(json)?;
        style.validate()?;
        style.load_geojson()?;
        Ok(style)
    }

    /// Inline geometries of a `geojson` source, empty for anything else.
    pub fn geometries(&self, source_id: &str) -> &[Geometry] {
        self.geometries.get(source_id).map(Vec::as_slice).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), StyleError> {
        if self.version != STYLE_VERSION {
            return Err(StyleError::UnsupportedVersion(self.version));
        }

        let mut seen = HashSet::new();
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.id.is_empty() {
                return Err(StyleError::EmptyLayerId(index));
            }
            if !seen.insert(layer.id.as_str()) {
                return Err(StyleError::DuplicateLayer(layer.id.clone()));
            }
            if layer.kind == LayerKind::Background {
                continue;
            }
            let source_id = layer
                .source
                .as_deref()
                .ok_or_else(|| StyleError::MissingSource(layer.id.clone()))?;
            if !self.sources.contains_key(source_id) {
                return Err(StyleError::UnknownSource {
                    layer: layer.id.clone(),
                    source_id: source_id.to_string(),
                });
            }
        }
        Ok(())
    }

    fn load_geojson(&mut self) -> Result<(), StyleError> {
        for (id, source) in &self.sources {
            if source.kind != SourceKind::Geojson {
                continue;
            }
            match &source.data {
                Some(data @ Value::Object(_)) => {
                    let parsed = geojson::parse(data).map_err(|e| StyleError::GeoJson {
                        source_id: id.clone(),
                        message: e.to_string(),
                    })?;
                    self.geometries.insert(id.clone(), parsed);
                }
                Some(Value::String(url)) => {
                    log::debug!("geojson source {id:?} points at {url:?}; remote data is not loaded");
                }
                Some(_) => {
                    return Err(StyleError::GeoJson {
                        source_id: id.clone(),
                        message: "data must be an object or a URL".to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }
}
