// Copyright Catenary Transit Initiatives
//! Global cable and topology settings.

use crate::bearing::AlignmentMethod;
use crate::catenary::{DEFAULT_SUBDIVISIONS, DEFAULT_TENSION_CONSTANT};
use crate::errors::ConfigError;
use crate::models::{ConductorConfig, ModelTransform};
use ahash::AHashMap;
use std::path::Path;

/// Configuration for span inference and elevation correction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Maximum distance between consecutive sites for an inferred span (metres)
    pub link_distance_m: f64,
    /// Reference markers closer than this correct a tower's elevation (metres)
    pub reference_snap_radius_m: f64,
    /// Infer spans from names and proximity when no explicit span exists
    pub auto_inference: bool,
    /// Decimal places of the coordinate key for structures without a site number
    pub coordinate_decimals: usize,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            link_distance_m: 2500.0,      // beyond this, sparse data produces phantom spans
            reference_snap_radius_m: 40.0, // survey markers sit at the footing
            auto_inference: true,
            coordinate_decimals: 3,        // ~100 m cells
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CableSettings {
    /// Catenary constant (higher = less sag)
    pub tension: f64,
    /// Render hint, passed through untouched
    pub global_opacity: f64,
    /// Metres added to every tower and anchor above ground
    pub tower_vertical_offset: f64,
    /// Uniform multiplier on rendered tower size
    pub global_scale: f64,
    /// Height of the tower model in its own units
    pub intrinsic_model_height: f64,
    /// Height used when a tower declares none
    pub default_tower_height: f64,
    pub subdivisions: usize,
    pub alignment_method: AlignmentMethod,
    /// Keep parallel structures ("1/1A", "1/1B") from steering each other
    pub isolate_parallel_suffixes: bool,
    pub conductors: Vec<ConductorConfig>,
    /// Model used for towers without their own model id
    pub custom_model_id: Option<String>,
    /// Transforms per model id, with "default" as the catch-all
    pub model_configs: AHashMap<String, ModelTransform>,
    pub topology: TopologyConfig,
}

impl Default for CableSettings {
    fn default() -> Self {
        Self {
            tension: DEFAULT_TENSION_CONSTANT,
            global_opacity: 0.9,
            tower_vertical_offset: 30.0,
            global_scale: 1.0,
            intrinsic_model_height: 1.0,
            default_tower_height: 30.0,
            subdivisions: DEFAULT_SUBDIVISIONS,
            alignment_method: AlignmentMethod::Bisector,
            isolate_parallel_suffixes: true,
            conductors: default_conductors(),
            custom_model_id: None,
            model_configs: AHashMap::new(),
            topology: TopologyConfig::default(),
        }
    }
}

impl CableSettings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn enabled_conductors(&self) -> impl Iterator<Item = &ConductorConfig> {
        self.conductors.iter().filter(|c| c.enabled)
    }

    /// Catenary constant, falling back to the default for unusable values.
    pub fn tension_constant(&self, span_override: Option<f64>) -> f64 {
        span_override
            .filter(|c| c.is_finite() && *c > 0.0)
            .or(Some(self.tension).filter(|c| c.is_finite() && *c > 0.0))
            .unwrap_or(DEFAULT_TENSION_CONSTANT)
    }
}

fn conductor(id: &str, label: &str, phase: &str, h: f64, v_ratio: f64, v_offset: f64, color: &str, width: f64) -> ConductorConfig {
    let mut c = ConductorConfig::new(id, label, Some(phase), h, v_ratio, v_offset);
    c.color = color.to_string();
    c.width = width;
    c
}

/// Two shield wires on top plus three four-conductor phase bundles.
pub fn default_conductors() -> Vec<ConductorConfig> {
    vec![
        conductor("GW-OPGW", "Cabo OPGW", "PARA-RAIO", -3.0, 1.0, 0.0, "#e5e7eb", 1.0),
        conductor("GW-3/8", "Cabo 3/8", "PARA-RAIO", 3.0, 1.0, 0.0, "#e5e7eb", 1.0),
        conductor("FA-1", "Fase A1", "FASE A", -9.0, 0.85, 0.15, "#94a3b8", 1.5),
        conductor("FA-2", "Fase A2", "FASE A", -9.0, 0.85, -0.15, "#94a3b8", 1.5),
        conductor("FA-3", "Fase A3", "FASE A", -8.0, 0.85, 0.15, "#94a3b8", 1.5),
        conductor("FA-4", "Fase A4", "FASE A", -8.0, 0.85, -0.15, "#94a3b8", 1.5),
        conductor("FB-1", "Fase B1", "FASE B", -0.5, 0.85, 0.15, "#cbd5e1", 1.5),
        conductor("FB-2", "Fase B2", "FASE B", -0.5, 0.85, -0.15, "#cbd5e1", 1.5),
        conductor("FB-3", "Fase B3", "FASE B", 0.5, 0.85, 0.15, "#cbd5e1", 1.5),
        conductor("FB-4", "Fase B4", "FASE B", 0.5, 0.85, -0.15, "#cbd5e1", 1.5),
        conductor("FC-1", "Fase C1", "FASE C", 8.3, 0.85, 0.15, "#94a3b8", 1.5),
        conductor("FC-2", "Fase C2", "FASE C", 8.3, 0.85, -0.15, "#94a3b8", 1.5),
        conductor("FC-3", "Fase C3", "FASE C", 9.3, 0.85, 0.15, "#94a3b8", 1.5),
        conductor("FC-4", "Fase C4", "FASE C", 9.3, 0.85, -0.15, "#94a3b8", 1.5),
    ]
}
