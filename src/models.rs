// Copyright Catenary Transit Initiatives
//! Plain data records exchanged with the host application.
//!
//! Everything here is a read-only snapshot for one resolution pass. Field
//! names follow the JSON emitted by the placemark and span services.

use crate::errors::{GeometryError, GeometryResult};
use crate::math3d::Vec3;
use ahash::AHashMap;

/// Absolute world position: degrees longitude/latitude plus altitude in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Point3D {
    pub lng: f64,
    pub lat: f64,
    pub alt: f64,
}

impl Point3D {
    pub fn new(lng: f64, lat: f64, alt: f64) -> Self {
        Self { lng, lat, alt }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite() && self.alt.is_finite()
    }

    pub fn ensure_finite(&self, context: &'static str) -> GeometryResult<()> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(GeometryError::NonFiniteCoordinate {
                context,
                lng: self.lng,
                lat: self.lat,
                alt: self.alt,
            })
        }
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.lng, self.lat, self.alt]
    }
}

/// Engineering heights (metres above ground) that override computed anchor heights.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct TechnicalFixHeights {
    pub conductor: Option<f64>,
    pub shield_wire: Option<f64>,
}

impl TechnicalFixHeights {
    /// Returns the fix height for a class, ignoring non-positive placeholders.
    pub fn for_class(&self, class: ConductorClass) -> Option<f64> {
        let value = match class {
            ConductorClass::Phase => self.conductor,
            ConductorClass::ShieldWire => self.shield_wire,
        };
        value.filter(|h| h.is_finite() && *h > 0.0)
    }
}

/// Per-instance values that win over the tower's imported metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct TowerOverrides {
    pub height: Option<f64>,
    pub elevation: Option<f64>,
    pub model_id: Option<String>,
    pub transform: Option<ModelTransform>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Stored (database) ground elevation.
    #[serde(default)]
    pub elevation: Option<f64>,
    /// Nominal structure height in metres.
    #[serde(default)]
    pub height: Option<f64>,
    /// Manual heading; replaces the sequence-derived orientation when set.
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub deflection: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub sequence: Option<i64>,
    /// Generic model-type key used to look up shared anchor templates.
    #[serde(default)]
    pub tower_type: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub circuits: Vec<String>,
    #[serde(default)]
    pub fix_heights: TechnicalFixHeights,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub overrides: TowerOverrides,
}

impl Tower {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_id: None,
            lat,
            lng,
            elevation: None,
            height: None,
            heading: None,
            deflection: 0.0,
            rotation: 0.0,
            sequence: None,
            tower_type: None,
            model_id: None,
            circuits: Vec::new(),
            fix_heights: TechnicalFixHeights::default(),
            visible: true,
            overrides: TowerOverrides::default(),
        }
    }

    /// Validated (lng, lat) of the structure.
    pub fn position(&self) -> GeometryResult<(f64, f64)> {
        if self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
        {
            Ok((self.lng, self.lat))
        } else {
            Err(GeometryError::MissingCoordinates {
                tower_id: self.id.clone(),
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Override height, then imported height, then the configured default.
    pub fn effective_height(&self, default_height: f64) -> GeometryResult<f64> {
        let height = self
            .overrides
            .height
            .or(self.height)
            .unwrap_or(default_height);
        if height.is_finite() && height >= 0.0 {
            Ok(height)
        } else {
            Err(GeometryError::InvalidHeight {
                tower_id: self.id.clone(),
                height,
            })
        }
    }

    pub fn model_id(&self) -> Option<&str> {
        self.overrides
            .model_id
            .as_deref()
            .or(self.model_id.as_deref())
    }

    pub fn project_key(&self) -> &str {
        self.project_id.as_deref().unwrap_or("default")
    }
}

/// Surveyed marker whose elevation corrects nearby towers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMarker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConductorClass {
    Phase,
    ShieldWire,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConductorConfig {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub circuit_id: Option<String>,
    /// Horizontal offset in metres (negative = left of the line axis).
    pub h: f64,
    /// Vertical position as a ratio of tower height.
    pub v_ratio: f64,
    #[serde(default)]
    pub v_offset: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub manual_anchor_name: Option<String>,
}

impl ConductorConfig {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        phase: Option<&str>,
        h: f64,
        v_ratio: f64,
        v_offset: f64,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            phase: phase.map(str::to_string),
            circuit_id: None,
            h,
            v_ratio,
            v_offset,
            color: "#cbd5e1".to_string(),
            width: 1.5,
            enabled: true,
            manual_anchor_name: None,
        }
    }

    pub fn class(&self) -> ConductorClass {
        let id = self.id.to_uppercase();
        let phase = self.phase.as_deref().unwrap_or_default().to_uppercase();
        let shield = [id.as_str(), phase.as_str()].iter().any(|s| {
            s.contains("PARA") || s.contains("OPGW") || s.contains("SHIELD") || s.starts_with("GW")
        });
        if shield {
            ConductorClass::ShieldWire
        } else {
            ConductorClass::Phase
        }
    }
}

/// Axis-wise manual offset in metres; a missing axis defers to the next layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct AxisOffset {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

impl AxisOffset {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTransform {
    pub display_name: Option<String>,
    pub scale: [f64; 3],
    /// Pitch, roll, yaw in degrees.
    pub rotation: [f64; 3],
    /// Model-local translation in metres.
    pub translation: [f64; 3],
    /// Multiplier applied to the nominal tower height.
    pub base_height: f64,
    pub anchor_global_offset: Option<AxisOffset>,
    pub anchor_overrides: AHashMap<String, AxisOffset>,
    pub phase_overrides: AHashMap<String, AxisOffset>,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            display_name: None,
            scale: [1.0, 1.0, 1.0],
            rotation: [0.0, 0.0, 0.0],
            translation: [0.0, 0.0, 0.0],
            base_height: 1.0,
            anchor_global_offset: None,
            anchor_overrides: AHashMap::new(),
            phase_overrides: AHashMap::new(),
        }
    }
}

impl ModelTransform {
    pub fn pitch(&self) -> f64 {
        self.rotation[0]
    }

    pub fn roll(&self) -> f64 {
        self.rotation[1]
    }

    pub fn yaw(&self) -> f64 {
        self.rotation[2]
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::from(self.translation)
    }

    /// Vertical scale from the model's z scale and base height multiplier.
    pub fn scale_z(&self) -> f64 {
        self.scale[2] * self.base_height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Base,
    Conductor,
}

const BASE_KEYWORDS: [&str; 3] = ["BASE", "FIXAÇÃO", "FIXACAO"];
const BASE_TOKENS: [&str; 2] = ["PE", "PÉ"];

/// Authored anchor point in model-local, height-normalized units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorTemplate {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub kind: Option<TemplateKind>,
}

impl AnchorTemplate {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            kind: None,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        if let Some(kind) = self.kind {
            return kind;
        }
        let upper = self.name.to_uppercase();
        let keyword = BASE_KEYWORDS.iter().any(|k| upper.contains(k));
        let token = upper
            .split(|c: char| !c.is_alphanumeric())
            .any(|t| BASE_TOKENS.contains(&t));
        if keyword || token {
            TemplateKind::Base
        } else {
            TemplateKind::Conductor
        }
    }

    pub fn is_base(&self) -> bool {
        self.kind() == TemplateKind::Base
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpanConductor {
    pub phase: String,
    #[serde(default)]
    pub circuit_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub id: String,
    pub start_id: String,
    pub end_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    /// `None` for legacy records that never declared their conductors.
    #[serde(default)]
    pub conductors: Option<Vec<SpanConductor>>,
    /// Catenary constant for this span; the global tension applies when absent.
    #[serde(default)]
    pub tension: Option<f64>,
}

impl Span {
    pub fn new(id: impl Into<String>, start_id: impl Into<String>, end_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_id: start_id.into(),
            end_id: end_id.into(),
            project_id: None,
            conductors: None,
            tension: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSource {
    Explicit,
    Inferred,
}

impl SpanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanSource::Explicit => "explicit",
            SpanSource::Inferred => "inferred",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CablePathResult {
    pub id: String,
    pub source: SpanSource,
    pub tower_start_id: String,
    pub tower_end_id: String,
    pub tower_start_name: String,
    pub tower_end_name: String,
    pub project_id: Option<String>,
    pub conductor_id: String,
    pub color: String,
    pub width: f64,
    pub path: Vec<[f64; 3]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_kind_from_name() {
        let base = AnchorTemplate::new("Base Fixação 1", Vec3::ZERO);
        let foot = AnchorTemplate::new("PE-2", Vec3::ZERO);
        let phase = AnchorTemplate::new("FASE A VANTE", Vec3::ZERO);
        let shield = AnchorTemplate::new("PARA-RAIO OPGW", Vec3::ZERO);

        assert!(base.is_base());
        assert!(foot.is_base());
        assert!(!phase.is_base());
        assert!(!shield.is_base());
    }

    #[test]
    fn test_explicit_kind_wins() {
        let mut t = AnchorTemplate::new("BASE", Vec3::ZERO);
        t.kind = Some(TemplateKind::Conductor);
        assert!(!t.is_base());
    }

    #[test]
    fn test_conductor_class() {
        let gw = ConductorConfig::new("GW-OPGW", "Cabo OPGW", Some("PARA-RAIO"), -3.0, 1.0, 0.0);
        let fa = ConductorConfig::new("FA-1", "Fase A1", Some("FASE A"), -9.0, 0.85, 0.15);
        assert_eq!(gw.class(), ConductorClass::ShieldWire);
        assert_eq!(fa.class(), ConductorClass::Phase);
    }

    #[test]
    fn test_tower_rejects_nan_position() {
        let t = Tower::new("t1", "1/1", f64::NAN, -46.0);
        assert!(matches!(
            t.position(),
            Err(GeometryError::MissingCoordinates { .. })
        ));
    }

    #[test]
    fn test_tower_deserializes_with_defaults() {
        let json = r#"{"id":"t1","name":"1/1","lat":-23.5,"lng":-46.6}"#;
        let t: Tower = serde_json::from_str(json).unwrap();
        assert!(t.visible);
        assert!(t.circuits.is_empty());
        assert_eq!(t.effective_height(30.0).unwrap(), 30.0);
    }
}
