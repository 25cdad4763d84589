// Copyright Catenary Transit Initiatives
// ===========================================================================
// Anchor resolution
// ===========================================================================
//
// Turns a (tower, conductor) pair into one absolute attachment point.
//
// 1. Rendered height = nominal height * model z scale * base multiplier * global scale
// 2. Authored template (instance set, then model-type set), re-centred on the
//    base centroid and scaled by the rendered height
// 3. Otherwise the parametric point (h, 0, v_ratio * height + v_offset),
//    widened for gantry structures
// 4. Technical fix height replaces the height above ground
// 5. Manual offsets (individual > phase > global), rotated by the heading
// ===========================================================================

pub mod matching;

pub use matching::{AnchorRole, MatchRule, TemplateMatch, find_template, match_rules};

use crate::config::CableSettings;
use crate::errors::{GeometryError, GeometryResult};
use crate::geodesy::LocalFrame;
use crate::math3d::{Rotation, Vec3};
use crate::models::{AnchorTemplate, ConductorClass, ConductorConfig, ModelTransform, Point3D, Tower};
use crate::overrides::{ResolvedOffset, resolve_conductor_offset};
use lazy_static::lazy_static;
use regex::Regex;
use std::iter::Chain;
use std::slice;

lazy_static! {
    static ref GANTRY_NAME: Regex = Regex::new(r"(?i)TRIO|PORTICO").unwrap();
}

pub const PROCEDURAL_GANTRY_MODEL: &str = "procedural-portico";
/// Cross-arm widening of gantry phase positions.
pub const GANTRY_SPREAD_FACTOR: f64 = 1.4;
/// Lateral position of shield wires on a gantry beam (metres).
pub const GANTRY_SHIELD_OFFSET_M: f64 = 8.2;

/// Templates visible to one tower: its own authored points first, then the
/// shared set for its model type.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateSet<'a> {
    pub instance: &'a [AnchorTemplate],
    pub generic: &'a [AnchorTemplate],
}

impl<'a> IntoIterator for TemplateSet<'a> {
    type Item = &'a AnchorTemplate;
    type IntoIter = Chain<slice::Iter<'a, AnchorTemplate>, slice::Iter<'a, AnchorTemplate>>;

    fn into_iter(self) -> Self::IntoIter {
        self.instance.iter().chain(self.generic.iter())
    }
}

impl<'a> TemplateSet<'a> {
    pub fn new(instance: &'a [AnchorTemplate], generic: &'a [AnchorTemplate]) -> Self {
        Self { instance, generic }
    }

    pub fn is_empty(&self) -> bool {
        self.instance.is_empty() && self.generic.is_empty()
    }

    /// Mean of the base/foundation templates; the model's authored origin is
    /// not assumed to be its structural centre.
    pub fn base_centroid(&self) -> Vec3 {
        Vec3::centroid(
            self.into_iter()
                .filter(|t| t.is_base())
                .map(|t| &t.position),
        )
        .unwrap_or(Vec3::ZERO)
    }
}

pub fn is_gantry(tower: &Tower, model_key: &str) -> bool {
    model_key == PROCEDURAL_GANTRY_MODEL
        || model_key.to_uppercase().contains("PORTICO")
        || GANTRY_NAME.is_match(&tower.name)
}

/// World placement of one tower, shared by all of its anchors.
#[derive(Clone, Copy, Debug)]
pub struct TowerPlacement {
    frame: LocalFrame,
    /// Ground elevation plus the global vertical offset.
    base_alt: f64,
    heading: f64,
    rotation: Rotation,
    translation: Vec3,
    pub rendered_height: f64,
    pub global_scale: f64,
    pub gantry: bool,
}

impl TowerPlacement {
    pub fn new(
        tower: &Tower,
        transform: &ModelTransform,
        model_key: &str,
        heading: f64,
        ground_elevation: f64,
        settings: &CableSettings,
    ) -> GeometryResult<Self> {
        let (lng, lat) = tower.position()?;
        let base_height = tower.effective_height(settings.default_tower_height)?;
        let rendered_height = base_height * transform.scale_z() * settings.global_scale;
        if !rendered_height.is_finite() {
            return Err(GeometryError::InvalidHeight {
                tower_id: tower.id.clone(),
                height: rendered_height,
            });
        }
        let base_alt = ground_elevation + settings.tower_vertical_offset;
        if !(heading.is_finite() && base_alt.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate {
                context: "tower placement",
                lng,
                lat,
                alt: base_alt,
            });
        }

        Ok(Self {
            frame: LocalFrame::new(lng, lat),
            base_alt,
            heading,
            rotation: Rotation::new(transform.pitch(), transform.roll(), heading + transform.yaw()),
            translation: transform.translation(),
            rendered_height,
            global_scale: settings.global_scale,
            gantry: is_gantry(tower, model_key),
        })
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Model-local metres to (east, north, up) metres relative to the tower base.
    pub fn to_world_offset(&self, local: Vec3) -> Vec3 {
        self.rotation.apply(local + self.translation)
    }

    /// Absolute position of a (east, north, up) offset.
    pub fn to_world(&self, offset: Vec3) -> Point3D {
        let (lng, lat) = self.frame.unproject(offset.x, offset.y);
        Point3D::new(lng, lat, self.base_alt + offset.z)
    }

    /// Template position in local metres, re-centred on the base centroid.
    pub fn template_local(&self, template: &AnchorTemplate, centroid: Vec3) -> Vec3 {
        (template.position - centroid) * self.rendered_height
    }

    /// Parametric anchor position in local metres.
    pub fn parametric_local(&self, conductor: &ConductorConfig) -> Vec3 {
        if self.gantry {
            let h = match conductor.class() {
                ConductorClass::ShieldWire if conductor.h < 0.0 => -GANTRY_SHIELD_OFFSET_M,
                ConductorClass::ShieldWire => GANTRY_SHIELD_OFFSET_M,
                ConductorClass::Phase => conductor.h * GANTRY_SPREAD_FACTOR,
            };
            Vec3::new(h, 0.0, self.rendered_height + conductor.v_offset)
        } else {
            Vec3::new(
                conductor.h,
                0.0,
                conductor.v_ratio * self.rendered_height + conductor.v_offset,
            )
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnchorSource {
    Template { rule: MatchRule, candidates: usize },
    Parametric { gantry: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAnchor {
    pub point: Point3D,
    pub source: AnchorSource,
    pub template_name: Option<String>,
    pub fix_height_applied: bool,
    pub manual_offset: ResolvedOffset,
}

/// Everything needed to resolve one anchor.
#[derive(Clone, Copy)]
pub struct AnchorRequest<'a> {
    pub tower: &'a Tower,
    pub conductor: &'a ConductorConfig,
    pub role: AnchorRole,
    pub transform: &'a ModelTransform,
    pub templates: TemplateSet<'a>,
    pub placement: &'a TowerPlacement,
}

pub fn resolve_anchor(request: &AnchorRequest) -> GeometryResult<ResolvedAnchor> {
    let AnchorRequest {
        tower,
        conductor,
        role,
        transform,
        templates,
        placement,
    } = *request;

    let matched = if templates.is_empty() {
        None
    } else {
        find_template(templates, conductor, role)
    };

    let (local, source, template_name) = match matched {
        Some(m) => (
            placement.template_local(m.template, templates.base_centroid()),
            AnchorSource::Template {
                rule: m.rule,
                candidates: m.candidates,
            },
            Some(m.template.name.clone()),
        ),
        None => (
            placement.parametric_local(conductor),
            AnchorSource::Parametric {
                gantry: placement.gantry,
            },
            None,
        ),
    };

    let mut world = placement.to_world_offset(local);

    let fix_height = tower.fix_heights.for_class(conductor.class());
    // Measured height above the base; model translation z does not apply.
    if let Some(fix) = fix_height {
        world.z = fix * placement.global_scale;
    }

    let manual = resolve_conductor_offset(transform, conductor);
    let manual_world = Vec3::new(manual.offset.x, manual.offset.y, 0.0)
        .rotate_heading(placement.heading());
    world = world + manual_world + Vec3::new(0.0, 0.0, manual.offset.z);

    let point = placement.to_world(world);
    point.ensure_finite("anchor")?;

    Ok(ResolvedAnchor {
        point,
        source,
        template_name,
        fix_height_applied: fix_height.is_some(),
        manual_offset: manual,
    })
}

/// Absolute positions of every base/foundation template of a tower.
pub fn resolve_base_points(
    placement: &TowerPlacement,
    templates: TemplateSet,
) -> Vec<(String, Point3D)> {
    let centroid = templates.base_centroid();
    templates
        .into_iter()
        .filter(|t| t.is_base())
        .map(|t| {
            let offset = placement.to_world_offset(placement.template_local(t, centroid));
            (t.name.clone(), placement.to_world(offset))
        })
        .filter(|(_, p)| p.is_finite())
        .collect()
}
