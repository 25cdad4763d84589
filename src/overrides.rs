// Copyright Catenary Transit Initiatives
//! Manual anchor offsets and per-model transform selection.
//!
//! Offsets come from three layers, checked in order for each axis:
//! individual anchor id, phase group, tower-global. The first layer that
//! sets an axis owns it.

use crate::config::CableSettings;
use crate::math3d::Vec3;
use crate::models::{AxisOffset, ConductorConfig, ModelTransform, Tower};

pub const DEFAULT_MODEL_KEY: &str = "default";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OffsetSource {
    Individual,
    Phase,
    Global,
    Unset,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedOffset {
    /// Metres: x right, y forward, z up.
    pub offset: Vec3,
    /// Which layer supplied x, y and z.
    pub sources: [OffsetSource; 3],
}

fn first_axis<F>(layers: &[(OffsetSource, Option<&AxisOffset>)], axis: F) -> (f64, OffsetSource)
where
    F: Fn(&AxisOffset) -> Option<f64>,
{
    layers
        .iter()
        .find_map(|(source, layer)| {
            layer
                .and_then(|o| axis(o))
                .filter(|v| v.is_finite())
                .map(|v| (v, *source))
        })
        .unwrap_or((0.0, OffsetSource::Unset))
}

/// Looks up the manual offset for one anchor.
pub fn resolve_offset(
    transform: &ModelTransform,
    anchor_id: &str,
    phase: Option<&str>,
) -> ResolvedOffset {
    let layers = [
        (
            OffsetSource::Individual,
            transform.anchor_overrides.get(anchor_id),
        ),
        (
            OffsetSource::Phase,
            phase.and_then(|p| transform.phase_overrides.get(p)),
        ),
        (OffsetSource::Global, transform.anchor_global_offset.as_ref()),
    ];

    let (x, sx) = first_axis(&layers, |o| o.x);
    let (y, sy) = first_axis(&layers, |o| o.y);
    let (z, sz) = first_axis(&layers, |o| o.z);

    ResolvedOffset {
        offset: Vec3::new(x, y, z),
        sources: [sx, sy, sz],
    }
}

pub fn resolve_conductor_offset(transform: &ModelTransform, conductor: &ConductorConfig) -> ResolvedOffset {
    resolve_offset(transform, &conductor.id, conductor.phase.as_deref())
}

/// Model id used to render a tower.
pub fn model_key<'a>(tower: &'a Tower, settings: &'a CableSettings) -> &'a str {
    tower
        .model_id()
        .or(settings.custom_model_id.as_deref())
        .unwrap_or(DEFAULT_MODEL_KEY)
}

/// Configured transform for a model id, else the "default" entry.
pub fn model_config<'a>(settings: &'a CableSettings, model_id: &str) -> Option<&'a ModelTransform> {
    settings
        .model_configs
        .get(model_id)
        .or_else(|| settings.model_configs.get(DEFAULT_MODEL_KEY))
}

/// Per-instance transform merged with the model's configuration. An instance
/// yaw of exactly 0 inherits the model's yaw.
pub fn effective_transform(tower: &Tower, settings: &CableSettings) -> ModelTransform {
    let model = model_config(settings, model_key(tower, settings));

    match (tower.overrides.transform.as_ref(), model) {
        (None, Some(model)) => model.clone(),
        (None, None) => ModelTransform::default(),
        (Some(individual), model) => {
            let mut merged = individual.clone();
            let model_yaw = model.map(ModelTransform::yaw).unwrap_or(0.0);
            if merged.yaw() == 0.0 && model_yaw != 0.0 {
                merged.rotation[2] = model_yaw;
            }
            merged
        }
    }
}
