// Copyright Catenary Transit Initiatives
//! Caller-owned inputs for one resolution pass.

use crate::anchors::TemplateSet;
use crate::config::CableSettings;
use crate::elevation::TerrainSampler;
use crate::models::{AnchorTemplate, ReferenceMarker, Span, Tower};
use crate::overrides::DEFAULT_MODEL_KEY;
use crate::topology::HiddenSpans;
use ahash::AHashMap;

/// Everything a pass reads besides the towers and spans themselves.
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub settings: &'a CableSettings,
    /// Authored templates per tower id.
    pub instance_templates: &'a AHashMap<String, Vec<AnchorTemplate>>,
    /// Shared templates per model type, with "default" as the catch-all.
    pub model_templates: &'a AHashMap<String, Vec<AnchorTemplate>>,
    pub terrain: &'a dyn TerrainSampler,
    pub hidden: &'a HiddenSpans,
    pub reference_markers: &'a [ReferenceMarker],
}

impl<'a> ResolutionContext<'a> {
    pub fn templates_for(&self, tower: &Tower) -> TemplateSet<'a> {
        let instance = self
            .instance_templates
            .get(&tower.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let generic = tower
            .tower_type
            .as_deref()
            .and_then(|key| self.model_templates.get(key))
            .or_else(|| self.model_templates.get(DEFAULT_MODEL_KEY))
            .map(Vec::as_slice)
            .unwrap_or_default();
        TemplateSet::new(instance, generic)
    }
}

/// Cache key for pass results. Callers bump a revision whenever the
/// corresponding input changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolutionKey {
    pub tower_revision: u64,
    pub config_revision: u64,
    pub terrain_revision: u64,
}

/// Serialized scene as exported by the host, used by the preview tool.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSnapshot {
    pub towers: Vec<Tower>,
    pub spans: Vec<Span>,
    pub hidden: HiddenSpans,
    pub reference_markers: Vec<ReferenceMarker>,
    pub instance_templates: AHashMap<String, Vec<AnchorTemplate>>,
    pub model_templates: AHashMap<String, Vec<AnchorTemplate>>,
}

impl SceneSnapshot {
    pub fn context<'a>(
        &'a self,
        settings: &'a CableSettings,
        terrain: &'a dyn TerrainSampler,
    ) -> ResolutionContext<'a> {
        ResolutionContext {
            settings,
            instance_templates: &self.instance_templates,
            model_templates: &self.model_templates,
            terrain,
            hidden: &self.hidden,
            reference_markers: &self.reference_markers,
        }
    }
}
