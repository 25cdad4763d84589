// Copyright Catenary Transit Initiatives
// ===========================================================================
// Span topology
// ===========================================================================
//
// Decides which (start tower, end tower, conductor) triples get a cable.
//
// Explicit mode: the project has stored spans, each resolved to two towers
// and filtered by the conductors it physically carries.
// Inferred mode: no stored spans; consecutive structure sites along each
// project are linked when they are close enough.
// ===========================================================================

pub mod explicit;
pub mod inferred;

use crate::config::TopologyConfig;
use crate::errors::GeometryError;
use crate::models::{ConductorConfig, Span, SpanSource, Tower};
use crate::naming::{normalize_name, pair_key};
use ahash::AHashSet;
use std::cmp::Ordering;

/// Spans and towers the user has hidden.
///
/// Keys are `START:::END`, `project:::START:::END` or `project:::span_id`,
/// with upper-cased structure names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiddenSpans {
    pub keys: AHashSet<String>,
    pub tower_ids: AHashSet<String>,
}

impl HiddenSpans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide_pair(&mut self, project_id: Option<&str>, start_name: &str, end_name: &str) {
        let pair = format!("{}:::{}", normalize_name(start_name), normalize_name(end_name));
        match project_id {
            Some(p) => self.keys.insert(format!("{p}:::{pair}")),
            None => self.keys.insert(pair),
        };
    }

    pub fn hide_span(&mut self, project_id: &str, span_id: &str) {
        self.keys.insert(format!("{project_id}:::{span_id}"));
    }

    pub fn hide_tower(&mut self, tower_id: &str) {
        self.tower_ids.insert(tower_id.to_string());
    }

    /// Either direction, bare or scoped to the project.
    pub fn is_pair_hidden(&self, project_id: &str, n1: &str, n2: &str) -> bool {
        let ab = format!("{n1}:::{n2}");
        let ba = format!("{n2}:::{n1}");
        self.keys.contains(&ab)
            || self.keys.contains(&ba)
            || self.keys.contains(&format!("{project_id}:::{ab}"))
            || self.keys.contains(&format!("{project_id}:::{ba}"))
    }

    pub fn is_span_hidden(&self, project_id: &str, span_id: &str) -> bool {
        self.keys.contains(&format!("{project_id}:::{span_id}"))
    }

    pub fn is_tower_hidden(&self, tower: &Tower) -> bool {
        !tower.visible || self.tower_ids.contains(&tower.id)
    }
}

/// One cable to draw.
#[derive(Clone, Debug)]
pub struct TopologyLink<'a> {
    pub start: &'a Tower,
    pub end: &'a Tower,
    pub conductor: &'a ConductorConfig,
    pub source: SpanSource,
    /// Stored span behind an explicit link.
    pub span: Option<&'a Span>,
    /// Sorted upper-cased names joined by `:::`.
    pub pair_key: String,
    pub project_id: String,
}

impl TopologyLink<'_> {
    /// Stable identifier of the resulting cable path. Inferred links carry
    /// their project since structure names repeat across projects.
    pub fn path_id(&self) -> String {
        match self.span {
            Some(span) => format!("{}-{}-{}", self.source.as_str(), span.id, self.conductor.id),
            None => format!(
                "{}-{}:::{}-{}",
                self.source.as_str(),
                self.project_id,
                self.pair_key,
                self.conductor.id
            ),
        }
    }

    pub fn tension_override(&self) -> Option<f64> {
        self.span.and_then(|s| s.tension)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Topology<'a> {
    pub links: Vec<TopologyLink<'a>>,
    /// Spans dropped because they point at towers that do not exist.
    pub issues: Vec<GeometryError>,
}

pub(crate) fn link_pair_key(start: &Tower, end: &Tower) -> String {
    pair_key(&normalize_name(&start.name), &normalize_name(&end.name))
}

fn compare_links(a: &TopologyLink, b: &TopologyLink) -> Ordering {
    a.project_id
        .cmp(&b.project_id)
        .then_with(|| a.pair_key.cmp(&b.pair_key))
        .then_with(|| a.conductor.id.cmp(&b.conductor.id))
        .then_with(|| a.start.id.cmp(&b.start.id))
}

/// Circuit filter against the circuits a tower declares. Conductors without
/// a circuit, and towers without declared circuits, always pass.
pub(crate) fn tower_carries(tower: &Tower, conductor: &ConductorConfig) -> bool {
    match conductor.circuit_id.as_deref() {
        Some(circuit) if !circuit.is_empty() && !tower.circuits.is_empty() => tower
            .circuits
            .iter()
            .any(|c| c.eq_ignore_ascii_case(circuit)),
        _ => true,
    }
}

/// Builds the set of cables for one pass. Stored spans, when present, fully
/// define the topology; otherwise it is inferred from names and proximity.
pub fn build_topology<'a>(
    towers: &'a [Tower],
    spans: &'a [Span],
    conductors: &'a [ConductorConfig],
    hidden: &HiddenSpans,
    config: &TopologyConfig,
) -> Topology<'a> {
    let enabled: Vec<&ConductorConfig> = conductors.iter().filter(|c| c.enabled).collect();

    let mut topology = if !spans.is_empty() {
        explicit::build(towers, spans, &enabled, hidden)
    } else if config.auto_inference {
        inferred::build(towers, &enabled, hidden, config)
    } else {
        Topology::default()
    };

    topology.links.sort_by(compare_links);
    tracing::debug!(
        links = topology.links.len(),
        issues = topology.issues.len(),
        "built span topology"
    );
    topology
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_conductors;

    #[test]
    fn test_hidden_pair_either_direction() {
        let mut hidden = HiddenSpans::new();
        hidden.hide_pair(None, "1/1", "1/2");
        assert!(hidden.is_pair_hidden("p", "1/1", "1/2"));
        assert!(hidden.is_pair_hidden("p", "1/2", "1/1"));

        let mut scoped = HiddenSpans::new();
        scoped.hide_pair(Some("p"), "1/2", "1/1");
        assert!(scoped.is_pair_hidden("p", "1/1", "1/2"));
        assert!(!scoped.is_pair_hidden("q", "1/1", "1/2"));
    }

    #[test]
    fn test_tower_carries_circuit() {
        let mut t = Tower::new("t", "1/1", 0.0, 0.0);
        let mut c = ConductorConfig::new("FA-1", "Fase A1", Some("FASE A"), 0.0, 0.85, 0.0);
        assert!(tower_carries(&t, &c));
        c.circuit_id = Some("c1".to_string());
        assert!(tower_carries(&t, &c));
        t.circuits = vec!["C2".to_string()];
        assert!(!tower_carries(&t, &c));
        t.circuits.push("C1".to_string());
        assert!(tower_carries(&t, &c));
    }

    #[test]
    fn test_no_spans_and_no_inference_is_empty() {
        let towers = vec![Tower::new("a", "1/1", 0.0, 0.0), Tower::new("b", "1/2", 0.0, 0.0001)];
        let conductors = default_conductors();
        let config = TopologyConfig {
            auto_inference: false,
            ..TopologyConfig::default()
        };
        let topology = build_topology(&towers, &[], &conductors, &HiddenSpans::new(), &config);
        assert!(topology.links.is_empty());
    }

    #[test]
    fn test_disabled_conductors_are_ignored() {
        let towers = vec![Tower::new("a", "1/1", 0.0, 0.0), Tower::new("b", "1/2", 0.0, 0.0001)];
        let mut conductors = default_conductors();
        for c in conductors.iter_mut().skip(1) {
            c.enabled = false;
        }
        let topology = build_topology(
            &towers,
            &[],
            &conductors,
            &HiddenSpans::new(),
            &TopologyConfig::default(),
        );
        assert_eq!(topology.links.len(), 1);
        assert_eq!(topology.links[0].path_id(), "inferred-default:::1/1:::1/2-GW-OPGW");
    }
}
