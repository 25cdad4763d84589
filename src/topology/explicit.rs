// Copyright Catenary Transit Initiatives
//! Topology from stored spans.

use super::{HiddenSpans, Topology, TopologyLink, link_pair_key, tower_carries};
use crate::errors::GeometryError;
use crate::models::{ConductorConfig, Span, SpanConductor, SpanSource, Tower};
use crate::naming::{normalize_name, normalize_phase, site_core};
use ahash::AHashSet;
use itertools::Itertools;

/// Tower referenced by a span end: exact id, else the structure's site core,
/// preferring towers of the span's own project.
fn find_tower<'a>(towers: &'a [Tower], reference: &str, project: Option<&str>) -> Option<&'a Tower> {
    towers.iter().find(|t| t.id == reference).or_else(|| {
        let core = site_core(reference);
        towers
            .iter()
            .filter(|t| site_core(&t.name) == core)
            .min_by(|a, b| {
                let foreign = |t: &Tower| project.is_some_and(|p| t.project_key() != p);
                foreign(a).cmp(&foreign(b)).then_with(|| a.id.cmp(&b.id))
            })
    })
}

fn circuits_agree(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => a.eq_ignore_ascii_case(b),
        _ => true,
    }
}

/// Whether a span physically carries the conductor.
fn span_carries(carried: &[SpanConductor], conductor: &ConductorConfig) -> bool {
    let wanted = normalize_phase(conductor.phase.as_deref().unwrap_or(&conductor.label));
    carried.iter().any(|c| {
        normalize_phase(&c.phase) == wanted
            && circuits_agree(c.circuit_id.as_deref(), conductor.circuit_id.as_deref())
    })
}

pub(super) fn build<'a>(
    towers: &'a [Tower],
    spans: &'a [Span],
    conductors: &[&'a ConductorConfig],
    hidden: &HiddenSpans,
) -> Topology<'a> {
    let mut topology = Topology::default();
    let mut seen: AHashSet<(String, String, &str)> = AHashSet::new();

    // Resolve first so duplicates are settled by canonical key, not input order.
    let resolved = spans
        .iter()
        .filter_map(|span| {
            let project = span.project_id.as_deref();
            let start = find_tower(towers, &span.start_id, project);
            let end = find_tower(towers, &span.end_id, project);
            match (start, end) {
                (Some(start), Some(end)) => Some((span, start, end)),
                (start, _) => {
                    let reference = if start.is_none() { &span.start_id } else { &span.end_id };
                    tracing::warn!(span = %span.id, reference = %reference, "span references an unknown tower");
                    topology.issues.push(GeometryError::MissingTowerReference {
                        span_id: span.id.clone(),
                        reference: reference.clone(),
                    });
                    None
                }
            }
        })
        .map(|(span, start, end)| (link_pair_key(start, end), span, start, end))
        .sorted_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)))
        .collect::<Vec<_>>();

    for (key, span, start, end) in resolved {
        if hidden.is_tower_hidden(start) || hidden.is_tower_hidden(end) {
            continue;
        }
        let project_id = span
            .project_id
            .clone()
            .unwrap_or_else(|| start.project_key().to_string());
        let (n1, n2) = (normalize_name(&start.name), normalize_name(&end.name));
        if hidden.is_pair_hidden(&project_id, &n1, &n2) || hidden.is_span_hidden(&project_id, &span.id) {
            continue;
        }

        for conductor in conductors.iter().copied() {
            let carried = match span.conductors.as_deref() {
                Some(list) => span_carries(list, conductor),
                // Legacy spans never recorded their conductors.
                None => tower_carries(start, conductor),
            };
            if !carried || !seen.insert((project_id.clone(), key.clone(), conductor.id.as_str())) {
                continue;
            }
            topology.links.push(TopologyLink {
                start,
                end,
                conductor,
                source: SpanSource::Explicit,
                span: Some(span),
                pair_key: key.clone(),
                project_id: project_id.clone(),
            });
        }
    }

    topology
}
