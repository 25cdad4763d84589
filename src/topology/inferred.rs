// Copyright Catenary Transit Initiatives
//! Topology inferred from structure names and proximity.
//!
//! Towers sharing a site key ("12/3A" and "12/3B") are parallel circuits at
//! one site. Sites are chained in sequence order; neighbouring sites are
//! linked sibling by sibling.

use super::{HiddenSpans, Topology, TopologyLink, link_pair_key, tower_carries};
use crate::config::TopologyConfig;
use crate::geodesy::haversine_distance;
use crate::models::{ConductorConfig, SpanSource, Tower};
use crate::naming::{normalize_name, sequence_number, site_key};
use ahash::AHashSet;
use itertools::Itertools;

struct Site<'a> {
    key: String,
    /// Sorted by name.
    towers: Vec<&'a Tower>,
    min_sequence: i64,
}

impl Site<'_> {
    fn representative(&self) -> Option<&Tower> {
        self.towers.first().copied()
    }
}

fn sites_for_project<'a>(towers: Vec<&'a Tower>, decimals: usize) -> Vec<Site<'a>> {
    towers
        .into_iter()
        .into_group_map_by(|t| site_key(t, decimals))
        .into_iter()
        .map(|(key, members)| {
            let min_sequence = members.iter().map(|t| sequence_number(t)).min().unwrap_or(0);
            let towers = members
                .into_iter()
                .sorted_by(|a, b| {
                    normalize_name(&a.name)
                        .cmp(&normalize_name(&b.name))
                        .then_with(|| a.id.cmp(&b.id))
                })
                .collect();
            Site {
                key,
                towers,
                min_sequence,
            }
        })
        .sorted_by(|a, b| a.min_sequence.cmp(&b.min_sequence).then_with(|| a.key.cmp(&b.key)))
        .collect()
}

pub(super) fn build<'a>(
    towers: &'a [Tower],
    conductors: &[&'a ConductorConfig],
    hidden: &HiddenSpans,
    config: &TopologyConfig,
) -> Topology<'a> {
    let mut topology = Topology::default();

    let by_project = towers
        .iter()
        .filter(|t| t.position().is_ok())
        .into_group_map_by(|t| t.project_key().to_string());

    for (project, project_towers) in by_project.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
        let sites = sites_for_project(project_towers, config.coordinate_decimals);
        // Names only repeat meaningfully within a project.
        let mut linked: AHashSet<String> = AHashSet::new();

        for (site_a, site_b) in sites.iter().tuple_windows() {
            let (Some(a), Some(b)) = (site_a.representative(), site_b.representative()) else {
                continue;
            };
            let distance = haversine_distance(a.lng, a.lat, b.lng, b.lat);
            if distance > config.link_distance_m {
                tracing::debug!(
                    project = %project,
                    from = %site_a.key,
                    to = %site_b.key,
                    distance,
                    "sites too far apart to infer a span"
                );
                continue;
            }

            for (start, end) in site_a.towers.iter().copied().zip(site_b.towers.iter().copied()) {
                if hidden.is_tower_hidden(start) || hidden.is_tower_hidden(end) {
                    continue;
                }
                let key = link_pair_key(start, end);
                if linked.contains(&key) {
                    continue;
                }
                let (n1, n2) = (normalize_name(&start.name), normalize_name(&end.name));
                if hidden.is_pair_hidden(&project, &n1, &n2) {
                    continue;
                }
                linked.insert(key.clone());

                for conductor in conductors.iter().copied().filter(|c| tower_carries(start, c)) {
                    topology.links.push(TopologyLink {
                        start,
                        end,
                        conductor,
                        source: SpanSource::Inferred,
                        span: None,
                        pair_key: key.clone(),
                        project_id: project.clone(),
                    });
                }
            }
        }
    }

    topology
}
