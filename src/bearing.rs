// Copyright Catenary Transit Initiatives
//! Compass bearings and sequence-aware tower orientation.

use crate::models::Tower;
use crate::naming::{normalize_name, parallel_suffix, sequence_number};
use ahash::AHashMap;
use geo_types::Point;
use itertools::Itertools;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMethod {
    /// Halfway between the incoming and outgoing bearings.
    #[default]
    Bisector,
    /// Bearing towards the next structure.
    Tangential,
}

/// Great-circle initial bearing from `from` to `to` (x = lng, y = lat),
/// degrees clockwise from north in `[0, 360)`.
pub fn bearing(from: Point, to: Point) -> f64 {
    let phi1 = from.y().to_radians();
    let phi2 = to.y().to_radians();
    let delta_lambda = (to.x() - from.x()).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Wraps any angle into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if d >= 360.0 { 0.0 } else { d }
}

/// Average of two bearings along the shorter arc between them.
pub fn bisect_bearings(incoming: f64, outgoing: f64) -> f64 {
    let mut diff = outgoing - incoming;
    while diff < -180.0 {
        diff += 360.0;
    }
    while diff > 180.0 {
        diff -= 360.0;
    }
    normalize_degrees(incoming + diff / 2.0)
}

fn tower_point(t: &Tower) -> Point {
    Point::new(t.lng, t.lat)
}

/// Orientation of `sequence[index]` from its neighbours in the ordered
/// sequence. With `suffix_filter`, only structures whose names end with the
/// suffix are considered neighbours. Returns 0 when there are no neighbours.
pub fn tower_orientation(
    index: usize,
    sequence: &[Tower],
    method: AlignmentMethod,
    suffix_filter: Option<&str>,
) -> f64 {
    let Some(current) = sequence.get(index) else {
        return 0.0;
    };

    let filtered: Vec<&Tower> = match suffix_filter {
        Some(suffix) => {
            let suffix = suffix.to_uppercase();
            sequence
                .iter()
                .filter(|t| normalize_name(&t.name).ends_with(&suffix))
                .collect()
        }
        None => sequence.iter().collect(),
    };

    let found = filtered.iter().position(|t| t.id == current.id);
    let (neighbours, position) = match found {
        Some(pos) => (filtered, pos),
        // The structure itself lacks the suffix, so the filter does not apply.
        None => (sequence.iter().collect(), index),
    };

    let prev = position.checked_sub(1).and_then(|i| neighbours.get(i));
    let next = neighbours.get(position + 1);
    let here = tower_point(current);

    match (prev, next) {
        (Some(p), Some(n)) => {
            let outgoing = bearing(here, tower_point(n));
            match method {
                AlignmentMethod::Tangential => outgoing,
                AlignmentMethod::Bisector => {
                    let incoming = bearing(tower_point(p), here);
                    bisect_bearings(incoming, outgoing)
                }
            }
        }
        (Some(p), None) => bearing(tower_point(p), here),
        (None, Some(n)) => bearing(here, tower_point(n)),
        (None, None) => 0.0,
    }
}

/// Sorts towers into line order: sequence number, then name, then id.
pub fn order_by_sequence(towers: &[Tower]) -> Vec<Tower> {
    towers
        .iter()
        .cloned()
        .sorted_by(|a, b| {
            sequence_number(a)
                .cmp(&sequence_number(b))
                .then_with(|| normalize_name(&a.name).cmp(&normalize_name(&b.name)))
                .then_with(|| a.id.cmp(&b.id))
        })
        .collect()
}

/// Heading of every tower, keyed by tower id. Manual headings win; the rest
/// are derived per project from the ordered sequence.
pub fn orientation_map(
    towers: &[Tower],
    method: AlignmentMethod,
    isolate_parallel_suffixes: bool,
) -> AHashMap<String, f64> {
    let mut out = AHashMap::with_capacity(towers.len());

    let by_project = towers
        .iter()
        .filter(|t| t.position().is_ok())
        .cloned()
        .into_group_map_by(|t| t.project_key().to_string());

    for (_, project_towers) in by_project {
        let ordered = order_by_sequence(&project_towers);
        for (i, tower) in ordered.iter().enumerate() {
            let heading = match tower.heading {
                Some(h) if h.is_finite() => normalize_degrees(h),
                _ => {
                    let suffix = if isolate_parallel_suffixes {
                        parallel_suffix(&tower.name)
                    } else {
                        None
                    };
                    tower_orientation(i, &ordered, method, suffix.as_deref())
                }
            };
            out.insert(tower.id.clone(), heading);
        }
    }

    out
}
