// Copyright Catenary Transit Initiatives
//! Ground elevation of a tower: explicit override, terrain sample, stored
//! value, or sea level, in that order. Stored values may first be corrected
//! by surveyed reference markers.

use crate::geodesy::{METERS_PER_DEGREE, degree_radius, haversine_distance};
use crate::models::{ReferenceMarker, Tower};
use ahash::AHashMap;
use rstar::{AABB, RTree, primitives::GeomWithData};

/// Synchronous terrain lookup at (lng, lat). `None` means unknown.
pub trait TerrainSampler: Sync {
    fn sample(&self, lng: f64, lat: f64) -> Option<f64>;
}

impl<F> TerrainSampler for F
where
    F: Fn(f64, f64) -> Option<f64> + Sync,
{
    fn sample(&self, lng: f64, lat: f64) -> Option<f64> {
        self(lng, lat)
    }
}

/// Sampler for callers without a terrain source.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTerrain;

impl TerrainSampler for NoTerrain {
    fn sample(&self, _lng: f64, _lat: f64) -> Option<f64> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElevationSource {
    Override,
    Terrain,
    Stored,
    SeaLevel,
}

fn usable(v: Option<f64>) -> Option<f64> {
    v.filter(|e| e.is_finite())
}

/// Resolves a tower's ground elevation. Terrain samples of exactly 0 are
/// treated as tiles that have not loaded yet.
pub fn resolve_elevation(
    tower: &Tower,
    stored: Option<f64>,
    sampler: &dyn TerrainSampler,
) -> (f64, ElevationSource) {
    if let Some(e) = usable(tower.overrides.elevation) {
        return (e, ElevationSource::Override);
    }
    if let Some(e) = usable(sampler.sample(tower.lng, tower.lat)).filter(|e| *e != 0.0) {
        return (e, ElevationSource::Terrain);
    }
    match usable(stored) {
        Some(e) => (e, ElevationSource::Stored),
        None => (0.0, ElevationSource::SeaLevel),
    }
}

fn marker_elevation(marker: &ReferenceMarker) -> Option<f64> {
    usable(marker.elevation)
        .filter(|e| *e != 0.0)
        .or_else(|| usable(marker.altitude))
}

/// Stored elevation of every tower, corrected by the nearest reference marker
/// within `radius_m`. Towers without a marker nearby keep their raw value.
pub fn snap_to_reference_markers(
    towers: &[Tower],
    markers: &[ReferenceMarker],
    radius_m: f64,
) -> AHashMap<String, Option<f64>> {
    let items: Vec<GeomWithData<[f64; 2], usize>> = markers
        .iter()
        .enumerate()
        .filter(|(_, m)| m.lng.is_finite() && m.lat.is_finite() && marker_elevation(m).is_some())
        .map(|(i, m)| GeomWithData::new([m.lng, m.lat], i))
        .collect();
    let tree = RTree::bulk_load(items);

    towers
        .iter()
        .map(|tower| {
            let snapped = nearest_marker(&tree, markers, tower, radius_m)
                .and_then(marker_elevation)
                .or(tower.elevation);
            (tower.id.clone(), snapped)
        })
        .collect()
}

fn nearest_marker<'a>(
    tree: &RTree<GeomWithData<[f64; 2], usize>>,
    markers: &'a [ReferenceMarker],
    tower: &Tower,
    radius_m: f64,
) -> Option<&'a ReferenceMarker> {
    if !(tower.lng.is_finite() && tower.lat.is_finite()) || tree.size() == 0 {
        return None;
    }
    let lat_deg = radius_m / METERS_PER_DEGREE;
    let lng_deg = degree_radius(radius_m, tower.lat);
    let envelope = AABB::from_corners(
        [tower.lng - lng_deg, tower.lat - lat_deg],
        [tower.lng + lng_deg, tower.lat + lat_deg],
    );

    tree.locate_in_envelope(&envelope)
        .filter_map(|item| {
            let marker = markers.get(item.data)?;
            let d = haversine_distance(tower.lng, tower.lat, marker.lng, marker.lat);
            (d <= radius_m).then_some((d, marker))
        })
        .min_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)))
        .map(|(_, marker)| marker)
}
