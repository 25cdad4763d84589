// Copyright Catenary Transit Initiatives
use geo::{Distance, Haversine};
use geo_types::Point;

/// Metres per degree of latitude used by every local-frame conversion.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

// --- Local frame (equirectangular around one origin) ---

/// Equirectangular frame centered on a tower. Converts east/north metre
/// offsets into degrees and back; accurate enough over a few hundred metres.
/// x = cos(lat0) * dlon * M, y = dlat * M
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    origin_lng: f64,
    origin_lat: f64,
    meters_per_deg_lng: f64,
}

impl LocalFrame {
    pub fn new(lng0: f64, lat0: f64) -> Self {
        Self {
            origin_lng: lng0,
            origin_lat: lat0,
            meters_per_deg_lng: METERS_PER_DEGREE * lat0.to_radians().cos(),
        }
    }

    /// Project (lng, lat) to (east, north) metres
    pub fn project(&self, lng: f64, lat: f64) -> (f64, f64) {
        (
            (lng - self.origin_lng) * self.meters_per_deg_lng,
            (lat - self.origin_lat) * METERS_PER_DEGREE,
        )
    }

    /// Unproject (east, north) metres to (lng, lat)
    pub fn unproject(&self, east: f64, north: f64) -> (f64, f64) {
        (
            self.origin_lng + east / self.meters_per_deg_lng,
            self.origin_lat + north / METERS_PER_DEGREE,
        )
    }
}

/// Horizontal distance in metres using the equirectangular approximation at
/// the mean latitude of the two points.
pub fn equirectangular_distance(a_lng: f64, a_lat: f64, b_lng: f64, b_lat: f64) -> f64 {
    let mean_lat = ((a_lat + b_lat) / 2.0).to_radians();
    let dx = (b_lng - a_lng) * METERS_PER_DEGREE * mean_lat.cos();
    let dy = (b_lat - a_lat) * METERS_PER_DEGREE;
    (dx * dx + dy * dy).sqrt()
}

/// Great-circle distance in metres.
pub fn haversine_distance(a_lng: f64, a_lat: f64, b_lng: f64, b_lat: f64) -> f64 {
    Haversine.distance(Point::new(a_lng, a_lat), Point::new(b_lng, b_lat))
}

/// Converts a metric search radius into a conservative degree radius at `lat`.
pub fn degree_radius(radius_m: f64, lat: f64) -> f64 {
    let cos_lat = lat.to_radians().cos().abs().max(1e-6);
    radius_m / (METERS_PER_DEGREE * cos_lat)
}
