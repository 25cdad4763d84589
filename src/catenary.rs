// Copyright Catenary Transit Initiatives
//! Hanging-cable curves between two anchors.
//!
//! The curve is an inclined catenary: sag is measured from the straight chord
//! between the anchors and divided by `cos(theta)` of the chord's slope.

use crate::errors::{GeometryError, GeometryResult};
use crate::geodesy::equirectangular_distance;
use crate::models::Point3D;

/// Catenary constant used when configuration does not provide one.
pub const DEFAULT_TENSION_CONSTANT: f64 = 1200.0;
/// Default subdivision hint for mid-length spans.
pub const DEFAULT_SUBDIVISIONS: usize = 60;
pub const MIN_SUBDIVISIONS: usize = 8;
pub const MAX_SUBDIVISIONS: usize = 120;

/// Catenary constant `C = T / w` (metres). Falls back to the default when the
/// weight is zero or unusable.
pub fn constant_from_tension(horizontal_tension: f64, weight_per_meter: f64) -> f64 {
    if weight_per_meter == 0.0 || !weight_per_meter.is_finite() {
        return DEFAULT_TENSION_CONSTANT;
    }
    horizontal_tension / weight_per_meter
}

/// Mid-span sag of a level span of horizontal length `span_m`.
pub fn level_sag(span_m: f64, constant: f64) -> f64 {
    constant * ((span_m / (2.0 * constant)).cosh() - 1.0)
}

/// Cable length of a level span.
pub fn arc_length(span_m: f64, constant: f64) -> f64 {
    2.0 * constant * (span_m / (2.0 * constant)).sinh()
}

/// Radius of curvature at `x` metres from the vertex.
pub fn radius_of_curvature(x: f64, constant: f64) -> f64 {
    constant * (x / constant).cosh().powi(2)
}

/// Number of subdivisions for a span: short jumpers stay cheap, long spans
/// stay smooth.
pub fn subdivisions_for(span_m: f64, hint: usize) -> usize {
    let n = if span_m < 50.0 {
        12
    } else if span_m < 150.0 {
        24
    } else if span_m > 600.0 {
        100
    } else {
        hint
    };
    n.clamp(MIN_SUBDIVISIONS, MAX_SUBDIVISIONS)
}

/// Samples the catenary between `start` and `end`.
///
/// Returns `subdivisions + 1` points, the first and last being exactly the
/// inputs. A zero-length span returns just the two endpoints.
pub fn generate(
    start: Point3D,
    end: Point3D,
    constant: f64,
    subdivisions: usize,
) -> GeometryResult<Vec<Point3D>> {
    if !(constant.is_finite() && constant > 0.0) {
        return Err(GeometryError::InvalidConstant(constant));
    }
    start.ensure_finite("catenary start")?;
    end.ensure_finite("catenary end")?;

    let span = equirectangular_distance(start.lng, start.lat, end.lng, end.lat);
    if span == 0.0 {
        return Ok(vec![start, end]);
    }

    let theta = (end.alt - start.alt).atan2(span);
    let cos_theta = theta.cos();
    let half = (span / (2.0 * constant)).cosh();
    if !half.is_finite() {
        return Err(GeometryError::SagOverflow {
            span_m: span,
            constant,
        });
    }

    let n = subdivisions_for(span, subdivisions);
    let mut points = Vec::with_capacity(n + 1);
    points.push(start);
    for i in 1..n {
        let t = i as f64 / n as f64;
        let x = t * span;
        let sag = constant * (half - ((span - 2.0 * x) / (2.0 * constant)).cosh()) / cos_theta;

        points.push(Point3D {
            lng: start.lng + t * (end.lng - start.lng),
            lat: start.lat + t * (end.lat - start.lat),
            alt: start.alt + t * (end.alt - start.alt) - sag,
        });
    }
    points.push(end);

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::METERS_PER_DEGREE;

    fn chord_alt(start: &Point3D, end: &Point3D, t: f64) -> f64 {
        start.alt + t * (end.alt - start.alt)
    }

    #[test]
    fn test_endpoints_preserved_and_cable_sags() {
        let start = Point3D::new(-46.63, -23.55, 812.0);
        let end = Point3D::new(-46.626, -23.548, 835.0);
        let pts = generate(start, end, 1200.0, DEFAULT_SUBDIVISIONS).unwrap();

        assert_eq!(pts.first(), Some(&start));
        assert_eq!(pts.last(), Some(&end));

        let n = pts.len() - 1;
        for (i, p) in pts.iter().enumerate().skip(1).take(n - 1) {
            let t = i as f64 / n as f64;
            assert!(
                p.alt < chord_alt(&start, &end, t),
                "sample {i} at {} is above the chord",
                p.alt
            );
        }
    }

    #[test]
    fn test_zero_length_span_returns_endpoints() {
        let a = Point3D::new(10.0, 20.0, 100.0);
        let b = Point3D::new(10.0, 20.0, 130.0);
        let pts = generate(a, b, 1200.0, 60).unwrap();
        assert_eq!(pts, vec![a, b]);
    }

    #[test]
    fn test_invalid_constant_rejected() {
        let a = Point3D::new(10.0, 20.0, 100.0);
        let b = Point3D::new(10.01, 20.0, 100.0);
        assert_eq!(
            generate(a, b, 0.0, 60),
            Err(GeometryError::InvalidConstant(0.0))
        );
        assert!(generate(a, b, -5.0, 60).is_err());
        assert!(generate(a, b, f64::NAN, 60).is_err());
    }

    #[test]
    fn test_non_finite_endpoint_rejected() {
        let a = Point3D::new(f64::NAN, 20.0, 100.0);
        let b = Point3D::new(10.01, 20.0, 100.0);
        assert!(matches!(
            generate(a, b, 1200.0, 60),
            Err(GeometryError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn test_subdivisions_adapt_to_distance() {
        assert_eq!(subdivisions_for(20.0, 60), 12);
        assert_eq!(subdivisions_for(100.0, 60), 24);
        assert_eq!(subdivisions_for(400.0, 60), 60);
        assert_eq!(subdivisions_for(900.0, 60), 100);
        assert_eq!(subdivisions_for(400.0, 2), MIN_SUBDIVISIONS);
        assert_eq!(subdivisions_for(400.0, 500), MAX_SUBDIVISIONS);
    }

    #[test]
    fn test_level_span_midpoint_matches_closed_form() {
        // 300 m along the equator
        let dlng = 300.0 / METERS_PER_DEGREE;
        let a = Point3D::new(0.0, 0.0, 50.0);
        let b = Point3D::new(dlng, 0.0, 50.0);
        let pts = generate(a, b, 1200.0, 60).unwrap();
        let mid = pts[pts.len() / 2];
        let expected = level_sag(300.0, 1200.0);
        assert!((50.0 - mid.alt - expected).abs() < 1e-6);
        assert!(expected > 9.0 && expected < 10.0);
    }

    #[test]
    fn test_helpers() {
        assert_eq!(constant_from_tension(2400.0, 2.0), 1200.0);
        assert_eq!(constant_from_tension(2400.0, 0.0), DEFAULT_TENSION_CONSTANT);
        assert!(arc_length(300.0, 1200.0) > 300.0);
        assert_eq!(radius_of_curvature(0.0, 1200.0), 1200.0);
    }

    #[test]
    fn test_huge_span_reports_overflow() {
        let a = Point3D::new(0.0, 0.0, 0.0);
        let b = Point3D::new(10.0, 0.0, 0.0);
        assert!(matches!(
            generate(a, b, 1.0, 60),
            Err(GeometryError::SagOverflow { .. })
        ));
    }
}
