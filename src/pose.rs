// Copyright Catenary Transit Initiatives
//! Render pose of a tower model: where it stands, which way it faces and how
//! big it is drawn.

use crate::bearing::normalize_degrees;
use crate::config::CableSettings;
use crate::errors::GeometryResult;
use crate::math3d::Vec3;
use crate::models::{ConductorConfig, ModelTransform, Point3D, Tower};
use crate::overrides::resolve_conductor_offset;
use ahash::AHashMap;

/// Models are authored lying on their side.
pub const MODEL_PITCH: f64 = 0.0;
pub const MODEL_ROLL: f64 = 90.0;

/// Euler angles in degrees, in the host renderer's `[pitch, yaw, roll]` order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientationEuler {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl OrientationEuler {
    pub fn to_array(&self) -> [f64; 3] {
        [self.pitch, self.yaw, self.roll]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerPose {
    pub tower_id: String,
    pub position: Point3D,
    pub orientation: OrientationEuler,
    pub scale: [f64; 3],
    /// Model-local translation from the effective transform, metres.
    pub translation: [f64; 3],
    /// Pitch, roll, yaw of the model itself, degrees.
    pub model_rotation: [f64; 3],
}

/// Render yaw from a compass bearing and the manual corrections.
pub fn model_yaw(bearing: f64, deflection: f64, rotation: f64) -> f64 {
    normalize_degrees(360.0 - bearing - deflection - rotation + 90.0)
}

pub fn compose_pose(
    tower: &Tower,
    orientation_deg: f64,
    ground_elevation: f64,
    transform: &ModelTransform,
    settings: &CableSettings,
) -> GeometryResult<TowerPose> {
    let (lng, lat) = tower.position()?;
    let height = tower.effective_height(settings.default_tower_height)?;
    let intrinsic = if settings.intrinsic_model_height > 0.0 {
        settings.intrinsic_model_height
    } else {
        1.0
    };
    let uniform = height / intrinsic * settings.global_scale;

    let position = Point3D::new(lng, lat, ground_elevation + settings.tower_vertical_offset);
    position.ensure_finite("tower pose")?;

    Ok(TowerPose {
        tower_id: tower.id.clone(),
        position,
        orientation: OrientationEuler {
            pitch: MODEL_PITCH,
            yaw: model_yaw(orientation_deg, tower.deflection, tower.rotation),
            roll: MODEL_ROLL,
        },
        scale: [uniform; 3],
        translation: transform.translation,
        model_rotation: transform.rotation,
    })
}

/// Manual offset in effect for every conductor, keyed by conductor id.
pub fn effective_anchor_offsets(
    transform: &ModelTransform,
    conductors: &[ConductorConfig],
) -> AHashMap<String, Vec3> {
    conductors
        .iter()
        .map(|c| (c.id.clone(), resolve_conductor_offset(transform, c).offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GeometryError;
    use crate::models::AxisOffset;

    #[test]
    fn test_yaw_formula() {
        assert_eq!(model_yaw(0.0, 0.0, 0.0), 90.0);
        assert_eq!(model_yaw(90.0, 0.0, 0.0), 0.0);
        assert_eq!(model_yaw(180.0, 10.0, 5.0), 255.0);
        assert_eq!(model_yaw(350.0, 0.0, 0.0), 100.0);
    }

    #[test]
    fn test_pose_position_and_scale() {
        let mut settings = CableSettings::default();
        settings.global_scale = 2.0;
        settings.intrinsic_model_height = 10.0;
        let mut t = Tower::new("t", "1/1", -23.5, -46.6);
        t.height = Some(40.0);
        t.deflection = 15.0;

        let pose = compose_pose(&t, 30.0, 700.0, &ModelTransform::default(), &settings).unwrap();
        assert_eq!(pose.position, Point3D::new(-46.6, -23.5, 730.0));
        assert_eq!(pose.scale, [8.0, 8.0, 8.0]);
        assert_eq!(pose.orientation.to_array(), [0.0, 45.0, 90.0]);
    }

    #[test]
    fn test_default_height_applies() {
        let settings = CableSettings::default();
        let t = Tower::new("t", "1/1", 0.0, 0.0);
        let pose = compose_pose(&t, 0.0, 0.0, &ModelTransform::default(), &settings).unwrap();
        assert_eq!(pose.scale, [30.0, 30.0, 30.0]);
    }

    #[test]
    fn test_bad_height_is_rejected() {
        let settings = CableSettings::default();
        let mut t = Tower::new("t", "1/1", 0.0, 0.0);
        t.overrides.height = Some(f64::INFINITY);
        let err = compose_pose(&t, 0.0, 0.0, &ModelTransform::default(), &settings).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidHeight { .. }));
    }

    #[test]
    fn test_effective_offsets_per_conductor() {
        let mut transform = ModelTransform::default();
        transform.anchor_global_offset = Some(AxisOffset::new(0.0, 0.0, 1.0));
        transform
            .phase_overrides
            .insert("FASE A".to_string(), AxisOffset::new(0.5, 0.0, 0.0));
        let conductors = crate::config::default_conductors();
        let offsets = effective_anchor_offsets(&transform, &conductors);
        assert_eq!(offsets.len(), 14);
        assert_eq!(offsets["FA-1"], Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(offsets["FB-1"], Vec3::new(0.0, 0.0, 1.0));
    }
}
