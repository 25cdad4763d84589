// Copyright Catenary Transit Initiatives
// ===========================================================================
// Small 3D helpers for the tower-local frame
// ===========================================================================
//
// Local frame: x = right of the line axis, y = forward, z = up.
// After the heading rotation x maps to east and y to north (metres).

use std::ops::{Add, Mul, Neg, Sub};

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Arithmetic mean of a set of points, `None` when empty.
    pub fn centroid<'a, I>(points: I) -> Option<Vec3>
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut sum = Vec3::ZERO;
        let mut count = 0usize;
        for p in points {
            sum = sum + *p;
            count += 1;
        }
        if count == 0 {
            None
        } else {
            Some(sum * (1.0 / count as f64))
        }
    }

    /// Rotation about the x axis (pitch), degrees.
    pub fn rotate_x(self, degrees: f64) -> Vec3 {
        if degrees == 0.0 {
            return self;
        }
        let (s, c) = degrees.to_radians().sin_cos();
        Vec3::new(self.x, self.y * c - self.z * s, self.y * s + self.z * c)
    }

    /// Rotation about the y axis (roll), degrees.
    pub fn rotate_y(self, degrees: f64) -> Vec3 {
        if degrees == 0.0 {
            return self;
        }
        let (s, c) = degrees.to_radians().sin_cos();
        Vec3::new(self.x * c + self.z * s, self.y, -self.x * s + self.z * c)
    }

    /// Clockwise rotation about the up axis by a compass heading, degrees.
    /// The result's x is east and y is north.
    pub fn rotate_heading(self, degrees: f64) -> Vec3 {
        if degrees == 0.0 {
            return self;
        }
        let (s, c) = degrees.to_radians().sin_cos();
        Vec3::new(self.x * c + self.y * s, self.y * c - self.x * s, self.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Pitch, roll and heading applied in that order.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rotation {
    pub pitch: f64,
    pub roll: f64,
    pub heading: f64,
}

impl Rotation {
    pub fn new(pitch: f64, roll: f64, heading: f64) -> Self {
        Self {
            pitch,
            roll,
            heading,
        }
    }

    pub fn apply(&self, v: Vec3) -> Vec3 {
        v.rotate_x(self.pitch)
            .rotate_y(self.roll)
            .rotate_heading(self.heading)
    }
}
