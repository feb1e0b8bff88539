//! Vector arithmetic.
//!
//! [`Vec2`] is the point type used everywhere in the scene. The free
//! functions operate on n-dimensional slices; mismatched lengths are
//! truncated to the shorter operand.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult};

/// A 2D vector for points, offsets and directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean norm.
    #[must_use]
    pub fn length_sqr(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean norm.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_sqr().sqrt()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Scalar (z component of the) cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotate by `angle` radians around the origin.
    #[must_use]
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Rotate by `angle` radians around `origin`.
    #[must_use]
    pub fn rotate_about(self, angle: f64, origin: Self) -> Self {
        (self - origin).rotate(angle) + origin
    }

    /// Scale relative to `origin`.
    #[must_use]
    pub fn scale_about(self, factor: f64, origin: Self) -> Self {
        (self - origin) * factor + origin
    }

    /// Unit direction for a polar angle given in degrees.
    #[must_use]
    pub fn from_angle_degrees(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin)
    }

    /// Component-wise rounding, used for pixel snapping.
    #[must_use]
    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Vec2> for [f64; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Result of [`cross`]: a scalar in 2D, a vector in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cross {
    /// 2D cross product (signed parallelogram area).
    Scalar(f64),
    /// 3D cross product.
    Vector([f64; 3]),
}

/// n-dimensional addition.
#[must_use]
pub fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// n-dimensional subtraction.
#[must_use]
pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// n-dimensional multiplication by a scalar.
#[must_use]
pub fn mul(a: &[f64], k: f64) -> Vec<f64> {
    a.iter().map(|x| x * k).collect()
}

/// Squared Euclidean norm.
#[must_use]
pub fn length_sqr(a: &[f64]) -> f64 {
    a.iter().map(|x| x * x).sum()
}

/// Euclidean norm.
#[must_use]
pub fn length(a: &[f64]) -> f64 {
    length_sqr(a).sqrt()
}

/// Euclidean distance.
#[must_use]
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    length(&sub(a, b))
}

/// n-dimensional dot product.
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cross product of two 2D or 3D vectors.
///
/// # Errors
///
/// Returns [`CanvasError::UnsupportedDimension`] when `a` has any other
/// dimension, or when `b` is shorter than `a`.
pub fn cross(a: &[f64], b: &[f64]) -> CanvasResult<Cross> {
    match (a, b) {
        ([ax, ay], [bx, by, ..]) => Ok(Cross::Scalar(ax * by - ay * bx)),
        ([ax, ay, az], [bx, by, bz, ..]) => Ok(Cross::Vector([
            ay * bz - az * by,
            az * bx - ax * bz,
            ax * by - ay * bx,
        ])),
        _ => Err(CanvasError::UnsupportedDimension(a.len())),
    }
}
