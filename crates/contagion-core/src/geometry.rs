//! 2D vector arithmetic and the rectangular field boundary.
//!
//! Movement integrates forces into velocities and positions with
//! [`Vec2`]; transmission compares [`distance_squared`](Vec2::distance_squared)
//! against the squared infection radius so no square root is taken on
//! the hot path.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A 2D vector (position, velocity or force).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Construct from components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Cartesian vector of the given magnitude pointing at `angle` radians.
    pub fn from_polar(magnitude: f64, angle: f64) -> Self {
        Self {
            x: magnitude * angle.cos(),
            y: magnitude * angle.sin(),
        }
    }

    /// Squared Euclidean length.
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared Euclidean distance between two points.
    pub fn distance_squared(self, other: Vec2) -> f64 {
        (self - other).length_squared()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len > f64::EPSILON && len.is_finite() {
            Some(self / len)
        } else {
            None
        }
    }

    /// Whether both components are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle `[lo, hi]` that confines every subject.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower corner (inclusive).
    pub lo: Vec2,
    /// Upper corner (inclusive).
    pub hi: Vec2,
}

impl Bounds {
    /// Construct from the two corners.
    pub const fn new(lo: Vec2, hi: Vec2) -> Self {
        Self { lo, hi }
    }

    /// Whether the corners are finite and `lo < hi` on both axes.
    pub fn is_valid(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite() && self.lo.x < self.hi.x && self.lo.y < self.hi.y
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec2 {
        self.hi - self.lo
    }

    /// Centre point.
    pub fn center(&self) -> Vec2 {
        (self.lo + self.hi) * 0.5
    }

    /// Whether `p` lies inside, boundary included.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.lo.x && p.x <= self.hi.x && p.y >= self.lo.y && p.y <= self.hi.y
    }

    /// Elastic reflection off the walls.
    ///
    /// On each axis where `position` left the rectangle it is clamped to
    /// the wall it crossed and the matching velocity component is turned
    /// to point back inside. Afterwards `self.contains(*position)` holds.
    pub fn reflect(&self, position: &mut Vec2, velocity: &mut Vec2) {
        reflect_axis(&mut position.x, &mut velocity.x, self.lo.x, self.hi.x);
        reflect_axis(&mut position.y, &mut velocity.y, self.lo.y, self.hi.y);
    }
}

fn reflect_axis(p: &mut f64, v: &mut f64, lo: f64, hi: f64) {
    if *p > hi {
        *p = hi;
        *v = -v.abs();
    } else if *p < lo {
        *p = lo;
        *v = v.abs();
    } else if p.is_nan() {
        // A NaN position fails both comparisons; pin it to the wall.
        *p = lo;
        *v = 0.0;
    }
}
