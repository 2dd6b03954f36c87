//! World coordinates.
//!
//! The horizontal plane is `x`/`z` and `y` is elevation. Horizontal points are
//! carried as [`DVec2`] where `.x` is world `x` and `.y` is world `z`.

use std::fmt;

use glam::{DVec2, DVec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A resolved point in the world: horizontal coordinates plus ground elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(DVec3);

impl Position {
    /// Creates a position from its three coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self(DVec3::new(x, y, z))
    }

    /// Places a horizontal point at the given elevation.
    #[must_use]
    pub const fn at_elevation(point: DVec2, elevation: f64) -> Self {
        Self::new(point.x, elevation, point.y)
    }

    /// World `x`.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.0.x
    }

    /// Elevation.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.0.y
    }

    /// World `z`.
    #[must_use]
    pub const fn z(&self) -> f64 {
        self.0.z
    }

    /// The horizontal component as `(x, z)`.
    #[must_use]
    pub const fn horizontal(&self) -> DVec2 {
        DVec2::new(self.0.x, self.0.z)
    }

    /// The raw vector.
    #[must_use]
    pub const fn as_vec3(&self) -> DVec3 {
        self.0
    }

    /// Squared horizontal distance to another position.
    #[must_use]
    pub fn horizontal_distance_squared(&self, other: &Self) -> f64 {
        self.horizontal().distance_squared(other.horizontal())
    }
}

impl From<DVec3> for Position {
    fn from(value: DVec3) -> Self {
        Self(value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.0.x, self.0.y, self.0.z)
    }
}

/// Axis-aligned horizontal rectangle that random samples are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalBounds {
    /// Minimum corner, `(x, z)`.
    pub min: DVec2,
    /// Maximum corner, `(x, z)`.
    pub max: DVec2,
}

impl HorizontalBounds {
    /// Creates bounds from two corners, normalizing their order.
    #[must_use]
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A square of the given half-extent centred on the origin.
    #[must_use]
    pub fn centered(half_extent: f64) -> Self {
        let half = half_extent.abs();
        Self::new(DVec2::splat(-half), DVec2::splat(half))
    }

    /// Whether the horizontal point lies inside (inclusive).
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Whether both corners and the side lengths are finite.
    ///
    /// [`sample`](Self::sample) requires this.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && (self.max - self.min).is_finite()
    }

    /// Draws a uniformly distributed point inside the bounds.
    ///
    /// The bounds must be [finite](Self::is_finite).
    pub fn sample<R: Rng>(&self, rng: &mut R) -> DVec2 {
        let x = if self.max.x > self.min.x {
            rng.random_range(self.min.x..self.max.x)
        } else {
            self.min.x
        };
        let z = if self.max.y > self.min.y {
            rng.random_range(self.min.y..self.max.y)
        } else {
            self.min.y
        };
        DVec2::new(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn horizontal_drops_elevation() {
        let pos = Position::new(1.0, 50.0, -3.0);
        assert_eq!(pos.horizontal(), DVec2::new(1.0, -3.0));
        assert_eq!(Position::at_elevation(DVec2::new(1.0, -3.0), 50.0), pos);
    }

    #[test]
    fn samples_stay_inside_bounds() {
        let bounds = HorizontalBounds::new(DVec2::new(100.0, -20.0), DVec2::new(-100.0, 20.0));
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(bounds.contains(bounds.sample(&mut rng)));
        }
    }

    #[test]
    fn overflowing_bounds_are_not_finite() {
        assert!(HorizontalBounds::centered(1.0e6).is_finite());
        assert!(!HorizontalBounds::centered(f64::MAX).is_finite());
        assert!(!HorizontalBounds::centered(f64::INFINITY).is_finite());
        let nan = HorizontalBounds {
            min: DVec2::ZERO,
            max: DVec2::new(f64::NAN, 1.0),
        };
        assert!(!nan.is_finite());
    }

    #[test]
    fn degenerate_bounds_sample_the_single_point() {
        let bounds = HorizontalBounds::new(DVec2::new(5.0, 5.0), DVec2::new(5.0, 5.0));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(bounds.sample(&mut rng), DVec2::new(5.0, 5.0));
    }
}
