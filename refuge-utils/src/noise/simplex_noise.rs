//! 2D simplex noise.
//!
//! Samples a triangular lattice with a shuffled 256-entry permutation table
//! mirrored into 512 entries so corner hashing never wraps.

use rand::Rng;

use super::{GRADIENT_2D, floor};

#[allow(clippy::unreadable_literal)]
const SQRT_3: f64 = 1.7320508075688772;
/// Skewing factor: `0.5 * (sqrt(3) - 1)`
const F2: f64 = 0.5 * (SQRT_3 - 1.0);
/// Unskewing factor: `(3 - sqrt(3)) / 6`
const G2: f64 = (3.0 - SQRT_3) / 6.0;

/// A seeded 2D simplex noise field.
#[derive(Debug, Clone)]
pub struct SimplexNoise {
    perm: [u8; 512],
    /// Horizontal offset applied to every sample.
    pub xo: f64,
    /// Vertical offset applied to every sample.
    pub zo: f64,
}

impl SimplexNoise {
    /// Builds a noise field from a random source.
    ///
    /// Consumes two doubles for the offsets, then Fisher-Yates shuffles the
    /// permutation table.
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let xo = rng.random::<f64>() * 256.0;
        let zo = rng.random::<f64>() * 256.0;

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate().take(256) {
            *slot = i as u8;
        }
        for i in (1..256).rev() {
            let j = rng.random_range(0..=i);
            perm.swap(i, j);
        }
        perm.copy_within(0..256, 256);

        Self { perm, xo, zo }
    }

    #[inline]
    fn hash(&self, x: i32) -> i32 {
        i32::from(self.perm[(x & 0x1FF) as usize])
    }

    #[inline]
    fn corner(gradient: usize, x: f64, z: f64) -> f64 {
        let t = 0.5 - x * x - z * z;
        if t < 0.0 {
            0.0
        } else {
            let t = t * t;
            let g = GRADIENT_2D[gradient];
            t * t * (g[0] * x + g[1] * z)
        }
    }

    /// Samples the field at `(x, z)`. Values fall roughly in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let x = x + self.xo;
        let z = z + self.zo;

        let s = (x + z) * F2;
        let i = floor(x + s);
        let j = floor(z + s);
        let t = f64::from(i + j) * G2;
        let x0 = x - (f64::from(i) - t);
        let z0 = z - (f64::from(j) - t);

        let (i1, j1) = if x0 > z0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + G2;
        let z1 = z0 - f64::from(j1) + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let z2 = z0 - 1.0 + 2.0 * G2;

        let ii = i & 0xFF;
        let jj = j & 0xFF;
        let g0 = (self.hash(ii + self.hash(jj)) % 12) as usize;
        let g1 = (self.hash(ii + i1 + self.hash(jj + j1)) % 12) as usize;
        let g2 = (self.hash(ii + 1 + self.hash(jj + 1)) % 12) as usize;

        70.0 * (Self::corner(g0, x0, z0) + Self::corner(g1, x1, z1) + Self::corner(g2, x2, z2))
    }
}
