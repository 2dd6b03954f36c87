//! Noise primitives used to synthesize terrain for the demo world.
//!
//! - [`SimplexNoise`] - 2D simplex noise seeded from any [`rand::Rng`]
//! - [`OctaveNoise`] - fractal sum of simplex octaves

mod octave_noise;
mod simplex_noise;

pub use octave_noise::OctaveNoise;
pub use simplex_noise::SimplexNoise;

/// Gradient directions for 2D simplex corners.
pub(crate) const GRADIENT_2D: [[f64; 2]; 12] = [
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [0.0, 1.0],
    [0.0, -1.0],
];

/// Floors a coordinate to the containing lattice cell.
#[inline]
pub(crate) fn floor(value: f64) -> i32 {
    let truncated = value as i32;
    if value < f64::from(truncated) {
        truncated - 1
    } else {
        truncated
    }
}
