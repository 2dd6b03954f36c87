//! Fractal (fBm) noise built from stacked simplex octaves.

use rand::Rng;

use super::SimplexNoise;

/// Sum of simplex octaves, each at double the frequency and `persistence`
/// times the amplitude of the previous one. Output is normalized to `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct OctaveNoise {
    octaves: Vec<SimplexNoise>,
    base_frequency: f64,
    persistence: f64,
}

impl OctaveNoise {
    /// Creates `octaves` independent layers from the given random source.
    pub fn new<R: Rng>(
        rng: &mut R,
        octaves: usize,
        base_frequency: f64,
        persistence: f64,
    ) -> Self {
        let octaves = (0..octaves.max(1)).map(|_| SimplexNoise::new(rng)).collect();
        Self {
            octaves,
            base_frequency,
            persistence,
        }
    }

    /// Samples the fractal field at `(x, z)`.
    #[must_use]
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let mut frequency = self.base_frequency;
        let mut amplitude = 1.0;
        let mut total = 0.0;
        let mut norm = 0.0;

        for octave in &self.octaves {
            total += octave.sample(x * frequency, z * frequency) * amplitude;
            norm += amplitude;
            frequency *= 2.0;
            amplitude *= self.persistence;
        }

        (total / norm).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn output_is_normalized() {
        let noise = OctaveNoise::new(&mut StdRng::seed_from_u64(3), 4, 0.01, 0.5);
        for i in 0..200 {
            let v = noise.sample(f64::from(i) * 11.0, f64::from(i) * 4.0);
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn zero_octaves_still_samples() {
        let noise = OctaveNoise::new(&mut StdRng::seed_from_u64(3), 0, 0.01, 0.5);
        assert!(noise.sample(10.0, 10.0).is_finite());
    }
}
