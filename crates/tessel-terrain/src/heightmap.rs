//! Multi-octave fractal Brownian motion (fBm) over simplex noise.

use noise::{NoiseFn, Simplex};

/// Octave settings for [`HeightmapSampler`].
#[derive(Clone, Debug, PartialEq)]
pub struct HeightmapParams {
    pub seed: u64,
    /// Number of octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first octave, per block.
    pub base_frequency: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 23456,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.01,
        }
    }
}

/// Samples normalized fBm noise over a 2D plane.
pub struct HeightmapSampler {
    noise: Simplex,
    params: HeightmapParams,
    /// Sum of all octave amplitudes, used to normalize into `[-1, 1]`.
    norm: f64,
}

impl HeightmapSampler {
    pub fn new(params: HeightmapParams) -> Self {
        // Simplex takes a 32-bit seed; fold the high half in so both halves matter.
        let noise = Simplex::new((params.seed ^ (params.seed >> 32)) as u32);
        let norm = Self::amplitude_sum(&params);
        Self {
            noise,
            params,
            norm,
        }
    }

    /// Raw fBm value. The first octave has amplitude 1.
    pub fn sample_raw(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = 1.0;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }

    /// fBm value scaled into `[-1, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        if self.norm <= 0.0 {
            return 0.0;
        }
        (self.sample_raw(x, y) / self.norm).clamp(-1.0, 1.0)
    }

    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }

    fn amplitude_sum(params: &HeightmapParams) -> f64 {
        let mut sum = 0.0;
        let mut amp = 1.0;
        for _ in 0..params.octaves {
            sum += amp;
            amp *= params.persistence;
        }
        sum
    }
}
