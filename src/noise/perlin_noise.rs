//! Octave accumulator over a shared improved-noise table.

// Noise code uses mathematical single-letter variables (x, y, z, i, j, k)
#![allow(clippy::many_single_char_names)]

use serde::{Deserialize, Serialize};

use crate::math::floor;

use super::ImprovedNoise;

/// Coordinate period used to keep large world coordinates from losing
/// precision in the noise lattice.
const WRAP_PERIOD: f64 = 33_554_432.0; // 2^25

/// Wraps a coordinate into `[0, 2^25)`, preserving periodicity at that scale.
#[inline]
#[must_use]
pub fn wrap(value: f64) -> f64 {
    value - f64::from(floor(value / WRAP_PERIOD)) * WRAP_PERIOD
}

/// A sequence of improved-noise octaves combined with doubling input scale
/// and halving value scale, addressed into a shared octave table.
///
/// `data_position`/`noise_count` index into the evaluator's shared
/// `noise_levels`/`amplitudes` slices rather than owning their octaves —
/// table construction (permutation shuffling, amplitude assignment) is the
/// host compiler's responsibility.
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct PerlinDescriptor {
    /// Number of octaves this descriptor spans.
    pub noise_count: usize,
    /// Base index into the shared octave table.
    pub data_position: usize,
    /// Value-factor applied to the lowest-frequency octave (halved per octave after).
    pub lowest_val_factor: f64,
    /// Input-factor applied to the lowest-frequency octave (doubled per octave after).
    pub lowest_input_factor: f64,
}

impl PerlinDescriptor {
    /// Samples the octave stack at `(x, y, z)` against shared `noise_levels`/`amplitudes` tables.
    #[must_use]
    pub fn get_perlin_val(&self, noise_levels: &[ImprovedNoise], amplitudes: &[f64], x: f64, y: f64, z: f64) -> f64 {
        let mut value = 0.0;
        let mut input_factor = self.lowest_input_factor;
        let mut value_factor = self.lowest_val_factor;

        for i in 0..self.noise_count {
            let index = self.data_position + i;
            let octave = &noise_levels[index];
            if !octave.disabled {
                value += amplitudes[index]
                    * octave.generate(
                        wrap(x * input_factor),
                        wrap(y * input_factor),
                        wrap(z * input_factor),
                        0.0,
                        0.0,
                    )
                    * value_factor;
            }
            input_factor *= 2.0;
            value_factor /= 2.0;
        }

        value
    }

    /// Returns the octave `level` counting from the highest frequency
    /// (reverse order). Used only by `OldBlendedNoise`.
    #[must_use]
    pub fn get_perlin_level<'a>(&self, noise_levels: &'a [ImprovedNoise], level: usize) -> &'a ImprovedNoise {
        &noise_levels[self.data_position + self.noise_count - level - 1]
    }
}
