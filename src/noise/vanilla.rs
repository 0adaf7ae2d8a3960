//! Dual-Perlin composition used by most density operators.

use serde::{Deserialize, Serialize};

use super::{ImprovedNoise, PerlinDescriptor};

/// Scale ratio between a vanilla-noise descriptor's primary and secondary octave stacks.
pub const SECONDARY_SCALE: f64 = 1.018_126_888_217_522_7;

/// Two [`PerlinDescriptor`]s sampled at a fixed relative scale, combined and
/// scaled by a fixed factor.
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct VanillaDescriptor {
    /// Primary octave stack.
    pub primary: PerlinDescriptor,
    /// Secondary octave stack, sampled at [`SECONDARY_SCALE`].
    pub secondary: PerlinDescriptor,
    /// Scalar applied to the combined sample.
    pub val_factor: f64,
    /// Maximum magnitude this descriptor can produce (host-computed, carried through).
    pub val_max: f64,
}

impl VanillaDescriptor {
    /// `get_vanilla_val`: samples both octave stacks and combines them.
    #[must_use]
    pub fn get_vanilla_val(&self, noise_levels: &[ImprovedNoise], amplitudes: &[f64], x: f64, y: f64, z: f64) -> f64 {
        let primary = self.primary.get_perlin_val(noise_levels, amplitudes, x, y, z);
        let secondary = self.secondary.get_perlin_val(
            noise_levels,
            amplitudes,
            x * SECONDARY_SCALE,
            y * SECONDARY_SCALE,
            z * SECONDARY_SCALE,
        );
        (primary + secondary) * self.val_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_permutation() -> [u8; 256] {
        let mut p = [0u8; 256];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = i as u8;
        }
        p
    }

    #[test]
    fn combines_both_stacks() {
        let levels = vec![
            ImprovedNoise::new(0.0, 0.0, 0.0, identity_permutation(), false),
            ImprovedNoise::new(10.0, 20.0, 30.0, identity_permutation(), false),
        ];
        let amps = vec![1.0, 1.0];
        let descriptor = VanillaDescriptor {
            primary: PerlinDescriptor {
                noise_count: 1,
                data_position: 0,
                lowest_val_factor: 1.0,
                lowest_input_factor: 1.0,
            },
            secondary: PerlinDescriptor {
                noise_count: 1,
                data_position: 1,
                lowest_val_factor: 1.0,
                lowest_input_factor: 1.0,
            },
            val_factor: 0.5,
            val_max: 10.0,
        };
        let value = descriptor.get_vanilla_val(&levels, &amps, 1.0, 2.0, 3.0);
        assert!(value.is_finite());
    }
}
