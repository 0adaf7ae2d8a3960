//! Legacy 8+16-octave blended sampler with a clamp branch.

// Noise code uses mathematical single-letter variables (x, y, z, i, j, k)
#![allow(clippy::many_single_char_names)]

use crate::math::lerp;

use super::{ImprovedNoise, VanillaDescriptor, perlin_noise::wrap};

/// Base coordinate multiplier shared by the XZ and Y axes before their
/// respective factors are applied.
const MULTIPLIER_BASE: f64 = 684.412;

/// Parameters for the `OldBlendedNoise` operator.
#[derive(Clone, Copy)]
pub struct OldBlendedNoiseParams {
    /// Vertical smear multiplier.
    pub smear_scale_multiplier: f64,
    /// Horizontal scale factor.
    pub xz_factor: f64,
    /// Vertical scale factor.
    pub y_factor: f64,
    /// Horizontal coordinate multiplier (already includes [`MULTIPLIER_BASE`]).
    pub xz_mult: f64,
    /// Vertical coordinate multiplier (already includes [`MULTIPLIER_BASE`]).
    pub y_mult: f64,
}

impl OldBlendedNoiseParams {
    /// Builds the multiplier fields from the frame's raw `xz_scale`/`y_scale` constants.
    #[must_use]
    pub fn new(smear_scale_multiplier: f64, xz_factor: f64, xz_scale: f64, y_factor: f64, y_scale: f64) -> Self {
        Self {
            smear_scale_multiplier,
            xz_factor,
            y_factor,
            xz_mult: xz_scale * MULTIPLIER_BASE,
            y_mult: y_scale * MULTIPLIER_BASE,
        }
    }
}

/// Evaluates the legacy blended-noise operator at block coordinates.
///
/// `noise_states.secondary` supplies the eight-octave accumulator and
/// `noise_states.primary` supplies both clamp-probe accumulators.
///
/// Both the min and max clamp-probe accumulators below sample the *same*
/// generator with identical arguments — this looks like a copy-paste bug
/// but is the reference behavior and is preserved intentionally.
#[must_use]
pub fn old_blended_noise(
    params: &OldBlendedNoiseParams,
    noise_states: &VanillaDescriptor,
    noise_levels: &[ImprovedNoise],
    x: i32,
    y: i32,
    z: i32,
) -> f64 {
    let block_x_mul = f64::from(x) * params.xz_mult;
    let block_y_mul = f64::from(y) * params.y_mult;
    let block_z_mul = f64::from(z) * params.xz_mult;
    let block_x_fact = block_x_mul / params.xz_factor;
    let block_y_fact = block_y_mul / params.y_factor;
    let block_z_fact = block_z_mul / params.xz_factor;
    let y_smear = params.y_mult * params.smear_scale_multiplier;
    let y_smear_factor = y_smear / params.y_factor;

    let mut noise_acc = 0.0;
    let mut acc = 1.0;
    for i in 0..8 {
        let generator = noise_states.secondary.get_perlin_level(noise_levels, i);
        noise_acc += generator.generate(
            wrap(block_x_fact * acc),
            wrap(block_y_fact * acc),
            wrap(block_z_fact * acc),
            y_smear_factor * acc,
            block_y_fact * acc,
        ) / acc;
        acc /= 2.0;
    }

    let noise_result = (1.0 + (noise_acc / 10.0)) / 2.0;

    let mut min_noise_acc = 0.0;
    let mut max_noise_acc = 0.0;
    acc = 1.0;
    for i in 0..16 {
        let block_x_wrap = wrap(block_x_mul * acc);
        let block_y_wrap = wrap(block_y_mul * acc);
        let block_z_wrap = wrap(block_z_mul * acc);
        let y_smear_adj = y_smear * acc;
        let block_y_adj = block_y_mul * acc;
        let noise_limit = noise_states.primary.get_perlin_level(noise_levels, i);

        if noise_result < 1.0 {
            min_noise_acc +=
                noise_limit.generate(block_x_wrap, block_y_wrap, block_z_wrap, y_smear_adj, block_y_adj) / acc;
        }
        if noise_result > 0.0 {
            max_noise_acc +=
                noise_limit.generate(block_x_wrap, block_y_wrap, block_z_wrap, y_smear_adj, block_y_adj) / acc;
        }
        acc /= 2.0;
    }

    if noise_result < 0.0 {
        min_noise_acc / f64::from(1_i32 << 16)
    } else if noise_result > 1.0 {
        max_noise_acc / f64::from(1_i32 << 16)
    } else {
        lerp(noise_result, min_noise_acc / 512.0, max_noise_acc / 512.0) / 128.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::PerlinDescriptor;

    fn identity_permutation() -> [u8; 256] {
        let mut p = [0u8; 256];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = i as u8;
        }
        p
    }

    fn descriptor(data_position: usize) -> VanillaDescriptor {
        VanillaDescriptor {
            primary: PerlinDescriptor {
                noise_count: 16,
                data_position,
                lowest_val_factor: 1.0,
                lowest_input_factor: 1.0,
            },
            secondary: PerlinDescriptor {
                noise_count: 8,
                data_position: data_position + 16,
                lowest_val_factor: 1.0,
                lowest_input_factor: 1.0,
            },
            val_factor: 1.0,
            val_max: 1.0,
        }
    }

    fn levels() -> Vec<ImprovedNoise> {
        (0..24)
            .map(|i| {
                ImprovedNoise::new(
                    f64::from(i),
                    f64::from(i) * 2.0,
                    f64::from(i) * 3.0,
                    identity_permutation(),
                    false,
                )
            })
            .collect()
    }

    #[test]
    fn deterministic() {
        let params = OldBlendedNoiseParams::new(8.0, 80.0, 1.0, 160.0, 1.0);
        let states = descriptor(0);
        let levels = levels();
        let a = old_blended_noise(&params, &states, &levels, 0, 64, 0);
        let b = old_blended_noise(&params, &states, &levels, 0, 64, 0);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn varies_with_position() {
        let params = OldBlendedNoiseParams::new(8.0, 80.0, 1.0, 160.0, 1.0);
        let states = descriptor(0);
        let levels = levels();
        let a = old_blended_noise(&params, &states, &levels, 0, 64, 0);
        let b = old_blended_noise(&params, &states, &levels, 100, 64, 100);
        assert_ne!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn result_is_finite() {
        let params = OldBlendedNoiseParams::new(8.0, 80.0, 1.0, 160.0, 1.0);
        let states = descriptor(0);
        let levels = levels();
        for y in [-64, 0, 64, 128, 320] {
            let v = old_blended_noise(&params, &states, &levels, 0, y, 0);
            assert!(v.is_finite());
        }
    }
}
