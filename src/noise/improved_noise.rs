//! Improved ("Perlin") noise kernel: a single 256-entry permutation
//! gradient-noise octave with optional Y fade.

// Noise code uses mathematical single-letter variables (x, y, z, i, j, k)
#![allow(clippy::many_single_char_names)]

use serde::{Deserialize, Serialize};

use crate::math::{floor, lerp3, smoothstep};

/// Gradient table used for hashing lattice corners to a direction.
///
/// The last four entries duplicate earlier ones — a legacy quirk of the
/// reference generator that must be preserved bit-for-bit.
pub static GRADIENT: [[i32; 3]; 16] = [
    [1, 1, 0],
    [-1, 1, 0],
    [1, -1, 0],
    [-1, -1, 0],
    [1, 0, 1],
    [-1, 0, 1],
    [1, 0, -1],
    [-1, 0, -1],
    [0, 1, 1],
    [0, -1, 1],
    [0, 1, -1],
    [0, -1, -1],
    [1, 1, 0],
    [0, -1, 1],
    [-1, 1, 0],
    [0, -1, -1],
];

#[inline]
fn dot(gradient: [i32; 3], x: f64, y: f64, z: f64) -> f64 {
    f64::from(gradient[0]) * x + f64::from(gradient[1]) * y + f64::from(gradient[2]) * z
}

/// A single octave of gradient noise.
///
/// The permutation table and coordinate offsets are supplied by the host
/// compiler at bind time; this type performs no random construction of its
/// own — building a fresh table here would allocate and would drift from
/// whatever seeding scheme the host uses upstream of this evaluator.
/// `serde` has no built-in impl for `[u8; 256]`; round-trip it through a slice.
mod permutation_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(table: &[u8; 256], serializer: S) -> Result<S::Ok, S::Error> {
        table.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 256], D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| serde::de::Error::invalid_length(v.len(), &"256 bytes"))
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ImprovedNoise {
    /// 256-entry permutation table, interpreted unsigned.
    #[serde(with = "permutation_serde")]
    permutation: [u8; 256],
    /// X offset for this instance.
    pub x_offset: f64,
    /// Y offset for this instance.
    pub y_offset: f64,
    /// Z offset for this instance.
    pub z_offset: f64,
    /// When set, this octave contributes nothing to its parent [`super::PerlinDescriptor`].
    pub disabled: bool,
}

impl ImprovedNoise {
    /// Builds an octave from externally supplied offsets and permutation table.
    #[must_use]
    pub fn new(x_offset: f64, y_offset: f64, z_offset: f64, permutation: [u8; 256], disabled: bool) -> Self {
        Self {
            permutation,
            x_offset,
            y_offset,
            z_offset,
            disabled,
        }
    }

    #[inline]
    fn p(&self, index: i32) -> i32 {
        i32::from(self.permutation[(index & 255) as usize])
    }

    #[inline]
    fn grad_dot(grad_index: i32, x: f64, y: f64, z: f64) -> f64 {
        dot(GRADIENT[(grad_index & 15) as usize], x, y, z)
    }

    /// Samples this octave at `(x, y, z)`.
    ///
    /// `val1`/`val2` select the Y-fade used for vertical smearing; passing
    /// `(0.0, 0.0)` disables the fade and samples plain 3D gradient noise.
    #[must_use]
    pub fn generate(&self, x: f64, y: f64, z: f64, val1: f64, val2: f64) -> f64 {
        let d = x + self.x_offset;
        let e = y + self.y_offset;
        let f = z + self.z_offset;

        let i = floor(d);
        let j = floor(e);
        let k = floor(f);

        let delta_x = d - f64::from(i);
        let delta_y = e - f64::from(j);
        let delta_z = f - f64::from(k);

        let y_offset = if val1 == 0.0 {
            delta_y
        } else {
            let v = if val2 >= 0.0 && val2 < delta_y { val2 } else { delta_y };
            delta_y - val1 * f64::from(floor(v / val1 + f64::from(1.0e-7_f32)))
        };

        self.sample_and_lerp(i, j, k, delta_x, y_offset, delta_z, delta_y)
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    fn sample_and_lerp(
        &self,
        grid_x: i32,
        grid_y: i32,
        grid_z: i32,
        delta_x: f64,
        weird_delta_y: f64,
        delta_z: f64,
        delta_y: f64,
    ) -> f64 {
        let i = self.p(grid_x);
        let j = self.p(grid_x + 1);
        let k = self.p(i + grid_y);
        let l = self.p(i + grid_y + 1);
        let m = self.p(j + grid_y);
        let n = self.p(j + grid_y + 1);

        let d = Self::grad_dot(self.p(k + grid_z), delta_x, weird_delta_y, delta_z);
        let e = Self::grad_dot(self.p(m + grid_z), delta_x - 1.0, weird_delta_y, delta_z);
        let f = Self::grad_dot(self.p(l + grid_z), delta_x, weird_delta_y - 1.0, delta_z);
        let g = Self::grad_dot(self.p(n + grid_z), delta_x - 1.0, weird_delta_y - 1.0, delta_z);
        let h = Self::grad_dot(self.p(k + grid_z + 1), delta_x, weird_delta_y, delta_z - 1.0);
        let o = Self::grad_dot(self.p(m + grid_z + 1), delta_x - 1.0, weird_delta_y, delta_z - 1.0);
        let p = Self::grad_dot(self.p(l + grid_z + 1), delta_x, weird_delta_y - 1.0, delta_z - 1.0);
        let q = Self::grad_dot(
            self.p(n + grid_z + 1),
            delta_x - 1.0,
            weird_delta_y - 1.0,
            delta_z - 1.0,
        );

        let r = smoothstep(delta_x);
        let s = smoothstep(delta_y);
        let t = smoothstep(delta_z);

        lerp3(r, s, t, d, e, f, g, h, o, p, q)
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
    fn deterministic_for_same_table() {
        let a = ImprovedNoise::new(1.0, 2.0, 3.0, identity_permutation(), false);
        let b = ImprovedNoise::new(1.0, 2.0, 3.0, identity_permutation(), false);
        assert_eq!(
            a.generate(0.5, 0.5, 0.5, 0.0, 0.0).to_bits(),
            b.generate(0.5, 0.5, 0.5, 0.0, 0.0).to_bits()
        );
    }

    #[test]
    fn value_in_expected_range() {
        let noise = ImprovedNoise::new(12.3, 45.6, 78.9, identity_permutation(), false);
        for x in 0..10 {
            for y in 0..10 {
                for z in 0..10 {
                    let v = noise.generate(f64::from(x) * 0.1, f64::from(y) * 0.1, f64::from(z) * 0.1, 0.0, 0.0);
                    assert!((-1.5..=1.5).contains(&v), "value out of range: {v}");
                }
            }
        }
    }

    #[test]
    fn y_fade_changes_result() {
        let noise = ImprovedNoise::new(1.0, 2.0, 3.0, identity_permutation(), false);
        let plain = noise.generate(0.3, 0.6, 0.9, 0.0, 0.0);
        let faded = noise.generate(0.3, 0.6, 0.9, 4.0, 0.2);
        assert_ne!(plain.to_bits(), faded.to_bits());
    }
}
