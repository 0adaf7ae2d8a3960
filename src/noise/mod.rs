//! Layered Perlin/"improved" noise machinery consumed by the density
//! operators: a single-octave gradient kernel, an octave accumulator over a
//! shared table, a dual-stack vanilla composition, and the legacy blended
//! sampler used by `OldBlendedNoise`.

mod blended_noise;
mod improved_noise;
mod perlin_noise;
mod vanilla;

pub use blended_noise::{OldBlendedNoiseParams, old_blended_noise};
pub use improved_noise::ImprovedNoise;
pub use perlin_noise::{PerlinDescriptor, wrap};
pub use vanilla::{SECONDARY_SCALE, VanillaDescriptor};
