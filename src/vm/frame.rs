//! Program representation: the linear sequence of [`StackFrame`]s a
//! compiled density function is lowered into.

use serde::{Deserialize, Serialize};

/// Where a frame's logical argument comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ArgSource {
    /// The argument is a literal in the constant pool.
    Constant = 0,
    /// The argument is a value already sitting in the register file.
    Function = 1,
}

/// The 28 operator variants a [`StackFrame`] can select.
///
/// Unknown `fn_type` bytes decode to `None` rather than panicking — the VM
/// treats a frame it cannot decode as yielding `0.0`, matching the
/// reference generator's behavior for out-of-range operator IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    /// a + b
    Add = 0,
    /// a * b
    Mul = 1,
    /// short-circuiting minimum
    Min = 2,
    /// short-circuiting maximum
    Max = 3,
    /// absolute value
    Abs = 4,
    /// a²
    Square = 5,
    /// a³
    Cube = 6,
    /// a if a > 0 else a / 2
    HalfNegative = 7,
    /// a if a > 0 else a / 4
    QuarterNegative = 8,
    /// clamp to [-1, 1] then cubic-map
    Squeeze = 9,
    /// clamp to [min, max]
    Clamp = 10,
    /// clamped linear map of Y
    YClampedGradient = 11,
    /// branch on whether input is within a range
    RangeChoice = 12,
    /// vanilla-noise sample at scaled coordinates
    Noise = 13,
    /// vanilla-noise sample at stack-shifted coordinates
    ShiftedNoise = 14,
    /// reentrant cubic-spline evaluation
    Spline = 15,
    /// spaghetti/noodle rarity-scaled sampler
    WeirdScaledSampler = 16,
    /// identity pass (caching is a host responsibility here)
    Interpolated = 17,
    /// identity pass of stack argument 0
    BlendDensity = 18,
    /// constant 0.0
    BlendOffset = 19,
    /// constant 1.0
    BlendAlpha = 20,
    /// identity pass (caching is a host responsibility here)
    CacheOnce = 21,
    /// identity pass (caching is a host responsibility here)
    FlatCache = 22,
    /// identity pass (caching is a host responsibility here)
    Cache2D = 23,
    /// shift sampler for the X axis
    ShiftA = 24,
    /// shift sampler for the Z axis
    ShiftB = 25,
    /// legacy blended terrain-density sampler
    OldBlendedNoise = 26,
    /// stub: constant 1.0
    EndIslands = 27,
}

impl OpCode {
    /// Decodes a raw operator id, returning `None` for ids outside `0..=27`.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::Add,
            1 => Self::Mul,
            2 => Self::Min,
            3 => Self::Max,
            4 => Self::Abs,
            5 => Self::Square,
            6 => Self::Cube,
            7 => Self::HalfNegative,
            8 => Self::QuarterNegative,
            9 => Self::Squeeze,
            10 => Self::Clamp,
            11 => Self::YClampedGradient,
            12 => Self::RangeChoice,
            13 => Self::Noise,
            14 => Self::ShiftedNoise,
            15 => Self::Spline,
            16 => Self::WeirdScaledSampler,
            17 => Self::Interpolated,
            18 => Self::BlendDensity,
            19 => Self::BlendOffset,
            20 => Self::BlendAlpha,
            21 => Self::CacheOnce,
            22 => Self::FlatCache,
            23 => Self::Cache2D,
            24 => Self::ShiftA,
            25 => Self::ShiftB,
            26 => Self::OldBlendedNoise,
            27 => Self::EndIslands,
            _ => return None,
        })
    }
}

/// One executable step in the linear program.
///
/// `constants_index` is distinct from `arg_positions`: the former is the
/// base offset for this frame's *operator-specific* constants (bounds,
/// scales, branch targets), the latter is where each of up to three logical
/// arguments is sourced from (constant pool or register file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackFrame {
    /// Which operator this frame invokes.
    pub fn_type: u8,
    /// Register slot this frame's result is written to.
    pub reg_position: usize,
    /// Source table for each of up to three logical arguments.
    pub arg_types: [ArgSource; 3],
    /// Source index within the chosen table, per argument.
    pub arg_positions: [usize; 3],
    /// Base offset into the constant pool for this frame's own constants.
    pub constants_index: usize,
    /// Index into the noise-state table, for noise-consuming operators.
    pub noise_index: usize,
}
