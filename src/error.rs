//! Debug-mode program validation.
//!
//! The evaluator itself is total: `InputBundle::evaluate` never returns a
//! `Result` and never panics on a well-formed program, because the frame
//! invariants are the host compiler's responsibility, not something this
//! crate checks on every sample. `ProgramError` exists for
//! hosts that want to catch a compiler bug once, up front, via the opt-in
//! [`crate::bundle::InputBundle::validate`] method.

use thiserror::Error;

/// A violated program invariant, surfaced only by `InputBundle::validate`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    /// The program has no frames at all.
    #[error("program has no frames")]
    EmptyProgram,
    /// A frame's `reg_position` falls outside the register file.
    #[error("frame {frame} writes to out-of-bounds register {register}")]
    RegisterOutOfBounds {
        /// Index of the offending frame.
        frame: usize,
        /// The out-of-bounds register slot it names.
        register: usize,
    },
    /// A control-transfer constant names a frame outside the program.
    #[error("frame {frame} targets out-of-bounds stack position {target}")]
    StackTargetOutOfBounds {
        /// Index of the offending frame.
        frame: usize,
        /// The out-of-bounds target it names.
        target: usize,
    },
    /// A frame's `noise_index` falls outside the noise-state table.
    #[error("frame {frame} references out-of-bounds noise state {index}")]
    NoiseIndexOutOfBounds {
        /// Index of the offending frame.
        frame: usize,
        /// The out-of-bounds noise-state index it names.
        index: usize,
    },
}
