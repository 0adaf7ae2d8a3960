//! The host-compiled inputs one evaluator binds to, and the `evaluate`/
//! `validate` entry points built on top of them.

use serde::{Deserialize, Serialize};

use crate::error::ProgramError;
use crate::noise::{ImprovedNoise, VanillaDescriptor};
use crate::vm::frame::{OpCode, StackFrame};
use crate::vm::run;
use crate::vm::state::REGISTER_CAPACITY;

/// Everything one evaluator needs to answer `evaluate(x, y, z)`: a compiled
/// program, its constant pool, and the shared noise tables it samples from.
///
/// Binding a bundle does not allocate or mutate any of these tables — they
/// are handed in whole by the host compiler and treated as immutable for the
/// bundle's lifetime.
#[derive(Clone, Serialize, Deserialize)]
pub struct InputBundle {
    /// The compiled program, one frame per step.
    pub program: Vec<StackFrame>,
    /// Shared constant pool, indexed by `StackFrame::constants_index` and
    /// `StackFrame::arg_positions` (for `ArgSource::Constant` arguments).
    pub constants: Vec<f64>,
    /// Vanilla-noise descriptors, indexed by `StackFrame::noise_index`.
    pub noise_states: Vec<VanillaDescriptor>,
    /// Shared improved-noise octave table.
    pub noise_levels: Vec<ImprovedNoise>,
    /// Per-octave amplitude, parallel to `noise_levels`.
    pub amplitudes: Vec<f64>,
}

impl InputBundle {
    /// Binds a compiled program and its shared tables into an evaluator,
    /// logging the batch's shape at `debug` level.
    ///
    /// This is a thin, non-validating constructor — it exists so a host can
    /// log a bundle's size once at bind time instead of at every sample.
    /// Call [`Self::validate`] separately if the program's provenance isn't
    /// trusted.
    #[must_use]
    pub fn bind(
        program: Vec<StackFrame>,
        constants: Vec<f64>,
        noise_states: Vec<VanillaDescriptor>,
        noise_levels: Vec<ImprovedNoise>,
        amplitudes: Vec<f64>,
    ) -> Self {
        log::debug!(
            "binding density program: {} frames, {} constants, {} noise states, {} noise levels",
            program.len(),
            constants.len(),
            noise_states.len(),
            noise_levels.len(),
        );
        Self {
            program,
            constants,
            noise_states,
            noise_levels,
            amplitudes,
        }
    }

    /// Evaluates the bound program at block coordinates `(x, y, z)`.
    ///
    /// Total: returns a finite-or-not `f64` for any program that satisfies
    /// the frame invariants the host compiler is responsible for. Never
    /// allocates and never panics on a well-formed program — a malformed one
    /// is the host compiler's bug, not something this call checks (see
    /// [`Self::validate`]).
    #[must_use]
    pub fn evaluate(&self, x: i32, y: i32, z: i32) -> f64 {
        run(self, x, y, z)
    }

    /// Checks the frame invariants `evaluate` assumes but never re-checks.
    ///
    /// Intended to run once per compiled program, not per sample — call it
    /// after binding a new bundle from an untrusted or newly-compiled
    /// source, not from inside a sampling loop.
    pub fn validate(&self) -> Result<(), ProgramError> {
        match self.validate_inner() {
            Ok(()) => Ok(()),
            Err(err) => {
                log::warn!("density program failed validation: {err}");
                Err(err)
            }
        }
    }

    fn validate_inner(&self) -> Result<(), ProgramError> {
        if self.program.is_empty() {
            return Err(ProgramError::EmptyProgram);
        }

        for (index, frame) in self.program.iter().enumerate() {
            if frame.reg_position >= REGISTER_CAPACITY {
                return Err(ProgramError::RegisterOutOfBounds {
                    frame: index,
                    register: frame.reg_position,
                });
            }
            if frame.noise_index >= self.noise_states.len() && !self.noise_states.is_empty() {
                return Err(ProgramError::NoiseIndexOutOfBounds {
                    frame: index,
                    index: frame.noise_index,
                });
            }
            self.validate_stack_targets(index, frame)?;
        }

        Ok(())
    }

    /// Bounds-checks the frame indices a control-transfer operator's
    /// constants name, without running the VM. `Min`/`Max`/`RangeChoice`
    /// targets are plain constant lookups; `Spline` Primary frames pack
    /// every reachable point-frame index into the constant pool up front,
    /// so every branch can be checked even though only one is taken at
    /// runtime for a given coordinate.
    fn validate_stack_targets(&self, index: usize, frame: &StackFrame) -> Result<(), ProgramError> {
        let len = self.program.len();
        let check = |target: f64| -> Result<(), ProgramError> {
            let target = target as usize;
            if target >= len {
                return Err(ProgramError::StackTargetOutOfBounds { frame: index, target });
            }
            Ok(())
        };
        let constant = |k: usize| self.constants.get(frame.constants_index + k).copied();

        match OpCode::from_raw(frame.fn_type) {
            Some(OpCode::Min | OpCode::Max) => {
                if constant(0) == Some(0.0) {
                    if let Some(target) = constant(2) {
                        check(target)?;
                    }
                }
            }
            Some(OpCode::RangeChoice) => match constant(0) {
                Some(0.0) => {
                    if let Some(target) = constant(4) {
                        check(target)?;
                    }
                    if let Some(target) = constant(5) {
                        check(target)?;
                    }
                }
                Some(_) => {
                    if let Some(target) = constant(1) {
                        check(target)?;
                    }
                }
                None => {}
            },
            Some(OpCode::Spline) if constant(0) == Some(0.0) => {
                if let Some(point_count_raw) = constant(1) {
                    let point_count = point_count_raw as usize;
                    if let Some(first) = constant(point_count * 2 + 3) {
                        check(first)?;
                    }
                    if let Some(last) = constant(point_count * 3 + 2) {
                        check(last)?;
                    }
                    for i in 0..point_count.saturating_sub(1) {
                        if let Some(interior) = constant(point_count * 2 + 4 + i) {
                            check(interior)?;
                        }
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::frame::{ArgSource, OpCode};

    fn constant_frame(value_index: usize, reg: usize) -> StackFrame {
        StackFrame {
            fn_type: OpCode::Add as u8,
            reg_position: reg,
            arg_types: [ArgSource::Constant, ArgSource::Constant, ArgSource::Constant],
            arg_positions: [value_index, value_index, value_index],
            constants_index: 0,
            noise_index: 0,
        }
    }

    #[test]
    fn empty_program_fails_validation() {
        let bundle = InputBundle {
            program: Vec::new(),
            constants: Vec::new(),
            noise_states: Vec::new(),
            noise_levels: Vec::new(),
            amplitudes: Vec::new(),
        };
        assert_eq!(bundle.validate(), Err(ProgramError::EmptyProgram));
    }

    #[test]
    fn out_of_bounds_register_fails_validation() {
        let mut frame = constant_frame(0, 0);
        frame.reg_position = REGISTER_CAPACITY;
        let bundle = InputBundle {
            program: vec![frame],
            constants: vec![1.0],
            noise_states: Vec::new(),
            noise_levels: Vec::new(),
            amplitudes: Vec::new(),
        };
        assert_eq!(
            bundle.validate(),
            Err(ProgramError::RegisterOutOfBounds { frame: 0, register: REGISTER_CAPACITY })
        );
    }

    #[test]
    fn single_add_frame_sums_itself() {
        let bundle = InputBundle {
            program: vec![constant_frame(0, 0)],
            constants: vec![2.5],
            noise_states: Vec::new(),
            noise_levels: Vec::new(),
            amplitudes: Vec::new(),
        };
        assert!(bundle.validate().is_ok());
        assert!((bundle.evaluate(0, 0, 0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn min_short_circuit_target_out_of_bounds_fails_validation() {
        // Only one frame in the program, but the Min frame's short-circuit
        // target (constant 2) names frame index 5, which does not exist.
        let frame = StackFrame {
            fn_type: OpCode::Min as u8,
            reg_position: 0,
            arg_types: [ArgSource::Constant, ArgSource::Constant, ArgSource::Constant],
            arg_positions: [3, 0, 0],
            constants_index: 0,
            noise_index: 0,
        };
        let bundle = InputBundle {
            program: vec![frame],
            constants: vec![0.0, 10.0, 5.0, 2.0],
            noise_states: Vec::new(),
            noise_levels: Vec::new(),
            amplitudes: Vec::new(),
        };
        assert_eq!(
            bundle.validate(),
            Err(ProgramError::StackTargetOutOfBounds { frame: 0, target: 5 })
        );
    }

    #[test]
    fn bind_logs_and_returns_equivalent_bundle() {
        let bundle = InputBundle::bind(vec![constant_frame(0, 0)], vec![2.5], Vec::new(), Vec::new(), Vec::new());
        assert!((bundle.evaluate(0, 0, 0) - 5.0).abs() < f64::EPSILON);
    }
}
