//! The stack-frame virtual machine: program/frame representation, the
//! per-sample evaluation state, and the operator dispatch table.

pub mod frame;
mod operators;
pub mod state;

use crate::bundle::InputBundle;
use frame::OpCode;
use state::EvalState;

/// Steps the bound program to completion at `(x, y, z)` and returns the
/// final frame's result register — the overall density value a compiled
/// program evaluates to.
///
/// Every step applies the same four-part protocol: dispatch the current
/// frame's operator (which may rewrite `stack_offset` and/or set
/// `skip_result` for control-transfer operators), conditionally write the
/// return value to the current frame's register, then unconditionally
/// advance `stack_offset` by one. Control-transfer operators rely on the
/// host compiler having pre-baked their jump targets one frame short of the
/// intended destination so that this final, unconditional increment lands
/// exactly where they mean it to.
#[must_use]
pub fn run(bundle: &InputBundle, x: i32, y: i32, z: i32) -> f64 {
    let program = &bundle.program;
    if program.is_empty() {
        return 0.0;
    }

    let mut state = EvalState::new(x, y, z);

    while state.stack_offset() < program.len() {
        state.reset_skip_result();
        let frame = &program[state.stack_offset()];
        let value = match OpCode::from_raw(frame.fn_type) {
            Some(op) => operators::dispatch(op, &mut state, program, bundle),
            None => 0.0,
        };
        if !state.skip_result() {
            state.write_current_register(program, value);
        }
        state.set_stack_offset(state.stack_offset() + 1);
    }

    state.register_at(program, program.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{ImprovedNoise, PerlinDescriptor, VanillaDescriptor};
    use crate::vm::frame::{ArgSource, StackFrame};

    fn frame(fn_type: OpCode, reg: usize, arg_types: [ArgSource; 3], arg_positions: [usize; 3], constants_index: usize) -> StackFrame {
        StackFrame {
            fn_type: fn_type as u8,
            reg_position: reg,
            arg_types,
            arg_positions,
            constants_index,
            noise_index: 0,
        }
    }

    #[test]
    fn single_constant_add() {
        let bundle = InputBundle {
            program: vec![frame(
                OpCode::Add,
                0,
                [ArgSource::Constant, ArgSource::Constant, ArgSource::Constant],
                [0, 1, 0],
                0,
            )],
            constants: vec![2.0, 3.0],
            noise_states: Vec::new(),
            noise_levels: Vec::new(),
            amplitudes: Vec::new(),
        };
        assert!((run(&bundle, 0, 0, 0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn min_short_circuits_past_target_frame() {
        // Frame 0 (Min): tested value 5.0 <= bound 10.0, so it fakes frame 1's
        // register with 5.0 and the VM never dispatches frame 1 at all.
        // Frame 1 (Add): never executed; only its register slot is used.
        // Frame 2 (Square): reads frame 1's (faked) register and squares it.
        let program = vec![
            frame(
                OpCode::Min,
                0,
                [ArgSource::Constant, ArgSource::Constant, ArgSource::Constant],
                [3, 0, 0],
                0,
            ),
            frame(
                OpCode::Add,
                1,
                [ArgSource::Constant, ArgSource::Constant, ArgSource::Constant],
                [0, 0, 0],
                0,
            ),
            frame(
                OpCode::Square,
                2,
                [ArgSource::Function, ArgSource::Function, ArgSource::Function],
                [1, 0, 0],
                0,
            ),
        ];
        // constants_index 0 holds: [mode=0, bound=10.0, target=1], constant 3 is the tested value.
        let bundle = InputBundle {
            program,
            constants: vec![0.0, 10.0, 1.0, 5.0],
            noise_states: Vec::new(),
            noise_levels: Vec::new(),
            amplitudes: Vec::new(),
        };
        assert!((run(&bundle, 0, 0, 0) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn vanilla_noise_sample_is_deterministic() {
        fn identity_permutation() -> [u8; 256] {
            let mut p = [0u8; 256];
            for (i, slot) in p.iter_mut().enumerate() {
                *slot = i as u8;
            }
            p
        }

        let levels = vec![
            ImprovedNoise::new(0.0, 0.0, 0.0, identity_permutation(), false),
            ImprovedNoise::new(5.0, 5.0, 5.0, identity_permutation(), false),
        ];
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
            val_factor: 1.0,
            val_max: 1.0,
        };
        let program = vec![frame(
            OpCode::Noise,
            0,
            [ArgSource::Constant, ArgSource::Constant, ArgSource::Constant],
            [0, 0, 0],
            0,
        )];
        let bundle = InputBundle {
            program,
            constants: vec![0.0625, 0.125],
            noise_states: vec![descriptor],
            noise_levels: levels,
            amplitudes: vec![1.0, 1.0],
        };
        let a = run(&bundle, 10, 20, 30);
        let b = run(&bundle, 10, 20, 30);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
