//! Per-operator semantics, dispatched by [`OpCode`].
//!
//! Pure operators are ordinary functions of their stack-supplied inputs.
//! `Min`, `Max`, `RangeChoice` and `Spline` additionally rewrite
//! `stack_offset` (and, for `Spline`, the `skip_result` flag) to implement
//! their respective control-transfer protocols.

use crate::bundle::InputBundle;
use crate::math::{clamp, clamped_map, lerp};
use crate::noise::old_blended_noise;

use super::frame::{OpCode, StackFrame};
use super::state::EvalState;

fn cube(value: f64) -> f64 {
    value * value * value
}

fn half_negative(value: f64) -> f64 {
    if value > 0.0 { value } else { value * 0.5 }
}

fn quarter_negative(value: f64) -> f64 {
    if value > 0.0 { value } else { value * 0.25 }
}

fn squeeze(value: f64) -> f64 {
    let c = clamp(value, -1.0, 1.0);
    (c / 2.0) - ((c * c * c) / 24.0)
}

fn spaghetti_rarity_3d(value: f64) -> f64 {
    if value < -0.5 {
        0.75
    } else if value < 0.0 {
        1.0
    } else if value < 0.5 {
        1.5
    } else {
        2.0
    }
}

fn spaghetti_rarity_2d(value: f64) -> f64 {
    if value < -0.75 {
        0.5
    } else if value < -0.5 {
        0.75
    } else if value < 0.5 {
        1.0
    } else if value < 0.75 {
        2.0
    } else {
        3.0
    }
}

fn linear_ext_if_non_zero(x: f64, derivative: f64, location: f64, value: f64) -> f64 {
    if derivative == 0.0 { value } else { value + derivative * (x - location) }
}

/// Dispatches one frame's operator. May mutate `state.stack_offset` and
/// `state.skip_result`; the caller (the VM step loop) is responsible for
/// the default register write and the unconditional `stack_offset += 1`.
#[must_use]
pub fn dispatch(op: OpCode, state: &mut EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    match op {
        OpCode::Add => state.stack_arg(program, bundle, 0) + state.stack_arg(program, bundle, 1),
        OpCode::Mul => state.stack_arg(program, bundle, 0) * state.stack_arg(program, bundle, 1),
        OpCode::Min => min_max(state, program, bundle, true),
        OpCode::Max => min_max(state, program, bundle, false),
        OpCode::Abs => state.stack_arg(program, bundle, 0).abs(),
        OpCode::Square => {
            let a = state.stack_arg(program, bundle, 0);
            a * a
        }
        OpCode::Cube => cube(state.stack_arg(program, bundle, 0)),
        OpCode::HalfNegative => half_negative(state.stack_arg(program, bundle, 0)),
        OpCode::QuarterNegative => quarter_negative(state.stack_arg(program, bundle, 0)),
        OpCode::Squeeze => squeeze(state.stack_arg(program, bundle, 0)),
        OpCode::Clamp => {
            let min = state.constant_arg(program, bundle, 0);
            let max = state.constant_arg(program, bundle, 1);
            clamp(state.stack_arg(program, bundle, 0), min, max)
        }
        OpCode::YClampedGradient => {
            let from_y = state.constant_arg(program, bundle, 0);
            let to_y = state.constant_arg(program, bundle, 1);
            let from_value = state.constant_arg(program, bundle, 2);
            let to_value = state.constant_arg(program, bundle, 3);
            clamped_map(f64::from(state.y()), from_y, to_y, from_value, to_value)
        }
        OpCode::RangeChoice => range_choice(state, program, bundle),
        OpCode::Noise => noise(state, program, bundle),
        OpCode::ShiftedNoise => shifted_noise(state, program, bundle),
        OpCode::Spline => spline(state, program, bundle),
        OpCode::WeirdScaledSampler => weird_scaled_sampler(state, program, bundle),
        OpCode::Interpolated | OpCode::BlendDensity | OpCode::CacheOnce | OpCode::FlatCache | OpCode::Cache2D => {
            state.stack_arg(program, bundle, 0)
        }
        OpCode::BlendOffset => 0.0,
        OpCode::BlendAlpha => 1.0,
        OpCode::ShiftA => shift_a(state, program, bundle),
        OpCode::ShiftB => shift_b(state, program, bundle),
        OpCode::OldBlendedNoise => old_blended(state, program, bundle),
        OpCode::EndIslands => 1.0,
    }
}

fn min_max(state: &mut EvalState, program: &[StackFrame], bundle: &InputBundle, is_min: bool) -> f64 {
    let mode = state.constant_arg(program, bundle, 0) as i64;
    if mode == 0 {
        let a = state.stack_arg(program, bundle, 0);
        let bound = state.constant_arg(program, bundle, 1);
        let can_skip = if is_min { a <= bound } else { a >= bound };
        if can_skip {
            let target = state.constant_arg(program, bundle, 2) as usize;
            state.write_register_at(program, target, a);
            state.set_stack_offset(target);
        }
        a
    } else {
        let a = state.stack_arg(program, bundle, 0);
        let b = state.stack_arg(program, bundle, 1);
        if is_min {
            if a < b { a } else { b }
        } else if a > b {
            a
        } else {
            b
        }
    }
}

fn range_choice(state: &mut EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    let mode = state.constant_arg(program, bundle, 0) as i64;
    if mode == 0 {
        let min_inclusive = state.constant_arg(program, bundle, 1);
        let max_exclusive = state.constant_arg(program, bundle, 2);
        let switch_args = state.constant_arg(program, bundle, 3) != 0.0;
        let input = state.stack_arg(program, bundle, 0);
        let in_range = input >= min_inclusive && input < max_exclusive;
        let branch_const = match (in_range, switch_args) {
            (true, false) | (false, true) => 4,
            (true, true) | (false, false) => 5,
        };
        let target = state.constant_arg(program, bundle, branch_const) as usize;
        state.set_stack_offset(target);
        0.0
    } else {
        let result = state.stack_arg(program, bundle, 0);
        let target = state.constant_arg(program, bundle, 1) as usize;
        state.set_stack_offset(target);
        result
    }
}

fn noise(state: &EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    let xz_scale = state.constant_arg(program, bundle, 0);
    let y_scale = state.constant_arg(program, bundle, 1);
    let descriptor = &bundle.noise_states[program[state.stack_offset()].noise_index];
    descriptor.get_vanilla_val(
        &bundle.noise_levels,
        &bundle.amplitudes,
        f64::from(state.x()) * xz_scale,
        f64::from(state.y()) * y_scale,
        f64::from(state.z()) * xz_scale,
    )
}

fn shifted_noise(state: &EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    let xz_scale = state.constant_arg(program, bundle, 0);
    let y_scale = state.constant_arg(program, bundle, 1);
    let x_arg = state.constant_arg(program, bundle, 2) as usize;
    let y_arg = state.constant_arg(program, bundle, 3) as usize;
    let z_arg = state.constant_arg(program, bundle, 4) as usize;

    let shifted_x = f64::from(state.x()) * xz_scale + state.stack_arg(program, bundle, x_arg);
    let shifted_y = f64::from(state.y()) * y_scale + state.stack_arg(program, bundle, y_arg);
    let shifted_z = f64::from(state.z()) * xz_scale + state.stack_arg(program, bundle, z_arg);

    let descriptor = &bundle.noise_states[program[state.stack_offset()].noise_index];
    descriptor.get_vanilla_val(&bundle.noise_levels, &bundle.amplitudes, shifted_x, shifted_y, shifted_z)
}

fn shift_a(state: &EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    let descriptor = &bundle.noise_states[program[state.stack_offset()].noise_index];
    4.0 * descriptor.get_vanilla_val(
        &bundle.noise_levels,
        &bundle.amplitudes,
        f64::from(state.x()) * 0.25,
        0.0,
        f64::from(state.z()) * 0.25,
    )
}

fn shift_b(state: &EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    let descriptor = &bundle.noise_states[program[state.stack_offset()].noise_index];
    4.0 * descriptor.get_vanilla_val(
        &bundle.noise_levels,
        &bundle.amplitudes,
        f64::from(state.z()) * 0.25,
        f64::from(state.x()) * 0.25,
        0.0,
    )
}

fn weird_scaled_sampler(state: &EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    let mapper_type = state.constant_arg(program, bundle, 0) as i64;
    let input_val = state.stack_arg(program, bundle, 0);
    let rarity = if mapper_type == 0 {
        spaghetti_rarity_3d(input_val)
    } else {
        spaghetti_rarity_2d(input_val)
    };
    let descriptor = &bundle.noise_states[program[state.stack_offset()].noise_index];
    rarity
        * descriptor
            .get_vanilla_val(
                &bundle.noise_levels,
                &bundle.amplitudes,
                f64::from(state.x()) / rarity,
                f64::from(state.y()) / rarity,
                f64::from(state.z()) / rarity,
            )
            .abs()
}

fn old_blended(state: &EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    use crate::noise::OldBlendedNoiseParams;

    let smear_scale_multiplier = state.constant_arg(program, bundle, 0);
    let xz_factor = state.constant_arg(program, bundle, 1);
    let xz_scale = state.constant_arg(program, bundle, 2);
    let y_factor = state.constant_arg(program, bundle, 3);
    let y_scale = state.constant_arg(program, bundle, 4);

    let params = OldBlendedNoiseParams::new(smear_scale_multiplier, xz_factor, xz_scale, y_factor, y_scale);
    // Unlike every other noise operator, the reference generator always reads
    // `noise_states[0]` here rather than the frame's own `noise_index`.
    let descriptor = &bundle.noise_states[0];
    old_blended_noise(&params, descriptor, &bundle.noise_levels, state.x(), state.y(), state.z())
}

/// `Spline`'s reentrant Primary/Point/passthrough protocol.
fn spline(state: &mut EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    match state.constant_arg(program, bundle, 0) as i64 {
        0 => spline_primary(state, program, bundle),
        1 => spline_point(state, program, bundle),
        2 => state.stack_arg(program, bundle, 0),
        _ => {
            debug_assert!(false, "spline frame with unknown spline_type");
            0.0
        }
    }
}

fn spline_primary(state: &mut EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    let coord = state.stack_arg(program, bundle, 0);
    let point_count = state.constant_arg(program, bundle, 1) as usize;

    let mut search_len = point_count as isize;
    let mut search_index: isize = 0;
    while search_len > 0 {
        let half_len = search_len / 2;
        let mid = search_index + half_len;
        let point_location = state.constant_arg(program, bundle, (mid + 3) as usize);
        if coord < point_location {
            search_len = half_len;
        } else {
            search_index = mid + 1;
            search_len -= half_len + 1;
        }
    }
    search_index -= 1;
    state.set_skip_result();

    if search_index < 0 {
        let first_point_stack = state.constant_arg(program, bundle, point_count * 2 + 3) as usize;
        state.write_current_register(program, 0.0);
        state.set_stack_offset(first_point_stack);
    } else if search_index as usize == point_count - 1 {
        let point_stack = state.constant_arg(program, bundle, point_count * 3 + 2) as usize;
        state.write_current_register(program, (search_index + 1) as f64);
        state.set_stack_offset(point_stack);
    } else {
        let point_stack = state.constant_arg(program, bundle, point_count * 2 + 4 + search_index as usize) as usize;
        state.write_current_register(program, search_index as f64 + 1.0);
        state.set_stack_offset(point_stack);
    }
    0.0
}

fn spline_point(state: &mut EvalState, program: &[StackFrame], bundle: &InputBundle) -> f64 {
    let old_stack_offset = state.stack_offset();
    let value = state.stack_arg(program, bundle, 0);

    // Switch addressing context to the Primary frame to read its bookkeeping.
    let spline_stack_pos = state.constant_arg(program, bundle, 1) as usize;
    state.set_stack_offset(spline_stack_pos);

    let point_num = state.register_at(program, spline_stack_pos) as i64;
    let coord = state.stack_arg(program, bundle, 0);
    let num_of_points = state.constant_arg(program, bundle, 1) as i64;
    let init_stack_pos = state.constant_arg(program, bundle, 2) as usize;

    if point_num == 0 {
        let point_deriv = state.constant_arg(program, bundle, (num_of_points as usize) + 3);
        let point_location = state.constant_arg(program, bundle, 3);
        let result = linear_ext_if_non_zero(coord, point_deriv, point_location, value);
        state.write_register_at(program, spline_stack_pos, result);
        state.set_stack_offset(init_stack_pos);
        state.set_skip_result();
        0.0
    } else if point_num == num_of_points {
        let p = point_num as usize;
        let point_deriv = state.constant_arg(program, bundle, (num_of_points as usize) + 2 + p);
        let point_location = state.constant_arg(program, bundle, 2 + p);
        let result = linear_ext_if_non_zero(coord, point_deriv, point_location, value);
        state.write_register_at(program, spline_stack_pos, result);
        state.set_stack_offset(init_stack_pos);
        state.set_skip_result();
        0.0
    } else {
        let p = point_num as usize;
        let point_deriv = state.constant_arg(program, bundle, (num_of_points as usize) + 2 + p);
        let point_location = state.constant_arg(program, bundle, 2 + p);
        let final_point_stack = state.constant_arg(program, bundle, (num_of_points as usize) * 2 + 3 + (p - 1)) as usize;

        if old_stack_offset != final_point_stack {
            let next_point_deriv = state.constant_arg(program, bundle, (num_of_points as usize) + 3 + p);
            let next_point_location = state.constant_arg(program, bundle, 3 + p);
            let next_point_stack = state.constant_arg(program, bundle, (num_of_points as usize) * 2 + 2 + p) as usize;

            state.set_stack_offset(next_point_stack);
            let next_point_value = state.stack_arg(program, bundle, 0);

            let distance = next_point_location - point_location;
            let position = (coord - point_location) / distance;
            let value_distance = next_point_value - value;
            let val1 = point_deriv * distance - value_distance;
            let val2 = -next_point_deriv * distance + value_distance;
            let new_val =
                lerp(position, value, next_point_value) + (position * (1.0 - position)) * lerp(position, val1, val2);

            state.write_register_at(program, spline_stack_pos, new_val);
            state.set_stack_offset(init_stack_pos);
            state.set_skip_result();
            new_val
        } else {
            state.set_stack_offset(old_stack_offset);
            linear_ext_if_non_zero(coord, point_deriv, point_location, value)
        }
    }
}
