// ==============================================================================
// longitudinal.rs — DRIVE / BRAKE / REVERSE / ROLLING (REAR WHEELS)
// ==============================================================================
// Only driven (rear) wheels produce a longitudinal force. Branch order:
//
// 1) throttle > 0                      -> DRIVE
//      F = throttle * motor_power * curve(|v_fwd|) * power_multiplier
// 2) throttle < 0 && v_fwd > engage    -> BRAKE
//      F = -sign(v_fwd) * brake_power           (never reverse torque here)
// 3) throttle < 0                      -> REVERSE
//      F = throttle * reverse_power [* curve(|v_fwd|)]
// 4) throttle == 0                     -> ROLLING
//      F = -sign(v_fwd) * forward_grip * scale   (dead band near zero)
//
// Brake and rolling impulses are capped at the wheel's share of forward
// momentum, so within one step they stop the car but never push it backwards.
//
// Slope limit: when the ground under the wheel is steeper than
// `max_drive_angle`, the wheel contributes no longitudinal force at all.
// ==============================================================================

use crate::config::{DriveConfig, SlopeConfig, TireConfig};
use crate::dynamics::kinematics::slope_angle;
use crate::dynamics::types::{DriveMode, GroundHit, SolveContext, Vec3, WheelFrame};

#[derive(Debug, Clone, Copy)]
pub struct LongitudinalResult {
    pub force: Vec3,
    pub forward_speed: f32,
    pub mode: DriveMode,
}

impl LongitudinalResult {
    fn none(forward_speed: f32, mode: DriveMode) -> Self {
        Self { force: Vec3::zeros(), forward_speed, mode }
    }
}

/// Is the surface under this wheel too steep to drive on?
pub fn slope_blocks_drive(cfg: &SlopeConfig, hit: &GroundHit, slope_override: Option<f32>) -> bool {
    if !cfg.enabled {
        return false;
    }
    let angle = slope_override.unwrap_or_else(|| slope_angle(hit.normal));
    angle.abs() > cfg.max_drive_angle
}

pub fn solve_longitudinal(
    drive: &DriveConfig,
    tire: &TireConfig,
    slope: &SlopeConfig,
    ctx: &SolveContext,
    frame: &WheelFrame,
    hit: &GroundHit,
    point_vel: Vec3,
) -> LongitudinalResult {
    let v_fwd = frame.forward.dot(&point_vel);

    if !frame.id.is_rear() {
        return LongitudinalResult::none(v_fwd, DriveMode::Idle);
    }
    if slope_blocks_drive(slope, hit, ctx.slope_override) {
        return LongitudinalResult::none(v_fwd, DriveMode::SlopeLimited);
    }

    let throttle = ctx.throttle;
    let (power, mode) = if throttle > 0.0 {
        let curve = drive.power_curve.evaluate(v_fwd.abs());
        (throttle * drive.motor_power * curve * ctx.power_multiplier, DriveMode::Drive)
    } else if throttle < 0.0 && v_fwd > drive.brake_engage_speed {
        (-v_fwd.signum() * drive.brake_power, DriveMode::Brake)
    } else if throttle < 0.0 {
        let curve = if drive.reverse_uses_curve { drive.power_curve.evaluate(v_fwd.abs()) } else { 1.0 };
        (throttle * drive.reverse_power * curve, DriveMode::Reverse)
    } else if v_fwd.abs() > drive.rolling_deadband {
        (-v_fwd.signum() * tire.rolling_resistance(), DriveMode::Rolling)
    } else {
        (0.0, DriveMode::Idle)
    };

    let power = match mode {
        DriveMode::Brake | DriveMode::Rolling => cap_to_stop(power, v_fwd, ctx),
        _ => power,
    };

    LongitudinalResult { force: frame.forward * power, forward_speed: v_fwd, mode }
}

/// Limit an opposing force so its impulse over one step cancels at most this
/// wheel's share of the chassis forward momentum.
fn cap_to_stop(power: f32, v_fwd: f32, ctx: &SolveContext) -> f32 {
    if ctx.dt <= f32::EPSILON {
        return 0.0;
    }
    let share = ctx.chassis_mass / ctx.driven_wheels.max(1.0);
    let max_force = share * v_fwd.abs() / ctx.dt;
    power.clamp(-max_force, max_force)
}
