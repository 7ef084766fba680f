// ==============================================================================
// lateral.rs — SIDEWAYS SLIP CORRECTION (VELOCITY-NULLING, PER WHEEL)
// ------------------------------------------------------------------------------
// Not a friction cone. Each step the wheel asks for a velocity change that
// cancels (a tunable fraction of) its sideways slip, then converts it to force
// through the tire mass over one fixed step:
//
//     side   = right axis (rotated by steer angle on front wheels)
//     v_slip = dot(side, v_point)
//     dv     = -v_slip * grip
//     F      = side * tire_mass * dv / dt
//
// `grip` = tire.sideways_grip * per-axle multiplier (1.0 unless drifting).
// ==============================================================================

use crate::config::TireConfig;
use crate::dynamics::kinematics::steered_lateral;
use crate::dynamics::types::{Vec3, WheelFrame};

#[derive(Debug, Clone, Copy)]
pub struct LateralResult {
    pub force: Vec3,
    pub slip_speed: f32,
}

pub fn solve_lateral(
    cfg: &TireConfig,
    frame: &WheelFrame,
    steer_angle: f32,
    grip_multiplier: f32,
    point_vel: Vec3,
    dt: f32,
) -> LateralResult {
    let side = steered_lateral(frame, steer_angle);
    let slip_speed = side.dot(&point_vel);

    if dt <= f32::EPSILON {
        return LateralResult { force: Vec3::zeros(), slip_speed };
    }

    let grip = cfg.sideways_grip * grip_multiplier;
    let dv = -slip_speed * grip;

    LateralResult {
        force: side * (cfg.tire_mass * dv / dt),
        slip_speed,
    }
}
