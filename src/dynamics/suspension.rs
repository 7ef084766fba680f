// ==============================================================================
// suspension.rs — RAYCAST SPRING / DAMPER (PER WHEEL)
// ------------------------------------------------------------------------------
// Converts the probe distance into a force along the wheel's up axis:
//
//     compression = rest_length - hit.distance      (+ = compressed)
//     F_spring    = compression * k
//     v_vert      = dot(wheel_up, v_point)
//     F_damper    = -v_vert * c
//
// Hard landing: when the wheel point closes faster than `hard_landing_speed`
// and the spring is already compressed past `landing_min_compression`, the
// spring term is multiplied by `landing_multiplier` so the chassis does not
// bottom out through the ground.
//
// Compression may go negative inside the probe range (rest..rest+travel); the
// spring then pulls the chassis back towards the ground.
//
// No hit => no force. The caller skips airborne wheels entirely.
// ==============================================================================

use crate::config::SuspensionConfig;
use crate::dynamics::types::{GroundHit, Vec3, WheelFrame};

#[derive(Debug, Clone, Copy)]
pub struct SuspensionResult {
    pub force: Vec3,
    pub compression: f32,   // m
    pub vertical_speed: f32, // m/s along wheel up
    pub hard_landing: bool,
}

pub fn solve_suspension(
    cfg: &SuspensionConfig,
    frame: &WheelFrame,
    hit: &GroundHit,
    point_vel: Vec3,
) -> SuspensionResult {
    let compression = cfg.rest_length - hit.distance;
    let mut spring = compression * cfg.stiffness;

    let vertical_speed = frame.up.dot(&point_vel);
    let damper = -vertical_speed * cfg.damping;

    let hard_landing =
        vertical_speed < -cfg.hard_landing_speed && compression > cfg.landing_min_compression;
    if hard_landing {
        spring *= cfg.landing_multiplier;
    }

    SuspensionResult {
        force: frame.up * (spring + damper),
        compression,
        vertical_speed,
        hard_landing,
    }
}
