// ==============================================================================
// solve.rs — PER-WHEEL FORCE SOLVE (SUSPENSION + LATERAL + DRIVE)
// ==============================================================================
// For every grounded wheel, from the SAME pre-step chassis velocity:
//   v_point  = v_com + ω × (p_mount - com)
//   F_susp   = suspension.rs
//   F_lat    = lateral.rs      (grip scaled per axle by ctx.front/rear_grip)
//   F_drive  = longitudinal.rs (rear only)
//
// Airborne wheels produce no solution. A wheel whose combined force is not
// finite is zeroed and reported; nothing non-finite leaves this module.
//
// The caller applies each solution as an impulse F*dt at `apply_point`.
// ==============================================================================

use tracing::warn;

use crate::config::VehicleConfig;
use crate::dynamics::kinematics::point_velocity;
use crate::dynamics::lateral::solve_lateral;
use crate::dynamics::longitudinal::solve_longitudinal;
use crate::dynamics::suspension::solve_suspension;
use crate::dynamics::types::{
    DriveMode, GroundHit, Pt3, SolveContext, Vec3, WheelFrame, WheelSolution,
};

/// Chassis velocity state sampled once before any wheel force is applied.
#[derive(Debug, Clone, Copy)]
pub struct ChassisMotion {
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub com: Pt3, // world space
}

pub fn solve_wheel(
    cfg: &VehicleConfig,
    ctx: &SolveContext,
    frame: &WheelFrame,
    hit: &GroundHit,
    motion: &ChassisMotion,
) -> WheelSolution {
    let v_point = point_velocity(motion.linvel, motion.angvel, motion.com, frame.position);

    let susp = solve_suspension(&cfg.suspension, frame, hit, v_point);

    let grip = if frame.id.is_front() { ctx.front_grip } else { ctx.rear_grip };
    let lat = solve_lateral(&cfg.tire, frame, ctx.steer_angle, grip, v_point, ctx.dt);

    let long = solve_longitudinal(&cfg.drive, &cfg.tire, &cfg.slope, ctx, frame, hit, v_point);

    WheelSolution {
        id: frame.id,
        apply_point: frame.position,
        suspension: susp.force,
        lateral: lat.force,
        drive: long.force,
        compression: susp.compression,
        slip_speed: lat.slip_speed,
        forward_speed: long.forward_speed,
        mode: long.mode,
        hard_landing: susp.hard_landing,
    }
}

pub fn solve_step(
    cfg: &VehicleConfig,
    ctx: &SolveContext,
    frames: &[WheelFrame; 4],
    probes: &[Option<GroundHit>; 4],
    motion: &ChassisMotion,
) -> [Option<WheelSolution>; 4] {
    let mut out = [None; 4];

    for (i, frame) in frames.iter().enumerate() {
        let Some(hit) = probes[i].as_ref() else {
            continue;
        };

        let mut sol = solve_wheel(cfg, ctx, frame, hit, motion);
        if !sol.is_finite() {
            warn!(
                wheel = %frame.id,
                suspension = ?sol.suspension,
                lateral = ?sol.lateral,
                drive = ?sol.drive,
                "non-finite wheel force dropped"
            );
            sol.suspension = Vec3::zeros();
            sol.lateral = Vec3::zeros();
            sol.drive = Vec3::zeros();
            sol.mode = DriveMode::Idle;
        }
        out[i] = Some(sol);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::kinematics::wheel_frame;
    use crate::dynamics::types::WheelId;
    use nalgebra::Isometry3;

    fn ctx() -> SolveContext {
        SolveContext {
            dt: 1.0 / 60.0,
            chassis_mass: 1500.0,
            driven_wheels: 2.0,
            throttle: 0.0,
            steer_angle: 0.0,
            boosting: false,
            front_grip: 1.0,
            rear_grip: 1.0,
            power_multiplier: 1.0,
            slope_override: None,
        }
    }

    fn frames(cfg: &VehicleConfig) -> [WheelFrame; 4] {
        let pose = Isometry3::translation(0.0, 0.8, 0.0);
        WheelId::ALL.map(|id| {
            let [x, y, z] = cfg.wheels[id.index()];
            wheel_frame(&pose, id, Pt3::new(x, y, z))
        })
    }

    fn hit_at(distance: f32) -> Option<GroundHit> {
        Some(GroundHit { distance, point: Pt3::origin(), normal: Vec3::y() })
    }

    #[test]
    fn airborne_wheels_have_no_solution() {
        let cfg = VehicleConfig::default();
        let motion = ChassisMotion { linvel: Vec3::zeros(), angvel: Vec3::zeros(), com: Pt3::new(0.0, 0.3, 0.0) };
        let probes = [hit_at(0.5), None, None, hit_at(0.5)];
        let out = solve_step(&cfg, &ctx(), &frames(&cfg), &probes, &motion);
        assert!(out[0].is_some() && out[3].is_some());
        assert!(out[1].is_none() && out[2].is_none());
    }

    #[test]
    fn still_vehicle_yields_finite_vertical_forces_only() {
        let cfg = VehicleConfig::default();
        let motion = ChassisMotion { linvel: Vec3::zeros(), angvel: Vec3::zeros(), com: Pt3::new(0.0, 0.3, 0.0) };
        let probes = [hit_at(0.5); 4];
        for sol in solve_step(&cfg, &ctx(), &frames(&cfg), &probes, &motion).iter().flatten() {
            assert!(sol.is_finite());
            assert_eq!(sol.lateral, Vec3::zeros());
            assert_eq!(sol.drive, Vec3::zeros());
            assert!(sol.suspension.y > 0.0);
        }
    }

    #[test]
    fn non_finite_state_is_zeroed() {
        let cfg = VehicleConfig::default();
        let motion = ChassisMotion {
            linvel: Vec3::new(f32::NAN, 0.0, 0.0),
            angvel: Vec3::zeros(),
            com: Pt3::origin(),
        };
        let probes = [hit_at(0.5); 4];
        for sol in solve_step(&cfg, &ctx(), &frames(&cfg), &probes, &motion).iter().flatten() {
            assert_eq!(sol.total(), Vec3::zeros());
        }
    }

    #[test]
    fn drift_grip_reduces_rear_lateral_force() {
        let cfg = VehicleConfig::default();
        let motion = ChassisMotion {
            linvel: Vec3::new(3.0, 0.0, -10.0),
            angvel: Vec3::zeros(),
            com: Pt3::new(0.0, 0.3, 0.0),
        };
        let probes = [hit_at(0.5); 4];
        let normal = solve_step(&cfg, &ctx(), &frames(&cfg), &probes, &motion);
        let mut sliding = ctx();
        sliding.front_grip = 0.5;
        sliding.rear_grip = 0.3;
        let drifting = solve_step(&cfg, &sliding, &frames(&cfg), &probes, &motion);

        let rear = WheelId::RL.index();
        let (Some(a), Some(b)) = (normal[rear], drifting[rear]) else {
            panic!("rear wheel should be grounded");
        };
        assert!((b.lateral.norm() - a.lateral.norm() * 0.3).abs() < 1e-1);
    }
}
