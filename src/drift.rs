// ==============================================================================
// drift.rs — COMMITTED-DIRECTION DRIFT
// ------------------------------------------------------------------------------
// NotDrifting -> Drifting(sign(steer)) when
//     trigger held && |v_fwd| >= min_speed && |steer| > deadzone
// Drifting(d) -> NotDrifting only when the trigger is released.
//
// The direction is latched on entry. Steering the other way mid-slide does not
// flip it; it engages the counter-steer "catch" torque instead.
//
// While drifting:
// - lateral grip  *= side_grip_multiplier (rear additionally * rear_grip_multiplier)
// - steer target  *= steer_multiplier
// - drive power   *= power_multiplier
// - yaw torque:
//     steer with d    : τ = yaw_torque * |steer|           towards d
//     steer against d : τ = -counter_steer_torque * ω_yaw * |steer|
//
// Exit correction (on release):
//     v' = fwd*v_f + right*v_s*(1 - exit_snappiness) + up*v_u
//     ω' = ω * exit_angular_damping
// ==============================================================================

use serde::Serialize;

use crate::config::DriftConfig;
use crate::dynamics::types::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DriftState {
    #[default]
    NotDrifting,
    Drifting { direction: i8 }, // -1 left, +1 right
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftTransition {
    None,
    Entered(i8),
    Exited,
}

impl DriftState {
    pub fn is_active(&self) -> bool {
        matches!(self, DriftState::Drifting { .. })
    }

    /// Locked direction, 0 when not drifting.
    pub fn direction(&self) -> i8 {
        match self {
            DriftState::NotDrifting => 0,
            DriftState::Drifting { direction } => *direction,
        }
    }

    pub fn update(&mut self, cfg: &DriftConfig, held: bool, forward_speed: f32, steer: f32) -> DriftTransition {
        match *self {
            DriftState::NotDrifting => {
                if cfg.enabled
                    && held
                    && forward_speed.abs() >= cfg.min_speed
                    && steer.abs() > cfg.steer_deadzone
                {
                    let direction = if steer > 0.0 { 1 } else { -1 };
                    *self = DriftState::Drifting { direction };
                    DriftTransition::Entered(direction)
                } else {
                    DriftTransition::None
                }
            }
            DriftState::Drifting { .. } => {
                if held {
                    DriftTransition::None
                } else {
                    *self = DriftState::NotDrifting;
                    DriftTransition::Exited
                }
            }
        }
    }

    /// Drop out of the drift without any exit correction.
    pub fn cancel(&mut self) {
        *self = DriftState::NotDrifting;
    }

    /// (front, rear) lateral grip multipliers.
    pub fn grip_multipliers(&self, cfg: &DriftConfig) -> (f32, f32) {
        if self.is_active() {
            let side = cfg.side_grip_multiplier;
            (side, side * cfg.rear_grip_multiplier)
        } else {
            (1.0, 1.0)
        }
    }

    pub fn steer_multiplier(&self, cfg: &DriftConfig) -> f32 {
        if self.is_active() { cfg.steer_multiplier } else { 1.0 }
    }

    pub fn power_multiplier(&self, cfg: &DriftConfig) -> f32 {
        if self.is_active() { cfg.power_multiplier } else { 1.0 }
    }

    /// World-space yaw torque (N*m) for this step. `up` is the chassis up axis,
    /// `angvel` the current angular velocity. Positive steer is a right turn,
    /// i.e. negative rotation about up.
    pub fn yaw_torque(&self, cfg: &DriftConfig, steer: f32, up: Vec3, angvel: Vec3) -> Vec3 {
        let DriftState::Drifting { direction } = *self else {
            return Vec3::zeros();
        };
        let along = steer * direction as f32;
        if along > 0.0 {
            -up * (direction as f32 * cfg.yaw_torque * steer.abs())
        } else if along < 0.0 {
            let yaw_rate = angvel.dot(&up);
            -up * (cfg.counter_steer_torque * yaw_rate * steer.abs())
        } else {
            Vec3::zeros()
        }
    }
}

/// Velocity blend applied on drift release. Returns (linvel, angvel).
pub fn exit_correction(
    cfg: &DriftConfig,
    linvel: Vec3,
    angvel: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
) -> (Vec3, Vec3) {
    let v_f = linvel.dot(&forward);
    let v_s = linvel.dot(&right);
    let v_u = linvel.dot(&up);

    let v = forward * v_f + right * (v_s * (1.0 - cfg.exit_snappiness)) + up * v_u;
    (v, angvel * cfg.exit_angular_damping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DriftConfig {
        DriftConfig::default()
    }

    #[test]
    fn needs_speed_steer_and_trigger() {
        let mut d = DriftState::default();
        assert_eq!(d.update(&cfg(), true, 3.0, 0.8), DriftTransition::None);
        assert_eq!(d.update(&cfg(), true, 12.0, 0.05), DriftTransition::None);
        assert_eq!(d.update(&cfg(), false, 12.0, 0.8), DriftTransition::None);
        assert_eq!(d.update(&cfg(), true, 12.0, -0.8), DriftTransition::Entered(-1));
        assert_eq!(d.direction(), -1);
    }

    #[test]
    fn reverse_speed_counts_towards_entry() {
        let mut d = DriftState::default();
        assert_eq!(d.update(&cfg(), true, -9.0, 0.5), DriftTransition::Entered(1));
    }

    #[test]
    fn direction_is_locked_until_release_and_repress() {
        let mut d = DriftState::default();
        d.update(&cfg(), true, 15.0, 0.5);
        assert_eq!(d.direction(), 1);

        for _ in 0..10 {
            assert_eq!(d.update(&cfg(), true, 15.0, -0.5), DriftTransition::None);
            assert_eq!(d.direction(), 1);
        }
        // speed dropping does not end it either
        d.update(&cfg(), true, 0.0, -0.5);
        assert_eq!(d.direction(), 1);

        assert_eq!(d.update(&cfg(), false, 15.0, -0.5), DriftTransition::Exited);
        assert_eq!(d.direction(), 0);
        assert_eq!(d.update(&cfg(), true, 15.0, -0.5), DriftTransition::Entered(-1));
    }

    #[test]
    fn disabled_feature_never_enters() {
        let c = DriftConfig { enabled: false, ..cfg() };
        let mut d = DriftState::default();
        assert_eq!(d.update(&c, true, 20.0, 1.0), DriftTransition::None);
        assert_eq!(d.grip_multipliers(&c), (1.0, 1.0));
    }

    #[test]
    fn rear_loses_more_grip_than_front() {
        let mut d = DriftState::default();
        d.update(&cfg(), true, 15.0, 0.5);
        let (front, rear) = d.grip_multipliers(&cfg());
        assert!(rear < front && front < 1.0);
    }

    #[test]
    fn yaw_torque_follows_lock_and_catches_counter_steer() {
        let up = Vec3::y();
        let mut d = DriftState::default();
        d.update(&cfg(), true, 15.0, 1.0);

        // right drift, steering right: yaw right = negative about +Y
        let t = d.yaw_torque(&cfg(), 1.0, up, Vec3::zeros());
        assert!((t.y + cfg().yaw_torque).abs() < 1e-3);

        // counter steer while yawing right (ω_y < 0): torque pushes back positive
        let c = d.yaw_torque(&cfg(), -0.5, up, Vec3::new(0.0, -2.0, 0.0));
        assert!((c.y - cfg().counter_steer_torque * 2.0 * 0.5).abs() < 1e-3);

        assert_eq!(d.yaw_torque(&cfg(), 0.0, up, Vec3::zeros()), Vec3::zeros());
        assert_eq!(DriftState::NotDrifting.yaw_torque(&cfg(), 1.0, up, Vec3::zeros()), Vec3::zeros());
    }

    #[test]
    fn exit_correction_trims_sideways_and_spin() {
        let c = cfg();
        let (v, w) = exit_correction(
            &c,
            Vec3::new(4.0, -1.0, -10.0),
            Vec3::new(0.0, 2.0, 0.0),
            -Vec3::z(),
            Vec3::x(),
            Vec3::y(),
        );
        assert!((v.z + 10.0).abs() < 1e-5);
        assert!((v.x - 4.0 * (1.0 - c.exit_snappiness)).abs() < 1e-5);
        assert!((v.y + 1.0).abs() < 1e-5);
        assert!((w.y - 2.0 * c.exit_angular_damping).abs() < 1e-5);
    }
}
