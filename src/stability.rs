// ==============================================================================
// stability.rs — SPEED GOVERNOR, ANGULAR CLAMP, SLEEP
// ------------------------------------------------------------------------------
// Governor (post-force):
//     v_fwd = dot(v, forward)
//     v_fwd >  max_fwd  ->  v -= forward * (v_fwd - max_fwd)
//     v_fwd < -max_rev  ->  v -= forward * (v_fwd + max_rev)
//   Only the forward component is trimmed; lateral and vertical survive.
//
// Angular clamp: |ω| <= max_angular_velocity, direction preserved.
//
// Sleep: all of |v|, |ω|, input under threshold AND every wheel grounded on a
// loaded spring. Entering zeroes both velocities; any threshold exceeded wakes.
//
// Helpers return Some(new_value) only when something had to change, so a
// resting body is never written to (and never woken).
// ==============================================================================

use crate::config::StabilityConfig;
use crate::dynamics::types::Vec3;

pub fn govern_speed(linvel: Vec3, forward: Vec3, max_forward: f32, max_reverse: f32) -> Option<Vec3> {
    let v_fwd = linvel.dot(&forward);
    if v_fwd > max_forward {
        Some(linvel - forward * (v_fwd - max_forward))
    } else if v_fwd < -max_reverse {
        Some(linvel - forward * (v_fwd + max_reverse))
    } else {
        None
    }
}

pub fn clamp_angular(angvel: Vec3, max: f32) -> Option<Vec3> {
    let mag = angvel.norm();
    if !mag.is_finite() {
        return Some(Vec3::zeros());
    }
    if mag > max {
        Some(angvel * (max / mag))
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepTransition {
    Stay,
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SleepState {
    asleep: bool,
    quiet_for: f32, // s spent under every threshold while awake
}

impl SleepState {
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    pub fn reset(&mut self) {
        self.asleep = false;
        self.quiet_for = 0.0;
    }

    pub fn update(
        &mut self,
        cfg: &StabilityConfig,
        linvel: Vec3,
        angvel: Vec3,
        input_magnitude: f32,
        wheels_loaded: bool,
        dt: f32,
    ) -> SleepTransition {
        let quiet = linvel.norm() < cfg.sleep_linear
            && angvel.norm() < cfg.sleep_angular
            && input_magnitude <= cfg.sleep_input
            && wheels_loaded;

        if !quiet {
            self.quiet_for = 0.0;
            if self.asleep {
                self.asleep = false;
                return SleepTransition::Exit;
            }
            return SleepTransition::Stay;
        }

        if self.asleep {
            return SleepTransition::Stay;
        }
        self.quiet_for += dt;
        if self.quiet_for >= cfg.sleep_delay {
            self.asleep = true;
            SleepTransition::Enter
        } else {
            SleepTransition::Stay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const DT: f32 = 1.0 / 60.0;

    fn fwd() -> Vec3 {
        -Vec3::z()
    }

    #[test]
    fn governor_trims_only_forward_excess() {
        let v = Vec3::new(3.0, -1.0, -40.0); // 40 m/s forward
        let out = govern_speed(v, fwd(), 30.0, 10.0).unwrap();
        assert!((out.dot(&fwd()) - 30.0).abs() < 1e-5);
        assert_eq!(out.x, 3.0);
        assert_eq!(out.y, -1.0);

        assert!(govern_speed(Vec3::new(0.0, 0.0, -29.0), fwd(), 30.0, 10.0).is_none());
    }

    #[test]
    fn governor_bounds_reverse_separately() {
        let out = govern_speed(Vec3::new(0.0, 0.0, 15.0), fwd(), 30.0, 10.0).unwrap();
        assert!((out.dot(&fwd()) + 10.0).abs() < 1e-5);
        assert!(govern_speed(Vec3::new(0.0, 0.0, 9.0), fwd(), 30.0, 10.0).is_none());
    }

    #[test]
    fn random_velocities_respect_both_limits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let v = Vec3::new(rng.gen_range(-60.0..60.0), rng.gen_range(-20.0..20.0), rng.gen_range(-80.0..80.0));
            let out = govern_speed(v, fwd(), 30.0, 10.0).unwrap_or(v);
            let f = out.dot(&fwd());
            assert!(f <= 30.0 + 1e-3 && f >= -10.0 - 1e-3);
        }
    }

    #[test]
    fn angular_clamp_preserves_axis() {
        let out = clamp_angular(Vec3::new(0.0, 10.0, 0.0), 3.5).unwrap();
        assert!((out.norm() - 3.5).abs() < 1e-5);
        assert!(out.y > 0.0);
        assert!(clamp_angular(Vec3::new(1.0, 1.0, 1.0), 3.5).is_none());
        assert_eq!(clamp_angular(Vec3::new(f32::NAN, 0.0, 0.0), 3.5), Some(Vec3::zeros()));
    }

    #[test]
    fn random_angular_velocities_are_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let w = Vec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let out = clamp_angular(w, 3.5).unwrap_or(w);
            assert!(out.norm() <= 3.5 + 1e-4);
        }
    }

    #[test]
    fn sleep_enters_and_exits_on_thresholds() {
        let cfg = StabilityConfig { sleep_delay: 0.0, ..StabilityConfig::default() };
        let mut s = SleepState::default();
        let still = Vec3::new(0.01, 0.0, 0.0);

        assert_eq!(s.update(&cfg, still, Vec3::zeros(), 0.0, true, DT), SleepTransition::Enter);
        assert_eq!(s.update(&cfg, Vec3::zeros(), Vec3::zeros(), 0.0, true, DT), SleepTransition::Stay);
        assert!(s.is_asleep());

        assert_eq!(s.update(&cfg, Vec3::zeros(), Vec3::zeros(), 0.5, true, DT), SleepTransition::Exit);
        assert!(!s.is_asleep());
    }

    #[test]
    fn sleep_waits_for_a_continuous_quiet_spell() {
        let cfg = StabilityConfig { sleep_delay: 0.25, ..StabilityConfig::default() };
        let mut s = SleepState::default();
        let bounce = Vec3::new(0.0, 0.5, 0.0);

        // a single still frame at the top of a bounce is not enough
        for _ in 0..10 {
            assert_eq!(s.update(&cfg, Vec3::zeros(), Vec3::zeros(), 0.0, true, DT), SleepTransition::Stay);
        }
        s.update(&cfg, bounce, Vec3::zeros(), 0.0, true, DT);

        let mut entered_after = None;
        for i in 1..=30 {
            if s.update(&cfg, Vec3::zeros(), Vec3::zeros(), 0.0, true, DT) == SleepTransition::Enter {
                entered_after = Some(i);
                break;
            }
        }
        // 0.25 s at 60 Hz, give or take float accumulation
        assert!(matches!(entered_after, Some(15 | 16)), "{entered_after:?}");
    }

    #[test]
    fn airborne_or_unloaded_vehicle_never_sleeps() {
        let cfg = StabilityConfig::default();
        let mut s = SleepState::default();
        for _ in 0..120 {
            assert_eq!(s.update(&cfg, Vec3::zeros(), Vec3::zeros(), 0.0, false, DT), SleepTransition::Stay);
        }
        assert!(!s.is_asleep());
    }
}
