// ==============================================================================
// steering.rs — FILTERED STEERING ANGLE (FRONT AXLE)
// ------------------------------------------------------------------------------
// target = steer_input * max_angle * speed_curve(|speed|) * drift_multiplier
// angle += (target - angle) * min(response_rate * dt, 1)
//
// Simple first-order low-pass: the wheels chase the target, never snap to it.
// Both front wheels share the same angle (no Ackermann split).
// ==============================================================================

use crate::config::SteeringConfig;

pub fn steer_target(cfg: &SteeringConfig, steer_input: f32, speed: f32, drift_multiplier: f32) -> f32 {
    let authority = cfg.speed_curve.evaluate(speed.abs());
    steer_input * cfg.max_angle * authority * drift_multiplier
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SteeringFilter {
    angle: f32, // radians, + = right
}

impl SteeringFilter {
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn reset(&mut self) {
        self.angle = 0.0;
    }

    pub fn update(
        &mut self,
        cfg: &SteeringConfig,
        steer_input: f32,
        speed: f32,
        drift_multiplier: f32,
        dt: f32,
    ) -> f32 {
        let target = steer_target(cfg, steer_input, speed, drift_multiplier);
        let alpha = (cfg.response_rate * dt.max(0.0)).min(1.0);
        self.angle += (target - self.angle) * alpha;
        if !self.angle.is_finite() {
            self.angle = 0.0;
        }
        self.angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_attenuated_at_speed() {
        let cfg = SteeringConfig::default();
        let slow = steer_target(&cfg, 1.0, 0.0, 1.0);
        let fast = steer_target(&cfg, 1.0, 30.0, 1.0);
        assert!((slow - cfg.max_angle).abs() < 1e-6);
        assert!((fast - cfg.max_angle * 0.4).abs() < 1e-5);
    }

    #[test]
    fn filter_approaches_target_without_overshoot() {
        let cfg = SteeringConfig::default();
        let mut f = SteeringFilter::default();
        let target = steer_target(&cfg, 1.0, 0.0, 1.0);

        let first = f.update(&cfg, 1.0, 0.0, 1.0, 1.0 / 60.0);
        assert!(first > 0.0 && first < target);

        let mut prev = first;
        for _ in 0..240 {
            let a = f.update(&cfg, 1.0, 0.0, 1.0, 1.0 / 60.0);
            assert!(a >= prev && a <= target + 1e-6);
            prev = a;
        }
        assert!((prev - target).abs() < 1e-3);
    }

    #[test]
    fn huge_dt_lands_exactly_on_target() {
        let cfg = SteeringConfig::default();
        let mut f = SteeringFilter::default();
        let a = f.update(&cfg, -0.5, 0.0, 1.3, 10.0);
        assert!((a - steer_target(&cfg, -0.5, 0.0, 1.3)).abs() < 1e-6);
    }
}
