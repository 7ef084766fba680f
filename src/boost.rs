// ==============================================================================
// boost.rs — TIMED BOOST OVERLAY
// ------------------------------------------------------------------------------
// Idle --activate(d)--> Boosting(d)            + one forward velocity kick
// Boosting(r) --activate(d)--> Boosting(max(r, d))   (no second kick)
// Boosting(r) --tick(dt)--> Boosting(r - dt) | Idle when r - dt <= 0
//
// While boosting: drive power *= power_multiplier,
//                 top speed   *= max_speed_multiplier.
// ==============================================================================

use serde::Serialize;

use crate::config::BoostConfig;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum BoostState {
    #[default]
    Idle,
    Boosting { remaining: f32 }, // s, never negative
}

/// What an activation request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostActivation {
    /// Idle -> Boosting; the caller owes exactly one velocity kick.
    Started,
    /// Already boosting; remaining time raised to the longer of the two.
    Extended,
    /// Non-finite or non-positive duration.
    Rejected,
    /// Vehicle disabled or boost switched off in config.
    Ignored,
}

impl BoostState {
    pub fn is_active(&self) -> bool {
        matches!(self, BoostState::Boosting { .. })
    }

    pub fn remaining(&self) -> f32 {
        match self {
            BoostState::Idle => 0.0,
            BoostState::Boosting { remaining } => *remaining,
        }
    }

    pub fn activate(&mut self, duration: f32) -> BoostActivation {
        if !duration.is_finite() || duration <= 0.0 {
            return BoostActivation::Rejected;
        }
        match self {
            BoostState::Idle => {
                *self = BoostState::Boosting { remaining: duration };
                BoostActivation::Started
            }
            BoostState::Boosting { remaining } => {
                *remaining = remaining.max(duration);
                BoostActivation::Extended
            }
        }
    }

    /// Advance the timer. Returns true on the tick that ends the boost.
    pub fn tick(&mut self, dt: f32) -> bool {
        let BoostState::Boosting { remaining } = self else {
            return false;
        };
        let left = *remaining - dt.max(0.0);
        if left <= 0.0 {
            *self = BoostState::Idle;
            true
        } else {
            *remaining = left;
            false
        }
    }

    pub fn reset(&mut self) {
        *self = BoostState::Idle;
    }

    pub fn power_multiplier(&self, cfg: &BoostConfig) -> f32 {
        if self.is_active() { cfg.power_multiplier } else { 1.0 }
    }

    pub fn max_speed(&self, cfg: &BoostConfig, base: f32) -> f32 {
        if self.is_active() { base * cfg.max_speed_multiplier } else { base }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_from_idle_starts_once() {
        let mut b = BoostState::default();
        assert_eq!(b.activate(2.0), BoostActivation::Started);
        assert!(b.is_active());
        assert_eq!(b.remaining(), 2.0);
    }

    #[test]
    fn repeated_activation_does_not_stack() {
        let mut b = BoostState::default();
        assert_eq!(b.activate(2.0), BoostActivation::Started);
        b.tick(0.5);
        assert_eq!(b.activate(1.0), BoostActivation::Extended);
        assert!((b.remaining() - 1.5).abs() < 1e-6);
        assert_eq!(b.activate(3.0), BoostActivation::Extended);
        assert_eq!(b.remaining(), 3.0);
    }

    #[test]
    fn expires_and_never_goes_negative() {
        let mut b = BoostState::default();
        b.activate(0.1);
        assert!(!b.tick(0.05));
        assert!(b.tick(0.2));
        assert_eq!(b, BoostState::Idle);
        assert_eq!(b.remaining(), 0.0);
        assert!(!b.tick(1.0));
    }

    #[test]
    fn bad_durations_are_rejected() {
        let mut b = BoostState::default();
        assert_eq!(b.activate(0.0), BoostActivation::Rejected);
        assert_eq!(b.activate(f32::NAN), BoostActivation::Rejected);
        assert_eq!(b.activate(-1.0), BoostActivation::Rejected);
        assert!(!b.is_active());
    }

    #[test]
    fn multipliers_only_apply_while_active() {
        let cfg = BoostConfig::default();
        let mut b = BoostState::default();
        assert_eq!(b.power_multiplier(&cfg), 1.0);
        assert_eq!(b.max_speed(&cfg, 30.0), 30.0);
        b.activate(2.0);
        assert_eq!(b.power_multiplier(&cfg), cfg.power_multiplier);
        assert!((b.max_speed(&cfg, 30.0) - 45.0).abs() < 1e-5);
    }
}
