//! Core shared types for the per-wheel force model (engine-agnostic).
// dynamics/types.rs
use std::fmt;

use nalgebra::{Point3, Vector3};
use serde::Serialize;

pub type Vec3 = Vector3<f32>;
pub type Pt3 = Point3<f32>;

// ============================================
// Wheel identification
// ============================================

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum WheelId { FL, FR, RL, RR }

impl WheelId {
    pub const ALL: [WheelId; 4] = [WheelId::FL, WheelId::FR, WheelId::RL, WheelId::RR];

    pub fn index(self) -> usize {
        match self {
            WheelId::FL => 0,
            WheelId::FR => 1,
            WheelId::RL => 2,
            WheelId::RR => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WheelId::FL => "FL",
            WheelId::FR => "FR",
            WheelId::RL => "RL",
            WheelId::RR => "RR",
        }
    }

    /// Front wheels steer.
    pub fn is_front(&self) -> bool {
        matches!(self, WheelId::FL | WheelId::FR)
    }

    /// Rear wheels drive.
    pub fn is_rear(&self) -> bool {
        matches!(self, WheelId::RL | WheelId::RR)
    }
}

impl fmt::Display for WheelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// ----- driver input -------------------------
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriverInput {
    pub throttle: f32,     // -1..1
    pub steer: f32,        // -1..1 (+ = right)
    pub drift_held: bool,
    /// Optional slope angle (radians) from a terrain query; replaces the
    /// per-wheel ground-normal slope when present.
    pub surface_slope_override: Option<f32>,
}

impl DriverInput {
    pub fn new(throttle: f32, steer: f32) -> Self {
        Self { throttle, steer, ..Self::default() }
    }

    pub fn with_drift(mut self, held: bool) -> Self {
        self.drift_held = held;
        self
    }

    /// Clamp axes into range; NaN axes read as released.
    pub fn sanitized(self) -> Self {
        let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        Self {
            throttle: axis(self.throttle),
            steer: axis(self.steer),
            drift_held: self.drift_held,
            surface_slope_override: self.surface_slope_override.filter(|a| a.is_finite()),
        }
    }

    pub fn magnitude(&self) -> f32 {
        self.throttle.abs().max(self.steer.abs())
    }
}

// ============================================
// ----- wheel pose + contact -----------------
// ============================================

/// World-space pose of one wheel mount, recomputed from the chassis every step.
#[derive(Debug, Clone, Copy)]
pub struct WheelFrame {
    pub id: WheelId,
    pub position: Pt3,
    pub up: Vec3,
    pub right: Vec3,
    pub forward: Vec3,
}

/// Result of a ground probe along the wheel's down axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub distance: f32,
    pub point: Pt3,
    pub normal: Vec3,
}

// ============================================
// ----- per-step solve inputs / outputs ------
// ============================================

#[derive(Debug, Clone, Copy)]
pub struct SolveContext {
    pub dt: f32,                // s (fixed step)
    pub chassis_mass: f32,      // kg
    pub driven_wheels: f32,     // RL+RR => 2.0

    pub throttle: f32,          // -1..1
    pub steer_angle: f32,       // filtered, radians

    pub boosting: bool,
    pub front_grip: f32,        // 1.0 unless drifting
    pub rear_grip: f32,         // 1.0 unless drifting
    pub power_multiplier: f32,  // boost/drift power gain on top of throttle
    pub slope_override: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveMode {
    Drive,
    Brake,
    Reverse,
    Rolling,
    Idle,
    SlopeLimited,
}

#[derive(Debug, Clone, Copy)]
pub struct WheelSolution {
    pub id: WheelId,
    pub apply_point: Pt3,

    pub suspension: Vec3,
    pub lateral: Vec3,
    pub drive: Vec3,

    pub compression: f32,
    pub slip_speed: f32,
    pub forward_speed: f32,
    pub mode: DriveMode,
    pub hard_landing: bool,
}

impl WheelSolution {
    pub fn total(&self) -> Vec3 {
        self.suspension + self.lateral + self.drive
    }

    pub fn is_finite(&self) -> bool {
        self.total().iter().all(|v| v.is_finite())
    }
}
