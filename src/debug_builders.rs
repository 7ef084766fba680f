// ==============================================================================
// debug_builders.rs — DEBUG OVERLAY + WHEEL VISUAL POSES
// ------------------------------------------------------------------------------
// Defines serializable, render-facing primitives:
// - DebugRay:    suspension probes (green = hit, red = airborne)
// - DebugWheel:  per-wheel numeric state (compression, slip, drive mode)
// - DebugSlipRay: lateral correction direction/magnitude
// - WheelVisual: where a wheel mesh should sit (centre, steer, spin)
//
// Helpers:
// - build_wheel_ray(): probe origin / direction / length for one mount
// - wheel_center():    contact point + up * radius, or fully extended
// - push_wheel_debug(): pushes DebugWheel snapshots into DebugOverlay
//
// Purely cosmetic. Nothing here feeds back into the force model.
// ==============================================================================

use std::f32::consts::TAU;

use serde::Serialize;

use crate::config::SuspensionConfig;
use crate::dynamics::types::{DriveMode, GroundHit, Pt3, Vec3, WheelFrame, WheelId, WheelSolution};

#[derive(Clone, Debug, Default, Serialize)]
pub struct DebugOverlay {
    pub chassis: Option<DebugChassis>,
    pub suspension_rays: Vec<DebugRay>,
    pub wheels: Vec<DebugWheel>,
    pub slip_vectors: Vec<DebugSlipRay>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub length: f32,
    pub hit: Option<[f32; 3]>,
    pub color: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugChassis {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (x, y, z, w)
    pub half_extents: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugSlipRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub magnitude: f32,
    pub color: [f32; 3],
}

impl DebugOverlay {
    pub fn clear(&mut self) {
        self.chassis = None;
        self.suspension_rays.clear();
        self.wheels.clear();
        self.slip_vectors.clear();
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugWheel {
    pub id: WheelId,
    pub center: [f32; 3],           // world space
    pub radius: f32,
    pub grounded: bool,
    pub compression: f32,
    pub slip_speed: f32,
    pub mode: Option<DriveMode>,
    pub steer: f32,
    pub hard_landing: bool,
}

pub fn push_wheel_debug(
    overlay: &mut DebugOverlay,
    visual: &WheelVisual,
    radius: f32,
    solution: Option<&WheelSolution>,
) {
    overlay.wheels.push(DebugWheel {
        id: visual.id,
        center: visual.center,
        radius,
        grounded: visual.grounded,
        compression: solution.map_or(0.0, |s| s.compression),
        slip_speed: solution.map_or(0.0, |s| s.slip_speed),
        mode: solution.map(|s| s.mode),
        steer: visual.steer,
        hard_landing: solution.is_some_and(|s| s.hard_landing),
    });

    if let Some(s) = solution {
        let mag = s.lateral.norm();
        if mag > 1e-3 {
            let dir = s.lateral / mag;
            overlay.slip_vectors.push(DebugSlipRay {
                origin: s.apply_point.into(),
                direction: dir.into(),
                magnitude: mag,
                color: [1.0, 0.6, 0.0],
            });
        }
    }
}

pub struct WheelRay {
    pub origin: Pt3,
    pub dir: Vec3,
    pub max_dist: f32,
}

pub fn build_wheel_ray(frame: &WheelFrame, suspension: &SuspensionConfig) -> WheelRay {
    WheelRay {
        origin: frame.position,
        dir: -frame.up,
        max_dist: suspension.probe_length(),
    }
}

pub fn push_ray_debug(overlay: &mut DebugOverlay, ray: &WheelRay, hit: Option<&GroundHit>) {
    overlay.suspension_rays.push(DebugRay {
        origin: ray.origin.into(),
        direction: ray.dir.into(),
        length: hit.map_or(ray.max_dist, |h| h.distance),
        hit: hit.map(|h| h.point.into()),
        color: if hit.is_some() { [0.0, 1.0, 0.0] } else { [1.0, 0.0, 0.0] },
    });
}

// ============================================
// ----- wheel visuals ------------------------
// ============================================

#[derive(Clone, Copy, Debug, Serialize)]
pub struct WheelVisual {
    pub id: WheelId,
    pub center: [f32; 3], // world space
    pub steer: f32,       // radians, front wheels only
    pub spin: f32,        // radians, wrapped to [0, 2π)
    pub grounded: bool,
}

impl WheelVisual {
    pub fn new(id: WheelId) -> Self {
        Self { id, center: [0.0; 3], steer: 0.0, spin: 0.0, grounded: false }
    }
}

/// Wheel centre: on the contact point lifted by the radius, or hanging at the
/// end of the probe when airborne.
pub fn wheel_center(frame: &WheelFrame, hit: Option<&GroundHit>, suspension: &SuspensionConfig) -> Pt3 {
    match hit {
        Some(h) => h.point + frame.up * suspension.wheel_radius,
        None => frame.position - frame.up * (suspension.probe_length() - suspension.wheel_radius),
    }
}

pub fn update_wheel_visual(
    visual: &mut WheelVisual,
    frame: &WheelFrame,
    hit: Option<&GroundHit>,
    suspension: &SuspensionConfig,
    steer_angle: f32,
    rolling_speed: f32,
    dt: f32,
) {
    visual.center = wheel_center(frame, hit, suspension).into();
    visual.grounded = hit.is_some();
    visual.steer = if frame.id.is_front() { steer_angle } else { 0.0 };

    let spin = visual.spin + rolling_speed / suspension.wheel_radius * dt;
    visual.spin = if spin.is_finite() { spin.rem_euclid(TAU) } else { 0.0 };
}
