// ==============================================================================
// host.rs — CAPABILITIES A PHYSICS BACKEND PROVIDES TO THE VEHICLE
// ------------------------------------------------------------------------------
// WorldQuery  : read-only ray casts against world geometry (ground probes)
// ChassisBody : the one rigid body the vehicle drives
//
// The vehicle model only talks to these traits. physics.rs implements them for
// rapier3d; test_support implements them with a tiny integrator.
//
// Contract notes for implementors:
// - center_of_mass() is WORLD space
// - set_linvel / set_angvel must not wake a sleeping body
// - apply_* may wake the body
// ==============================================================================

use nalgebra::Isometry3;

use crate::dynamics::kinematics;
use crate::dynamics::types::{GroundHit, Pt3, Vec3};

pub trait WorldQuery {
    /// Cast from `origin` along unit `dir` up to `max_distance`.
    fn cast_ray(&self, origin: Pt3, dir: Vec3, max_distance: f32) -> Option<GroundHit>;
}

pub trait ChassisBody {
    fn pose(&self) -> Isometry3<f32>;
    fn center_of_mass(&self) -> Pt3;
    fn mass(&self) -> f32;

    fn linvel(&self) -> Vec3;
    fn angvel(&self) -> Vec3;
    fn set_linvel(&mut self, linvel: Vec3);
    fn set_angvel(&mut self, angvel: Vec3);

    fn apply_impulse_at_point(&mut self, impulse: Vec3, point: Pt3);
    fn apply_torque_impulse(&mut self, impulse: Vec3);

    fn point_velocity(&self, point: Pt3) -> Vec3 {
        kinematics::point_velocity(self.linvel(), self.angvel(), self.center_of_mass(), point)
    }

    /// Ask the backend to stop integrating the body until woken.
    fn sleep(&mut self) {}
    fn wake_up(&mut self) {}
    /// Drop any force/torque accumulated for the current step.
    fn clear_forces(&mut self) {}
}
