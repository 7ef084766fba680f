// Test-only host: a box body with semi-implicit Euler integration and an
// infinite flat ground plane. Enough to exercise the vehicle model without
// the rapier pipeline.

use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion};

use crate::config::VehicleConfig;
use crate::dynamics::types::{GroundHit, Pt3, Vec3};
use crate::host::{ChassisBody, WorldQuery};

pub const GRAVITY: f32 = -9.81;
pub const DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone)]
pub struct TestBody {
    pub pose: Isometry3<f32>,
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub mass: f32,
    pub com_local: Pt3,
    pub inertia_local: Vec3, // principal moments
    pub sleeping: bool,
    pub gravity: bool,
    pub angular_damping: f32,
}

impl TestBody {
    pub fn for_config(cfg: &VehicleConfig, height: f32) -> Self {
        let m = cfg.chassis.mass;
        let [hx, hy, hz] = cfg.chassis.half_extents;
        let [cx, cy, cz] = cfg.chassis.com_offset;
        Self {
            pose: Isometry3::translation(0.0, height, 0.0),
            linvel: Vec3::zeros(),
            angvel: Vec3::zeros(),
            mass: m,
            com_local: Pt3::new(cx, cy, cz),
            inertia_local: Vec3::new(
                m / 3.0 * (hy * hy + hz * hz),
                m / 3.0 * (hx * hx + hz * hz),
                m / 3.0 * (hx * hx + hy * hy),
            ),
            sleeping: false,
            gravity: true,
            angular_damping: cfg.chassis.angular_damping,
        }
    }

    pub fn without_gravity(mut self) -> Self {
        self.gravity = false;
        self
    }

    pub fn forward(&self) -> Vec3 {
        self.pose.rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    pub fn forward_speed(&self) -> f32 {
        self.linvel.dot(&self.forward())
    }

    fn inv_inertia_world(&self) -> Matrix3<f32> {
        let r = self.pose.rotation.to_rotation_matrix();
        let inv = Matrix3::from_diagonal(&self.inertia_local.map(|i| 1.0 / i));
        r.matrix() * inv * r.matrix().transpose()
    }

    /// Advance the pose by one step. Sleeping bodies do not move.
    pub fn integrate(&mut self, dt: f32) {
        if self.sleeping {
            return;
        }
        if self.gravity {
            self.linvel.y += GRAVITY * dt;
        }
        self.angvel *= 1.0 / (1.0 + dt * self.angular_damping);

        // rotate about the centre of mass, not the body origin
        let com_before = self.center_of_mass();
        let dq = UnitQuaternion::from_scaled_axis(self.angvel * dt);
        let rotation = dq * self.pose.rotation;
        let com_after = com_before + self.linvel * dt;
        let origin = com_after - rotation * self.com_local.coords;
        self.pose = Isometry3::from_parts(Translation3::from(origin.coords), rotation);
    }
}

impl ChassisBody for TestBody {
    fn pose(&self) -> Isometry3<f32> {
        self.pose
    }

    fn center_of_mass(&self) -> Pt3 {
        self.pose * self.com_local
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn linvel(&self) -> Vec3 {
        self.linvel
    }

    fn angvel(&self) -> Vec3 {
        self.angvel
    }

    fn set_linvel(&mut self, linvel: Vec3) {
        self.linvel = linvel;
    }

    fn set_angvel(&mut self, angvel: Vec3) {
        self.angvel = angvel;
    }

    fn apply_impulse_at_point(&mut self, impulse: Vec3, point: Pt3) {
        self.sleeping = false;
        self.linvel += impulse / self.mass;
        let r = point - self.center_of_mass();
        self.angvel += self.inv_inertia_world() * r.cross(&impulse);
    }

    fn apply_torque_impulse(&mut self, impulse: Vec3) {
        self.sleeping = false;
        self.angvel += self.inv_inertia_world() * impulse;
    }

    fn sleep(&mut self) {
        self.sleeping = true;
        self.linvel = Vec3::zeros();
        self.angvel = Vec3::zeros();
    }

    fn wake_up(&mut self) {
        self.sleeping = false;
    }
}

/// Horizontal plane at `height`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGround {
    pub height: f32,
}

impl WorldQuery for FlatGround {
    fn cast_ray(&self, origin: Pt3, dir: Vec3, max_distance: f32) -> Option<GroundHit> {
        if dir.y >= -1e-6 {
            return None;
        }
        let t = (origin.y - self.height) / -dir.y;
        if !(0.0..=max_distance).contains(&t) {
            return None;
        }
        Some(GroundHit { distance: t, point: origin + dir * t, normal: Vec3::y() })
    }
}

/// No geometry at all.
pub struct Void;

impl WorldQuery for Void {
    fn cast_ray(&self, _origin: Pt3, _dir: Vec3, _max_distance: f32) -> Option<GroundHit> {
        None
    }
}
