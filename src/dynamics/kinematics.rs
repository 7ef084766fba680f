// ==============================================================================
// kinematics.rs — WHEEL BASIS + SLIP DECOMPOSITION (WORLD SPACE)
// ------------------------------------------------------------------------------
// Converts the chassis pose into per-wheel world frames and projects point
// velocities onto them.
//
// Chassis local axes: +Y up, +X right, -Z forward (right-handed).
// Steering sign: positive angle turns the wheel to the RIGHT, which in a
// right-handed Y-up frame is a negative rotation about up.
//
// wheel_frame(...):
// - mount position + up/right/forward rotated into world space
//
// steered_lateral(...):
// - front wheels: right axis rotated by the steering angle about wheel up
// - rear wheels: right axis unchanged
//
// slip_components(point_vel, forward, side):
//     v_long = dot(v, forward)
//     v_lat  = dot(v, side)
// ==============================================================================

use nalgebra::{Isometry3, Unit, UnitQuaternion};

use crate::dynamics::types::{Pt3, Vec3, WheelFrame, WheelId};

pub const WORLD_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

pub const LOCAL_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
pub const LOCAL_RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);
pub const LOCAL_FORWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Below this length a direction is treated as undefined.
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// World-space velocity of an arbitrary point rigidly attached to the body:
/// v(p) = v_com + ω × (p - com)
#[inline]
pub fn point_velocity(linvel: Vec3, angvel: Vec3, com: Pt3, p: Pt3) -> Vec3 {
    let r = p.coords - com.coords;
    linvel + angvel.cross(&r)
}

#[inline]
pub fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let n = v.norm();
    if n.is_finite() && n > DIRECTION_EPSILON { v / n } else { fallback }
}

/// Chassis basis in world space: (up, right, forward).
#[inline]
pub fn chassis_axes(pose: &Isometry3<f32>) -> (Vec3, Vec3, Vec3) {
    let rot = pose.rotation;
    (
        safe_normalize(rot * LOCAL_UP, WORLD_UP),
        safe_normalize(rot * LOCAL_RIGHT, LOCAL_RIGHT),
        safe_normalize(rot * LOCAL_FORWARD, LOCAL_FORWARD),
    )
}

pub fn wheel_frame(pose: &Isometry3<f32>, id: WheelId, local_position: Pt3) -> WheelFrame {
    let (up, right, forward) = chassis_axes(pose);
    WheelFrame {
        id,
        position: pose * local_position,
        up,
        right,
        forward,
    }
}

/// Lateral (slip) axis for a wheel after steering.
#[inline]
pub fn steered_lateral(frame: &WheelFrame, steer_angle: f32) -> Vec3 {
    if !frame.id.is_front() || steer_angle.abs() < 1e-6 {
        return frame.right;
    }
    let axis = Unit::new_unchecked(frame.up);
    let steer_rot = UnitQuaternion::from_axis_angle(&axis, -steer_angle);
    safe_normalize(steer_rot * frame.right, frame.right)
}

/// Compute (v_long, v_lat) given point velocity and wheel basis.
#[inline]
pub fn slip_components(point_vel: Vec3, wheel_forward: Vec3, wheel_side: Vec3) -> (f32, f32) {
    (point_vel.dot(&wheel_forward), point_vel.dot(&wheel_side))
}

/// Angle between a surface normal and world up. Degenerate normals read as flat.
#[inline]
pub fn slope_angle(normal: Vec3) -> f32 {
    let n = safe_normalize(normal, WORLD_UP);
    n.dot(&WORLD_UP).clamp(-1.0, 1.0).acos()
}

/// Signed planar angle of `velocity` relative to `forward` (+ = sliding right).
/// Returns 0 below `min_speed` where the heading of the velocity is noise.
#[inline]
pub fn signed_slip_angle(velocity: Vec3, forward: Vec3, right: Vec3, min_speed: f32) -> f32 {
    let (v_long, v_lat) = slip_components(velocity, forward, right);
    if (v_long * v_long + v_lat * v_lat).sqrt() < min_speed.max(DIRECTION_EPSILON) {
        return 0.0;
    }
    v_lat.atan2(v_long)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, Vector3};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn identity_pose_uses_local_axes() {
        let pose = Isometry3::identity();
        let f = wheel_frame(&pose, WheelId::FL, Pt3::new(-0.85, -0.2, -1.4));
        assert!(approx(f.up, LOCAL_UP));
        assert!(approx(f.right, LOCAL_RIGHT));
        assert!(approx(f.forward, LOCAL_FORWARD));
        assert!(approx(f.position.coords, Vec3::new(-0.85, -0.2, -1.4)));
        // right-handed: right = forward × up
        assert!(approx(f.forward.cross(&f.up), f.right));
    }

    #[test]
    fn yawed_pose_rotates_mount_and_axes() {
        let rot = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        let pose = Isometry3::from_parts(Translation3::new(1.0, 2.0, 3.0), rot);
        let f = wheel_frame(&pose, WheelId::RR, Pt3::new(0.0, 0.0, 1.0));
        // +90° about Y maps -Z (forward) to -X
        assert!(approx(f.forward, Vec3::new(-1.0, 0.0, 0.0)));
        assert!(approx(f.position.coords, Vec3::new(2.0, 2.0, 3.0)));
    }

    #[test]
    fn positive_steer_turns_front_lateral_towards_forward() {
        let pose = Isometry3::identity();
        let f = wheel_frame(&pose, WheelId::FR, Pt3::origin());
        let lat = steered_lateral(&f, 0.3);
        // wheel heading turns right, so its lateral axis swings towards the rear (+Z)
        assert!(lat.z > 0.0);
        assert!((lat.norm() - 1.0).abs() < 1e-5);

        let rear = wheel_frame(&pose, WheelId::RL, Pt3::origin());
        assert!(approx(steered_lateral(&rear, 0.3), rear.right));
    }

    #[test]
    fn point_velocity_includes_rotation() {
        let v = point_velocity(
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
            Pt3::origin(),
            Pt3::new(1.0, 0.0, 0.0),
        );
        assert!(approx(v, Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn degenerate_vectors_fall_back() {
        assert_eq!(safe_normalize(Vec3::zeros(), WORLD_UP), WORLD_UP);
        assert_eq!(safe_normalize(Vec3::new(f32::NAN, 0.0, 0.0), WORLD_UP), WORLD_UP);
        assert_eq!(slope_angle(Vec3::zeros()), 0.0);
        assert_eq!(signed_slip_angle(Vec3::zeros(), LOCAL_FORWARD, LOCAL_RIGHT, 0.5), 0.0);
    }

    #[test]
    fn slip_angle_sign_follows_right_axis() {
        let v = Vec3::new(1.0, 0.0, -1.0); // forward + right
        let a = signed_slip_angle(v, LOCAL_FORWARD, LOCAL_RIGHT, 0.1);
        assert!((a - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
    }
}
