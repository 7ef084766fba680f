use serde::Serialize;

use crate::boost::BoostState;
use crate::debug_builders::WheelVisual;
use crate::drift::DriftState;
use crate::host::ChassisBody;
use crate::vehicle::Vehicle;

// Read-only views handed to collaborators (HUD, audio, camera, replays).
// Everything here is plain data; building one never touches the body.

#[derive(Debug, Clone, Serialize)]
pub struct VehicleSnapshot {
    pub id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (x, y, z, w)
    pub linvel: [f32; 3],

    pub speed: f32,          // |v|
    pub forward_speed: f32,  // + forward, - reversing
    pub steer_angle: f32,    // radians, filtered

    pub boost: BoostState,
    pub boosting: bool,
    pub boost_remaining: f32,
    pub effective_max_speed: f32,

    pub drift: DriftState,
    pub drifting: bool,
    pub drift_angle: f32,

    pub asleep: bool,
    pub enabled: bool,
    pub wheels: [WheelVisual; 4],
}

impl VehicleSnapshot {
    pub fn capture<B: ChassisBody + ?Sized>(id: &str, vehicle: &Vehicle, body: &B) -> Self {
        let pose = body.pose();
        Self {
            id: id.to_string(),
            position: pose.translation.vector.into(),
            rotation: pose.rotation.coords.into(),
            linvel: body.linvel().into(),
            speed: vehicle.current_speed(),
            forward_speed: vehicle.forward_speed(),
            steer_angle: vehicle.steer_angle(),
            boost: vehicle.boost_state(),
            boosting: vehicle.is_boosting(),
            boost_remaining: vehicle.boost_time_remaining(),
            effective_max_speed: vehicle.effective_max_speed(),
            drift: vehicle.drift_state(),
            drifting: vehicle.is_drifting(),
            drift_angle: vehicle.drift_angle(),
            asleep: vehicle.is_asleep(),
            enabled: vehicle.is_enabled(),
            wheels: *vehicle.wheel_visuals(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub time: f32, // s of simulated time
    pub vehicles: Vec<VehicleSnapshot>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
