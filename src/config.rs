// ==============================================================================
// config.rs — VEHICLE TUNING SURFACE
// ------------------------------------------------------------------------------
// One flat, serde-loadable configuration per vehicle, read at spawn time.
// Every group uses #[serde(default)] so a JSON file only has to name the
// fields it overrides. `validate()` runs before a Vehicle can be built.
//
// Conventions (chassis local space):
// - +Y up, +X right, -Z forward
// - wheel order FL, FR, RL, RR
// - angles in radians, speeds in m/s, forces in N
// ==============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::curve::ResponseCurve;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    pub mass: f32,                  // kg
    pub half_extents: [f32; 3],     // [hx, hy, hz] meters
    pub com_offset: [f32; 3],       // local, lowered for rollover resistance
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            mass: 1500.0,
            half_extents: [1.0, 0.4, 2.0],
            com_offset: [0.0, -0.5, 0.0],
            linear_damping: 0.0,
            angular_damping: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspensionConfig {
    pub rest_length: f32,             // m
    pub stiffness: f32,               // N/m
    pub damping: f32,                 // N*s/m
    pub max_travel: f32,              // m, probe reaches rest_length + max_travel
    pub wheel_radius: f32,            // m
    pub landing_multiplier: f32,      // spring gain on hard impacts
    pub hard_landing_speed: f32,      // m/s (closing speed along wheel up)
    pub landing_min_compression: f32, // m
}

impl Default for SuspensionConfig {
    fn default() -> Self {
        Self {
            rest_length: 0.6,
            stiffness: 35_000.0,
            damping: 4_500.0,
            max_travel: 0.3,
            wheel_radius: 0.3,
            landing_multiplier: 2.0,
            hard_landing_speed: 5.0,
            landing_min_compression: 0.05,
        }
    }
}

impl SuspensionConfig {
    pub fn probe_length(&self) -> f32 {
        self.rest_length + self.max_travel
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TireConfig {
    pub sideways_grip: f32,
    pub forward_grip: f32,              // rolling resistance factor
    pub rolling_resistance_scale: f32,  // N per unit of forward_grip
    pub tire_mass: f32,                 // kg, F = m * dv / dt
}

impl Default for TireConfig {
    fn default() -> Self {
        Self {
            sideways_grip: 3.5,
            forward_grip: 2.5,
            rolling_resistance_scale: 1000.0,
            tire_mass: 15.0,
        }
    }
}

impl TireConfig {
    pub fn rolling_resistance(&self) -> f32 {
        self.forward_grip * self.rolling_resistance_scale
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub motor_power: f32,        // N per driven wheel
    pub reverse_power: f32,      // N per driven wheel
    pub brake_power: f32,        // N per driven wheel
    pub max_speed: f32,          // m/s
    pub max_reverse_speed: f32,  // m/s
    pub power_curve: ResponseCurve,
    pub reverse_uses_curve: bool,
    pub brake_engage_speed: f32, // forward speed above which negative throttle brakes
    pub rolling_deadband: f32,   // m/s
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            motor_power: 18_000.0,
            reverse_power: 10_000.0,
            brake_power: 25_000.0,
            max_speed: 30.0,
            max_reverse_speed: 10.0,
            power_curve: ResponseCurve::ease_in_out(0.0, 1.0, 30.0, 0.3),
            reverse_uses_curve: false,
            brake_engage_speed: 1.0,
            rolling_deadband: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub max_angle: f32,     // radians
    pub response_rate: f32, // 1/s, low-pass rate towards the target angle
    pub speed_curve: ResponseCurve,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            max_angle: 25f32.to_radians(),
            response_rate: 8.0,
            speed_curve: ResponseCurve::linear(0.0, 1.0, 30.0, 0.4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub max_angular_velocity: f32, // rad/s
    pub sleep_linear: f32,         // m/s
    pub sleep_angular: f32,        // rad/s
    pub sleep_input: f32,          // |throttle| / |steer|
    pub sleep_delay: f32,          // s all thresholds must hold before sleeping
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            max_angular_velocity: 3.5,
            sleep_linear: 0.1,
            sleep_angular: 0.1,
            sleep_input: 0.01,
            sleep_delay: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    pub enabled: bool,
    pub power_multiplier: f32,
    pub max_speed_multiplier: f32,
    pub initial_kick: f32,      // m/s velocity change on activation
    pub default_duration: f32,  // s, used by pickups that do not specify one
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            power_multiplier: 1.3,
            max_speed_multiplier: 1.5,
            initial_kick: 8.0,
            default_duration: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub enabled: bool,
    pub min_speed: f32,             // m/s of |forward speed| to enter
    pub steer_deadzone: f32,        // |steer| must exceed this to enter
    pub side_grip_multiplier: f32,  // all wheels while drifting
    pub rear_grip_multiplier: f32,  // extra, rear wheels only
    pub steer_multiplier: f32,      // steering authority while drifting
    pub yaw_torque: f32,            // N*m at full steer towards the locked side
    pub counter_steer_torque: f32,  // N*m per rad/s of yaw rate when steering against
    pub exit_snappiness: f32,       // fraction of sideways velocity removed on release
    pub exit_angular_damping: f32,  // angular velocity scale on release
    pub power_multiplier: f32,      // drive power while sliding
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_speed: 8.0,
            steer_deadzone: 0.1,
            side_grip_multiplier: 0.5,
            rear_grip_multiplier: 0.6,
            steer_multiplier: 1.3,
            yaw_torque: 5_000.0,
            counter_steer_torque: 4_000.0,
            exit_snappiness: 0.6,
            exit_angular_damping: 0.5,
            power_multiplier: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeConfig {
    pub enabled: bool,
    pub max_drive_angle: f32, // radians between ground normal and world up
}

impl Default for SlopeConfig {
    fn default() -> Self {
        Self { enabled: true, max_drive_angle: 45f32.to_radians() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub chassis: ChassisConfig,
    pub wheels: [[f32; 3]; 4], // mount positions, FL FR RL RR
    pub suspension: SuspensionConfig,
    pub tire: TireConfig,
    pub drive: DriveConfig,
    pub steering: SteeringConfig,
    pub stability: StabilityConfig,
    pub boost: BoostConfig,
    pub drift: DriftConfig,
    pub slope: SlopeConfig,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            chassis: ChassisConfig::default(),
            wheels: [
                [-0.85, -0.2, -1.4],
                [0.85, -0.2, -1.4],
                [-0.85, -0.2, 1.4],
                [0.85, -0.2, 1.4],
            ],
            suspension: SuspensionConfig::default(),
            tire: TireConfig::default(),
            drive: DriveConfig::default(),
            steering: SteeringConfig::default(),
            stability: StabilityConfig::default(),
            boost: BoostConfig::default(),
            drift: DriftConfig::default(),
            slope: SlopeConfig::default(),
        }
    }
}

impl VehicleConfig {
    /// Parse a (possibly partial) JSON document and validate the result.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: VehicleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.chassis;
        positive("chassis.mass", c.mass)?;
        for (i, h) in c.half_extents.iter().enumerate() {
            positive(["chassis.half_extents.x", "chassis.half_extents.y", "chassis.half_extents.z"][i], *h)?;
        }
        for v in c.com_offset {
            finite("chassis.com_offset", v)?;
        }
        non_negative("chassis.linear_damping", c.linear_damping)?;
        non_negative("chassis.angular_damping", c.angular_damping)?;

        for v in self.wheels.iter().flatten() {
            finite("wheels", *v)?;
        }

        let s = &self.suspension;
        positive("suspension.rest_length", s.rest_length)?;
        positive("suspension.stiffness", s.stiffness)?;
        non_negative("suspension.damping", s.damping)?;
        non_negative("suspension.max_travel", s.max_travel)?;
        positive("suspension.wheel_radius", s.wheel_radius)?;
        at_least("suspension.landing_multiplier", s.landing_multiplier, 1.0)?;
        non_negative("suspension.hard_landing_speed", s.hard_landing_speed)?;
        non_negative("suspension.landing_min_compression", s.landing_min_compression)?;

        let t = &self.tire;
        non_negative("tire.sideways_grip", t.sideways_grip)?;
        non_negative("tire.forward_grip", t.forward_grip)?;
        non_negative("tire.rolling_resistance_scale", t.rolling_resistance_scale)?;
        positive("tire.tire_mass", t.tire_mass)?;

        let d = &self.drive;
        non_negative("drive.motor_power", d.motor_power)?;
        non_negative("drive.reverse_power", d.reverse_power)?;
        non_negative("drive.brake_power", d.brake_power)?;
        positive("drive.max_speed", d.max_speed)?;
        positive("drive.max_reverse_speed", d.max_reverse_speed)?;
        non_negative("drive.brake_engage_speed", d.brake_engage_speed)?;
        non_negative("drive.rolling_deadband", d.rolling_deadband)?;
        curve("drive.power_curve", &d.power_curve)?;

        let st = &self.steering;
        non_negative("steering.max_angle", st.max_angle)?;
        at_most("steering.max_angle", st.max_angle, std::f32::consts::FRAC_PI_2)?;
        positive("steering.response_rate", st.response_rate)?;
        curve("steering.speed_curve", &st.speed_curve)?;

        let sb = &self.stability;
        positive("stability.max_angular_velocity", sb.max_angular_velocity)?;
        non_negative("stability.sleep_linear", sb.sleep_linear)?;
        non_negative("stability.sleep_angular", sb.sleep_angular)?;
        non_negative("stability.sleep_input", sb.sleep_input)?;
        non_negative("stability.sleep_delay", sb.sleep_delay)?;

        let b = &self.boost;
        at_least("boost.power_multiplier", b.power_multiplier, 1.0)?;
        at_least("boost.max_speed_multiplier", b.max_speed_multiplier, 1.0)?;
        non_negative("boost.initial_kick", b.initial_kick)?;
        positive("boost.default_duration", b.default_duration)?;

        let dr = &self.drift;
        non_negative("drift.min_speed", dr.min_speed)?;
        unit("drift.steer_deadzone", dr.steer_deadzone)?;
        unit("drift.side_grip_multiplier", dr.side_grip_multiplier)?;
        unit("drift.rear_grip_multiplier", dr.rear_grip_multiplier)?;
        at_least("drift.steer_multiplier", dr.steer_multiplier, 1.0)?;
        non_negative("drift.yaw_torque", dr.yaw_torque)?;
        non_negative("drift.counter_steer_torque", dr.counter_steer_torque)?;
        unit("drift.exit_snappiness", dr.exit_snappiness)?;
        unit("drift.exit_angular_damping", dr.exit_angular_damping)?;
        positive("drift.power_multiplier", dr.power_multiplier)?;

        let sl = &self.slope;
        positive("slope.max_drive_angle", sl.max_drive_angle)?;
        at_most("slope.max_drive_angle", sl.max_drive_angle, std::f32::consts::PI)?;

        Ok(())
    }
}

// ----- validation helpers -----

fn finite(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() { Ok(()) } else { Err(ConfigError::NonFinite { field }) }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    finite(field, v)?;
    if v > 0.0 { Ok(()) } else { Err(ConfigError::NotPositive { field, value: v }) }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    finite(field, v)?;
    if v >= 0.0 { Ok(()) } else { Err(ConfigError::Negative { field, value: v }) }
}

fn at_least(field: &'static str, v: f32, min: f32) -> Result<(), ConfigError> {
    finite(field, v)?;
    if v >= min {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value: v, min, max: f32::INFINITY })
    }
}

fn at_most(field: &'static str, v: f32, max: f32) -> Result<(), ConfigError> {
    if v <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value: v, min: f32::NEG_INFINITY, max })
    }
}

fn unit(field: &'static str, v: f32) -> Result<(), ConfigError> {
    finite(field, v)?;
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value: v, min: 0.0, max: 1.0 })
    }
}

fn curve(field: &'static str, c: &ResponseCurve) -> Result<(), ConfigError> {
    c.check().map_err(|reason| ConfigError::InvalidCurve { field, reason })
}
