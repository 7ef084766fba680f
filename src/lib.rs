//! arcade-drive: raycast arcade vehicle model on top of rapier3d.
//!
//! The force model in [`dynamics`] is engine agnostic and only sees the
//! [`host`] traits; [`physics`] hosts any number of vehicles in a rapier world.

pub mod boost;
pub mod config;
pub mod curve;
pub mod debug_builders;
pub mod drift;
pub mod dynamics;
pub mod error;
pub mod host;
pub mod physics;
pub mod stability;
pub mod state;
pub mod vehicle;

#[cfg(test)]
mod test_support;

pub use boost::{BoostActivation, BoostState};
pub use config::VehicleConfig;
pub use drift::DriftState;
pub use dynamics::types::{DriverInput, WheelId};
pub use error::{ConfigError, WorldError};
pub use host::{ChassisBody, WorldQuery};
pub use physics::PhysicsWorld;
pub use state::{VehicleSnapshot, WorldSnapshot};
pub use vehicle::Vehicle;
