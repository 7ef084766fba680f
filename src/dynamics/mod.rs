//! dynamics - engine-agnostic vehicle force model (pure types + per-wheel solver)

pub mod types;
pub mod kinematics;
pub mod suspension;
pub mod lateral;
pub mod longitudinal;
pub mod steering;
pub mod solve;

pub use types::*;
pub use solve::{solve_step, ChassisMotion};
