//! Systems module - the simulation steps and the ECS systems driving them.

pub mod collision;
pub mod debug;
pub mod flight;
pub mod kinematics;
pub mod logic;
pub mod surface;
