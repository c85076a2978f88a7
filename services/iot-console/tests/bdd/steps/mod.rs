//! BDD step definitions for iot-console

pub mod api_steps;
pub mod control_steps;
pub mod merge_steps;
