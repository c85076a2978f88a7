//! Real-time sensor readings over Socket.IO

mod connection;
pub mod protocol;

pub use connection::{ConnectionState, LiveOptions, LiveSubscriber};
