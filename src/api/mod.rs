//! Client for the remote robotics service hosting the sensors and calendar.

pub mod robot;

#[cfg(test)]
pub(crate) mod test_server;

pub use robot::{Readings, RobotClient, RobotError};
