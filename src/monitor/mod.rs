//! Background polling of the robot's sensors and calendar.
//!
//! Both pollers share one connection and one cancellation token. Results
//! reach the GTK loop only through the [`MessageSender`] channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::RobotClient;
use crate::app::{AppMessage, MessageSender};
use crate::config::{self, Credentials};
use crate::state::KioskEvent;

pub mod meetings;
pub mod sensors;

/// Connect to the robot and run the sensor and meeting pollers until shutdown
pub async fn run(tx: MessageSender, resync: Arc<Notify>, shutdown: CancellationToken) {
    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            log::error!("Cannot connect to robot: {}", e);
            tx.send(AppMessage::Event(KioskEvent::Message(
                "Sensor service not configured".into(),
            )));
            return;
        }
    };

    let address = config::robot_address();
    let robot = tokio::select! {
        _ = shutdown.cancelled() => return,
        result = RobotClient::connect(&address, &credentials) => match result {
            Ok(robot) => robot,
            Err(e) => {
                log::error!("Failed to connect to robot at {}: {}", address, e);
                tx.send(AppMessage::Event(KioskEvent::Message(
                    "Sensor service unavailable".into(),
                )));
                return;
            }
        },
    };

    tokio::join!(
        sensors::run(&robot, &tx, &resync, &shutdown),
        meetings::run(&robot, &tx, &shutdown),
    );

    robot.close().await;
}

/// Poll ticker that waits a full period after a slow poll instead of catching up
pub fn poll_interval(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
