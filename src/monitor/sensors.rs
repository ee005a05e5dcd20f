//! Air quality and light readings mapped to an ambient animation.

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::api::{Readings, RobotClient, RobotError};
use crate::app::{AppMessage, MessageSender};
use crate::config;
use crate::state::{Animation, KioskEvent};

/// Pick the animation for one pair of readings.
///
/// The eCO2 band is applied first; low light then overrides it. Missing
/// metrics never match.
pub fn select_animation(air: &Readings, light: &Readings) -> Animation {
    let mut animation = Animation::Default;

    if let Some(eco2) = air.get(config::ECO2_KEY) {
        if (config::ECO2_WARNING..config::ECO2_ALERT).contains(&eco2) {
            animation = Animation::Warning;
        } else if (config::ECO2_ALERT..config::ECO2_CEILING).contains(&eco2) {
            animation = Animation::Alert;
        }
    }

    if let Some(intensity) = light.get(config::LIGHT_KEY) {
        if intensity < config::LIGHT_DARK_BELOW {
            animation = Animation::Dark;
        }
    }

    animation
}

/// Edge-triggered selection: reports a choice only when it changes
#[derive(Debug, Default)]
pub struct AnimationSelector {
    previous: Option<Animation>,
}

impl AnimationSelector {
    pub fn update(&mut self, air: &Readings, light: &Readings) -> Option<Animation> {
        let animation = select_animation(air, light);
        if self.previous == Some(animation) {
            return None;
        }
        self.previous = Some(animation);
        Some(animation)
    }

    /// Forget the previous choice so the next sample is always reported
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// Poll both sensors every second until shutdown or the first failure
pub async fn run(
    robot: &RobotClient,
    tx: &MessageSender,
    resync: &Notify,
    shutdown: &CancellationToken,
) {
    match poll(robot, tx, resync, shutdown).await {
        Ok(()) => log::info!("Sensor polling stopped"),
        Err(e) => log::error!("Sensor polling aborted: {}", e),
    }
}

async fn poll(
    robot: &RobotClient,
    tx: &MessageSender,
    resync: &Notify,
    shutdown: &CancellationToken,
) -> Result<(), RobotError> {
    let mut selector = AnimationSelector::default();
    let mut ticker = super::poll_interval(config::SENSOR_POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = resync.notified() => {
                log::debug!("Resetting sensor selection");
                selector.reset();
                continue;
            }
            _ = ticker.tick() => {}
        }

        let air = robot.get_readings(config::AIR_SENSOR).await?;
        let light = robot.get_readings(config::LIGHT_SENSOR).await?;

        if let Some(animation) = selector.update(&air, &light) {
            log::info!("Sensor selection changed to {:?}", animation);
            tx.send(AppMessage::Event(KioskEvent::VideoChange(animation)));
        }
    }
}
