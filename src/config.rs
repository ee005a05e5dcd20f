//! Configuration constants for the Pomodoro kiosk.

use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

/// Default robot address, overridable with `POMODORO_ROBOT_ADDRESS`
pub const ROBOT_ADDRESS: &str = "https://pomodoro-main.local:8080";

/// Environment variables holding the API key pair
pub const API_KEY_ID_ENV: &str = "POMODORO_API_KEY_ID";
pub const API_KEY_ENV: &str = "POMODORO_API_KEY";
pub const ROBOT_ADDRESS_ENV: &str = "POMODORO_ROBOT_ADDRESS";

/// Remote request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Air quality sensor resource and its metric
pub const AIR_SENSOR: &str = "ENS160";
pub const ECO2_KEY: &str = "eCO2";

/// Ambient light sensor resource and its metric
pub const LIGHT_SENSOR: &str = "TEMT6000";
pub const LIGHT_KEY: &str = "light_intensity";

/// Generic calendar service resource
pub const CALENDAR_SERVICE: &str = "Calendar";

/// eCO2 bands: [WARNING, ALERT) is warning, [ALERT, CEILING) is alert
pub const ECO2_WARNING: f64 = 500.0;
pub const ECO2_ALERT: f64 = 750.0;
pub const ECO2_CEILING: f64 = 1500.0;

/// Light intensity below this shows the dark animation
pub const LIGHT_DARK_BELOW: f64 = 10.0;

/// Animation clips, relative to the working directory
pub const DEFAULT_VIDEO: &str = "animations/blink.mp4";
pub const WARNING_VIDEO: &str = "animations/yellow.mp4";
pub const ALERT_VIDEO: &str = "animations/red.mp4";
pub const DARK_VIDEO: &str = "animations/black.mp4";

pub const SENSOR_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const MEETING_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// How far ahead a meeting counts as imminent
pub const MEETING_LOOKAHEAD_MINUTES: i64 = 15;

/// Upper bound on events requested per calendar poll
pub const MAX_CALENDAR_EVENTS: u32 = 10;

/// Timezone meetings are evaluated and displayed in
pub const TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Pomodoro length in seconds (25 minutes)
pub const POMODORO_SECONDS: u32 = 1500;

/// GPIO button wiring
pub const GPIO_CHIP: &str = "/dev/gpiochip0";
pub const BUTTON_LINE: u32 = 17;
pub const BUTTON_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How often the GTK loop drains the event channel
pub const QUEUE_DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// Grace period for background tasks at shutdown
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// API key pair for the robot connection
#[derive(Clone)]
pub struct Credentials {
    pub api_key_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key_id", &self.api_key_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key_id: env_var(API_KEY_ID_ENV)?,
            api_key: env_var(API_KEY_ENV)?,
        })
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnv(name))
}

/// Robot address, from the environment if set
pub fn robot_address() -> String {
    std::env::var(ROBOT_ADDRESS_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| ROBOT_ADDRESS.to_string())
}
