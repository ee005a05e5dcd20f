//! Calendar polling and imminent meeting detection.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::RobotClient;
use crate::app::{AppMessage, MessageSender};
use crate::config;
use crate::state::KioskEvent;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unrecognised timestamp {0:?}")]
pub struct TimestampError(String);

/// One entry of the calendar service's `events` list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub start: String,
    pub end: String,
}

/// Identity used to tell new meetings from ones already announced
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MeetingKey {
    Id(String),
    Fields {
        summary: Option<String>,
        start: String,
        end: String,
    },
}

impl CalendarEvent {
    pub fn key(&self) -> MeetingKey {
        match &self.id {
            Some(id) => MeetingKey::Id(id.clone()),
            None => MeetingKey::Fields {
                summary: self.summary.clone(),
                start: self.start.clone(),
                end: self.end.clone(),
            },
        }
    }
}

/// An imminent meeting, ready to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub summary: String,
    pub start: DateTime<Tz>,
}

impl Meeting {
    /// Start time as `HH:MM`
    pub fn start_label(&self) -> String {
        self.start.format("%H:%M").to_string()
    }
}

/// Parse an ISO-8601 timestamp into `tz`.
///
/// Offset-less and date-only values are taken as local time in `tz`.
pub fn parse_timestamp(value: &str, tz: Tz) -> Result<DateTime<Tz>, TimestampError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&tz));
    }
    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.with_timezone(&tz));
        }
    }

    let naive = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    .or_else(|| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
    .ok_or_else(|| TimestampError(value.to_string()))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TimestampError(value.to_string()))
}

/// Extract the events list from a `get_events` response.
///
/// Anything malformed yields an empty list; entries without string
/// `start`/`end` fields are dropped.
pub fn parse_events(result: &serde_json::Value) -> Vec<CalendarEvent> {
    let Some(events) = result.get("events").and_then(|e| e.as_array()) else {
        log::info!("No events found or invalid response format");
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|event| match CalendarEvent::deserialize(event) {
            Ok(event) => Some(event),
            Err(e) => {
                log::debug!("Ignoring calendar entry {}: {}", event, e);
                None
            }
        })
        .collect()
}

/// Remembers which meetings were imminent on the previous poll
#[derive(Debug)]
pub struct MeetingTracker {
    tz: Tz,
    lookahead: TimeDelta,
    previous: HashSet<MeetingKey>,
}

impl MeetingTracker {
    pub fn new(tz: Tz, lookahead: TimeDelta) -> Self {
        Self {
            tz,
            lookahead,
            previous: HashSet::new(),
        }
    }

    /// Record this poll's events and return the meetings that just became imminent
    pub fn observe(&mut self, events: &[CalendarEvent], now: DateTime<Tz>) -> Vec<Meeting> {
        let now = now.with_timezone(&self.tz);
        let threshold = now + self.lookahead;

        let mut current = HashSet::new();
        let mut fresh = Vec::new();

        for event in events {
            let start = match parse_timestamp(&event.start, self.tz) {
                Ok(start) => start,
                Err(e) => {
                    log::warn!("Skipping event with invalid times: {} / {}: {}", event.start, event.end, e);
                    continue;
                }
            };

            log::debug!("Event start: {}, now: {}, threshold: {}", start, now, threshold);

            if start < now || start > threshold {
                continue;
            }

            let key = event.key();
            if !self.previous.contains(&key) && !current.contains(&key) {
                fresh.push(Meeting {
                    summary: event.summary.clone().unwrap_or_else(|| "No Summary".to_string()),
                    start,
                });
            }
            current.insert(key);
        }

        self.previous = current;
        fresh
    }
}

/// Ask the calendar service for upcoming events; failures yield an empty list
pub async fn fetch_events(robot: &RobotClient) -> Vec<CalendarEvent> {
    let command = json!({"get_events": {"max_results": config::MAX_CALENDAR_EVENTS}});

    match robot.do_command(config::CALENDAR_SERVICE, &command).await {
        Ok(result) => {
            log::debug!("Calendar response: {}", result);
            parse_events(&result)
        }
        Err(e) => {
            log::error!("Error fetching events: {}", e);
            Vec::new()
        }
    }
}

/// Check the calendar every minute and announce newly imminent meetings
pub async fn run(robot: &RobotClient, tx: &MessageSender, shutdown: &CancellationToken) {
    let mut tracker = MeetingTracker::new(
        config::TIMEZONE,
        TimeDelta::minutes(config::MEETING_LOOKAHEAD_MINUTES),
    );
    let mut ticker = super::poll_interval(config::MEETING_POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let events = tokio::select! {
            _ = shutdown.cancelled() => break,
            events = fetch_events(robot) => events,
        };

        let now = Utc::now().with_timezone(&config::TIMEZONE);
        for meeting in tracker.observe(&events, now) {
            log::info!("Upcoming meeting: {} at {}", meeting.summary, meeting.start_label());
            tx.send(AppMessage::Event(KioskEvent::MeetingImminent(meeting)));
        }
    }

    log::info!("Meeting checker stopped");
}
