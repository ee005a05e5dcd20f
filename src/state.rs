//! GTK-free state machine and business logic.
//!
//! This module contains the pure Rust state machine that can be tested
//! independently of GTK. Background pollers and widget callbacks feed it
//! [`KioskEvent`]s; it answers with [`KioskCommand`]s for the video
//! pipeline and the window to carry out.

use crate::config;
use crate::monitor::meetings::Meeting;

/// Ambient animations, one per sensor condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Animation {
    Default,
    Warning,
    Alert,
    Dark,
}

impl Animation {
    /// Clip played for this animation
    pub fn path(self) -> &'static str {
        match self {
            Animation::Default => config::DEFAULT_VIDEO,
            Animation::Warning => config::WARNING_VIDEO,
            Animation::Alert => config::ALERT_VIDEO,
            Animation::Dark => config::DARK_VIDEO,
        }
    }
}

/// What the main window is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Looping animation
    Video(Animation),
    /// Static text in place of the video
    Message(String),
    /// Pomodoro countdown, seconds remaining
    Timer { remaining: u32 },
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum KioskEvent {
    // Background producers
    VideoChange(Animation),
    Message(String),
    ButtonPress,
    MeetingImminent(Meeting),

    // User actions
    DismissNotification,
    CancelTimer,
    Escape,

    // Internal
    TimerTick,
    Shutdown,
}

/// Commands emitted by the state machine for the UI/video layer to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskCommand {
    /// Restart the pipeline on this animation and show the video page
    PlayVideo(Animation),
    /// Stop decoding
    StopVideo,
    /// Replace the video with text
    ShowMessage(String),
    /// Show or refresh the countdown
    ShowTimer { remaining: u32 },
    /// Start the one second countdown source
    StartTimerTicks,
    /// Remove the countdown source
    StopTimerTicks,
    /// Open the fullscreen meeting notification
    ShowNotification(Meeting),
    /// Destroy the meeting notification
    CloseNotification,
    /// Ask the sensor poller to report its current choice again
    ResyncSensors,
    /// Leave the GTK main loop
    Quit,
}

/// The kiosk state machine
#[derive(Debug)]
pub struct KioskStateMachine {
    pub view: View,
    /// Meeting currently shown in the notification window
    pub notification: Option<Meeting>,
    /// Latest animation requested by the sensors
    pub animation: Animation,
}

impl Default for KioskStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl KioskStateMachine {
    pub fn new() -> Self {
        Self {
            view: View::Video(Animation::Default),
            notification: None,
            animation: Animation::Default,
        }
    }

    pub fn timer_active(&self) -> bool {
        matches!(self.view, View::Timer { .. })
    }

    /// Commands that bring up the initial view
    pub fn start(&self) -> Vec<KioskCommand> {
        vec![KioskCommand::PlayVideo(self.animation)]
    }

    /// Process an event and return commands to execute
    pub fn process(&mut self, event: KioskEvent) -> Vec<KioskCommand> {
        let mut commands = Vec::new();

        match event {
            KioskEvent::VideoChange(animation) => {
                self.animation = animation;
                // The timer owns the screen until it ends; an unchanged clip keeps playing
                if !self.timer_active() && self.view != View::Video(animation) {
                    self.view = View::Video(animation);
                    commands.push(KioskCommand::PlayVideo(animation));
                }
            }

            KioskEvent::Message(text) => {
                if !self.timer_active() {
                    self.view = View::Message(text.clone());
                    commands.push(KioskCommand::StopVideo);
                    commands.push(KioskCommand::ShowMessage(text));
                }
            }

            KioskEvent::ButtonPress => {
                if self.notification.take().is_some() {
                    commands.push(KioskCommand::CloseNotification);
                }
                if self.timer_active() {
                    commands.push(KioskCommand::StopTimerTicks);
                } else {
                    commands.push(KioskCommand::StopVideo);
                }
                self.view = View::Timer {
                    remaining: config::POMODORO_SECONDS,
                };
                commands.push(KioskCommand::ShowTimer {
                    remaining: config::POMODORO_SECONDS,
                });
                commands.push(KioskCommand::StartTimerTicks);
            }

            KioskEvent::TimerTick => {
                if let View::Timer { remaining } = self.view {
                    let remaining = remaining.saturating_sub(1);
                    self.view = View::Timer { remaining };
                    commands.push(KioskCommand::ShowTimer { remaining });
                    if remaining == 0 {
                        self.finish_timer(&mut commands);
                    }
                }
            }

            KioskEvent::CancelTimer => {
                if self.timer_active() {
                    self.finish_timer(&mut commands);
                }
            }

            KioskEvent::MeetingImminent(meeting) => {
                if self.notification.is_some() {
                    commands.push(KioskCommand::CloseNotification);
                }
                self.notification = Some(meeting.clone());
                commands.push(KioskCommand::ShowNotification(meeting));
            }

            KioskEvent::DismissNotification => {
                if self.notification.take().is_some() {
                    commands.push(KioskCommand::CloseNotification);
                    if !self.timer_active() {
                        self.show_default(&mut commands);
                    }
                }
            }

            KioskEvent::Escape => {
                if self.notification.is_some() {
                    return self.process(KioskEvent::DismissNotification);
                }
                return self.process(KioskEvent::CancelTimer);
            }

            KioskEvent::Shutdown => {
                if self.notification.take().is_some() {
                    commands.push(KioskCommand::CloseNotification);
                }
                if self.timer_active() {
                    commands.push(KioskCommand::StopTimerTicks);
                }
                commands.push(KioskCommand::StopVideo);
                commands.push(KioskCommand::Quit);
            }
        }

        commands
    }

    /// Timer over: default clip, and the sensors get to re-apply their choice
    fn finish_timer(&mut self, commands: &mut Vec<KioskCommand>) {
        commands.push(KioskCommand::StopTimerTicks);
        self.show_default(commands);
        commands.push(KioskCommand::ResyncSensors);
    }

    fn show_default(&mut self, commands: &mut Vec<KioskCommand>) {
        self.animation = Animation::Default;
        if self.view != View::Video(Animation::Default) {
            self.view = View::Video(Animation::Default);
            commands.push(KioskCommand::PlayVideo(Animation::Default));
        }
    }
}

/// Render seconds as `MM:SS`
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meeting(summary: &str) -> Meeting {
        Meeting {
            summary: summary.into(),
            start: config::TIMEZONE
                .with_ymd_and_hms(2024, 3, 4, 10, 10, 0)
                .unwrap(),
        }
    }

    fn count_notifications(cmds: &[KioskCommand]) -> usize {
        cmds.iter()
            .filter(|c| matches!(c, KioskCommand::ShowNotification(_)))
            .count()
    }

    #[test]
    fn test_initial_state() {
        let sm = KioskStateMachine::new();
        assert_eq!(sm.view, View::Video(Animation::Default));
        assert!(sm.notification.is_none());
        assert_eq!(sm.start(), vec![KioskCommand::PlayVideo(Animation::Default)]);
    }

    #[test]
    fn test_animation_paths() {
        assert_eq!(Animation::Default.path(), "animations/blink.mp4");
        assert_eq!(Animation::Warning.path(), "animations/yellow.mp4");
        assert_eq!(Animation::Alert.path(), "animations/red.mp4");
        assert_eq!(Animation::Dark.path(), "animations/black.mp4");
    }

    #[test]
    fn test_video_change_plays_animation() {
        let mut sm = KioskStateMachine::new();
        let cmds = sm.process(KioskEvent::VideoChange(Animation::Warning));
        assert_eq!(cmds, vec![KioskCommand::PlayVideo(Animation::Warning)]);
        assert_eq!(sm.view, View::Video(Animation::Warning));
    }

    #[test]
    fn test_message_replaces_video() {
        let mut sm = KioskStateMachine::new();
        let cmds = sm.process(KioskEvent::Message("Sensor service unavailable".into()));
        assert_eq!(
            cmds,
            vec![
                KioskCommand::StopVideo,
                KioskCommand::ShowMessage("Sensor service unavailable".into()),
            ]
        );

        // Next video change brings the animation back
        let cmds = sm.process(KioskEvent::VideoChange(Animation::Dark));
        assert_eq!(cmds, vec![KioskCommand::PlayVideo(Animation::Dark)]);
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(1500), "25:00");
        assert_eq!(format_countdown(1499), "24:59");
        assert_eq!(format_countdown(61), "01:01");
        assert_eq!(format_countdown(0), "00:00");
    }

    #[test]
    fn test_pomodoro_full_countdown() {
        let mut sm = KioskStateMachine::new();

        let cmds = sm.process(KioskEvent::ButtonPress);
        assert_eq!(
            cmds,
            vec![
                KioskCommand::StopVideo,
                KioskCommand::ShowTimer { remaining: 1500 },
                KioskCommand::StartTimerTicks,
            ]
        );
        assert_eq!(format_countdown(1500), "25:00");

        for expected in (1..1500).rev() {
            let cmds = sm.process(KioskEvent::TimerTick);
            assert_eq!(cmds, vec![KioskCommand::ShowTimer { remaining: expected }]);
        }

        let cmds = sm.process(KioskEvent::TimerTick);
        assert_eq!(
            cmds,
            vec![
                KioskCommand::ShowTimer { remaining: 0 },
                KioskCommand::StopTimerTicks,
                KioskCommand::PlayVideo(Animation::Default),
                KioskCommand::ResyncSensors,
            ]
        );
        assert_eq!(sm.view, View::Video(Animation::Default));

        // Stray ticks after the timer are ignored
        assert!(sm.process(KioskEvent::TimerTick).is_empty());
    }

    #[test]
    fn test_button_press_restarts_timer() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::ButtonPress);
        for _ in 0..10 {
            sm.process(KioskEvent::TimerTick);
        }
        assert_eq!(sm.view, View::Timer { remaining: 1490 });

        let cmds = sm.process(KioskEvent::ButtonPress);
        assert_eq!(
            cmds,
            vec![
                KioskCommand::StopTimerTicks,
                KioskCommand::ShowTimer { remaining: 1500 },
                KioskCommand::StartTimerTicks,
            ]
        );
        assert_eq!(sm.view, View::Timer { remaining: 1500 });
    }

    #[test]
    fn test_cancel_timer_restores_default_video() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::VideoChange(Animation::Alert));
        sm.process(KioskEvent::ButtonPress);

        let cmds = sm.process(KioskEvent::Escape);
        assert_eq!(
            cmds,
            vec![
                KioskCommand::StopTimerTicks,
                KioskCommand::PlayVideo(Animation::Default),
                KioskCommand::ResyncSensors,
            ]
        );
        assert!(!sm.timer_active());

        // Nothing to cancel now
        assert!(sm.process(KioskEvent::CancelTimer).is_empty());
    }

    #[test]
    fn test_resynced_default_does_not_restart_video() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::ButtonPress);
        let cmds = sm.process(KioskEvent::CancelTimer);
        assert!(cmds.contains(&KioskCommand::PlayVideo(Animation::Default)));

        // The poller re-reports after the resync; the clip is already playing
        assert!(sm.process(KioskEvent::VideoChange(Animation::Default)).is_empty());
        assert_eq!(sm.view, View::Video(Animation::Default));

        // A different choice still switches
        assert_eq!(
            sm.process(KioskEvent::VideoChange(Animation::Alert)),
            vec![KioskCommand::PlayVideo(Animation::Alert)]
        );
    }

    #[test]
    fn test_video_change_after_message_restarts_same_animation() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::Message("Sensor service unavailable".into()));
        assert_eq!(
            sm.process(KioskEvent::VideoChange(Animation::Default)),
            vec![KioskCommand::PlayVideo(Animation::Default)]
        );
    }

    #[test]
    fn test_dismiss_does_not_resync_sensors() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::MeetingImminent(meeting("Standup")));

        // Already on the default clip: just close the window
        let cmds = sm.process(KioskEvent::DismissNotification);
        assert_eq!(cmds, vec![KioskCommand::CloseNotification]);
        assert!(!cmds.contains(&KioskCommand::ResyncSensors));
    }

    #[test]
    fn test_sensor_changes_wait_for_timer() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::ButtonPress);

        assert!(sm.process(KioskEvent::VideoChange(Animation::Dark)).is_empty());
        assert!(sm.process(KioskEvent::Message("hello".into())).is_empty());
        assert_eq!(sm.view, View::Timer { remaining: 1500 });
        assert_eq!(sm.animation, Animation::Dark);
    }

    #[test]
    fn test_new_meeting_replaces_notification() {
        let mut sm = KioskStateMachine::new();

        let cmds = sm.process(KioskEvent::MeetingImminent(meeting("Standup")));
        assert_eq!(cmds, vec![KioskCommand::ShowNotification(meeting("Standup"))]);

        let cmds = sm.process(KioskEvent::MeetingImminent(meeting("Review")));
        assert_eq!(
            cmds,
            vec![
                KioskCommand::CloseNotification,
                KioskCommand::ShowNotification(meeting("Review")),
            ]
        );
        assert_eq!(count_notifications(&cmds), 1);
        assert_eq!(sm.notification, Some(meeting("Review")));
    }

    #[test]
    fn test_dismiss_notification_restores_default_video() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::VideoChange(Animation::Warning));
        sm.process(KioskEvent::MeetingImminent(meeting("Standup")));

        let cmds = sm.process(KioskEvent::DismissNotification);
        assert_eq!(
            cmds,
            vec![
                KioskCommand::CloseNotification,
                KioskCommand::PlayVideo(Animation::Default),
            ]
        );
        assert!(sm.notification.is_none());
        assert_eq!(sm.view, View::Video(Animation::Default));

        // Dismissing twice is harmless
        assert!(sm.process(KioskEvent::DismissNotification).is_empty());
    }

    #[test]
    fn test_escape_prefers_notification_over_timer() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::ButtonPress);
        sm.process(KioskEvent::MeetingImminent(meeting("Standup")));

        let cmds = sm.process(KioskEvent::Escape);
        assert_eq!(cmds, vec![KioskCommand::CloseNotification]);
        assert!(sm.timer_active());

        let cmds = sm.process(KioskEvent::Escape);
        assert!(cmds.contains(&KioskCommand::StopTimerTicks));
        assert!(!sm.timer_active());
    }

    #[test]
    fn test_button_press_closes_notification() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::MeetingImminent(meeting("Standup")));

        let cmds = sm.process(KioskEvent::ButtonPress);
        assert_eq!(cmds[0], KioskCommand::CloseNotification);
        assert!(sm.notification.is_none());
        assert!(sm.timer_active());
    }

    #[test]
    fn test_shutdown_tears_everything_down() {
        let mut sm = KioskStateMachine::new();
        sm.process(KioskEvent::ButtonPress);
        sm.process(KioskEvent::MeetingImminent(meeting("Standup")));

        let cmds = sm.process(KioskEvent::Shutdown);
        assert_eq!(
            cmds,
            vec![
                KioskCommand::CloseNotification,
                KioskCommand::StopTimerTicks,
                KioskCommand::StopVideo,
                KioskCommand::Quit,
            ]
        );
    }
}
