//! Main application window: video, message and timer pages.

use gtk4 as gtk;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::{AppContext, AppMessage};
use crate::state::{KioskCommand, KioskEvent};
use crate::ui::notification::MeetingNotification;
use crate::ui::timer::TimerView;

const PAGE_VIDEO: &str = "video";
const PAGE_MESSAGE: &str = "message";
const PAGE_TIMER: &str = "timer";

/// Main window; owns every widget the kiosk shows
pub struct MainWindow {
    pub window: adw::ApplicationWindow,
    ctx: Rc<AppContext>,
    stack: gtk::Stack,
    message_label: gtk::Label,
    timer: TimerView,
    notification: RefCell<Option<MeetingNotification>>,
}

impl MainWindow {
    pub fn new(app: &adw::Application, ctx: Rc<AppContext>) -> Rc<Self> {
        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title("Pomodoro Kiosk")
            .default_width(1920)
            .default_height(1080)
            .build();

        // Make fullscreen after window is mapped
        window.connect_map(|window| {
            let window = window.clone();
            glib::timeout_add_local_once(std::time::Duration::from_millis(100), move || {
                window.fullscreen();
            });
        });

        window.set_cursor_from_name(Some("none"));

        let stack = gtk::Stack::new();
        stack.set_transition_type(gtk::StackTransitionType::Crossfade);
        stack.set_hexpand(true);
        stack.set_vexpand(true);

        // Video page, scaled to the whole screen
        let video = gtk::Picture::new();
        video.set_content_fit(gtk::ContentFit::Fill);
        video.set_hexpand(true);
        video.set_vexpand(true);
        video.add_css_class("video-background");
        match ctx.init_video() {
            Ok(paintable) => video.set_paintable(Some(&paintable)),
            Err(e) => log::error!("Failed to initialize video pipeline: {}", e),
        }
        stack.add_named(&video, Some(PAGE_VIDEO));

        let message_label = gtk::Label::new(None);
        message_label.add_css_class("message-label");
        message_label.set_wrap(true);
        message_label.set_justify(gtk::Justification::Center);
        message_label.set_halign(gtk::Align::Center);
        message_label.set_valign(gtk::Align::Center);
        stack.add_named(&message_label, Some(PAGE_MESSAGE));

        let timer = TimerView::new();
        stack.add_named(&timer.container, Some(PAGE_TIMER));

        window.set_content(Some(&stack));

        let main_window = Rc::new(Self {
            window,
            ctx,
            stack,
            message_label,
            timer,
            notification: RefCell::new(None),
        });

        main_window.connect_handlers();
        main_window.load_css();

        // Start on the default animation
        for cmd in main_window.ctx.start() {
            main_window.apply(cmd);
        }

        main_window
    }

    fn load_css(&self) {
        let provider = gtk::CssProvider::new();
        provider.load_from_string(include_str!("../../resources/style.css"));

        match gtk::gdk::Display::default() {
            Some(display) => gtk::style_context_add_provider_for_display(
                &display,
                &provider,
                gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
            ),
            None => log::warn!("No display, skipping stylesheet"),
        }
    }

    /// Escape dismisses the notification or cancels the timer
    fn connect_handlers(self: &Rc<Self>) {
        let keys = gtk::EventControllerKey::new();
        let ctx = self.ctx.clone();
        keys.connect_key_pressed(move |_, key, _, _| {
            if key == gtk::gdk::Key::Escape {
                ctx.send_event(KioskEvent::Escape);
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
        self.window.add_controller(keys);

        // Tapping the countdown cancels it
        let tap = gtk::GestureClick::new();
        let ctx = self.ctx.clone();
        tap.connect_released(move |_, _, _, _| {
            ctx.send_event(KioskEvent::CancelTimer);
        });
        self.timer.container.add_controller(tap);
    }

    /// Handle app messages - main entry point for state updates
    pub fn handle_message(self: &Rc<Self>, msg: AppMessage) {
        match msg {
            AppMessage::Event(event) => {
                for cmd in self.ctx.process_event(event) {
                    self.apply(cmd);
                }
            }
        }
    }

    /// Carry out the widget part of a command
    fn apply(self: &Rc<Self>, cmd: KioskCommand) {
        match cmd {
            KioskCommand::PlayVideo(_) => {
                self.stack.set_visible_child_name(PAGE_VIDEO);
            }

            KioskCommand::ShowMessage(text) => {
                self.message_label.set_text(&text);
                self.stack.set_visible_child_name(PAGE_MESSAGE);
            }

            KioskCommand::ShowTimer { remaining } => {
                self.timer.set_remaining(remaining);
                self.stack.set_visible_child_name(PAGE_TIMER);
            }

            KioskCommand::ShowNotification(meeting) => {
                let previous = self.notification.borrow_mut().take();
                if let Some(previous) = previous {
                    previous.close();
                }
                let notification = MeetingNotification::open(&self.ctx, &self.window, &meeting);
                *self.notification.borrow_mut() = Some(notification);
            }

            KioskCommand::CloseNotification => {
                let notification = self.notification.borrow_mut().take();
                if let Some(notification) = notification {
                    notification.close();
                }
            }

            KioskCommand::Quit => {
                log::info!("Closing kiosk window");
                if let Some(app) = self.window.application() {
                    app.quit();
                }
            }

            KioskCommand::StopVideo
            | KioskCommand::StartTimerTicks
            | KioskCommand::StopTimerTicks
            | KioskCommand::ResyncSensors => {
                // Handled by the app context
            }
        }
    }
}
