//! Fullscreen meeting notification window.

use gtk4 as gtk;
use gtk4::prelude::*;
use std::rc::Rc;

use crate::app::AppContext;
use crate::monitor::meetings::Meeting;
use crate::state::KioskEvent;

/// An open notification; dropping it does not close the window, call [`close`](Self::close)
pub struct MeetingNotification {
    window: gtk::Window,
}

impl MeetingNotification {
    /// Open the notification above `parent`
    pub fn open(ctx: &Rc<AppContext>, parent: &impl IsA<gtk::Window>, meeting: &Meeting) -> Self {
        let window = gtk::Window::builder()
            .title("Upcoming Meeting")
            .transient_for(parent)
            .modal(true)
            .decorated(false)
            .build();
        window.add_css_class("notification-window");

        let content = gtk::Box::new(gtk::Orientation::Vertical, 20);
        content.set_halign(gtk::Align::Center);
        content.set_valign(gtk::Align::Center);

        let headline = gtk::Label::new(Some("Meeting Upcoming"));
        headline.add_css_class("notification-headline");

        let name = gtk::Label::new(Some(&meeting.summary));
        name.add_css_class("notification-detail");
        name.set_wrap(true);
        name.set_justify(gtk::Justification::Center);

        let start = gtk::Label::new(Some(&meeting.start_label()));
        start.add_css_class("notification-detail");

        let dismiss = gtk::Button::with_label("Dismiss");
        dismiss.add_css_class("notification-dismiss");
        dismiss.set_halign(gtk::Align::Center);
        dismiss.set_margin_top(60);

        let ctx_dismiss = ctx.clone();
        dismiss.connect_clicked(move |_| {
            ctx_dismiss.send_event(KioskEvent::DismissNotification);
        });

        // Closed by the window manager: route through the state machine
        let ctx_close = ctx.clone();
        window.connect_close_request(move |_| {
            ctx_close.send_event(KioskEvent::DismissNotification);
            glib::Propagation::Stop
        });

        let keys = gtk::EventControllerKey::new();
        let ctx_keys = ctx.clone();
        keys.connect_key_pressed(move |_, key, _, _| {
            if key == gtk::gdk::Key::Escape {
                ctx_keys.send_event(KioskEvent::Escape);
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
        window.add_controller(keys);

        content.append(&headline);
        content.append(&name);
        content.append(&start);
        content.append(&dismiss);
        window.set_child(Some(&content));

        window.fullscreen();
        window.present();
        window.set_cursor_from_name(Some("default"));

        log::info!("Showing notification for {} at {}", meeting.summary, meeting.start_label());

        Self { window }
    }

    /// Destroy the window
    pub fn close(self) {
        log::info!("Closing meeting notification");
        self.window.destroy();
    }
}
