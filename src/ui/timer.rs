//! Pomodoro countdown view.

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::state::format_countdown;

/// Full-screen countdown page
pub struct TimerView {
    pub container: gtk::Box,
    label: gtk::Label,
}

impl TimerView {
    pub fn new() -> Self {
        let container = gtk::Box::new(gtk::Orientation::Vertical, 24);
        container.add_css_class("timer-view");
        container.set_hexpand(true);
        container.set_vexpand(true);

        let center = gtk::Box::new(gtk::Orientation::Vertical, 16);
        center.set_halign(gtk::Align::Center);
        center.set_valign(gtk::Align::Center);
        center.set_vexpand(true);

        let label = gtk::Label::new(Some(&format_countdown(0)));
        label.add_css_class("timer-label");

        center.append(&label);
        container.append(&center);

        Self { container, label }
    }

    /// Show `remaining` seconds as MM:SS
    pub fn set_remaining(&self, remaining: u32) {
        self.label.set_text(&format_countdown(remaining));
    }
}
