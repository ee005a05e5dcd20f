//! Pomodoro Kiosk - GTK4 + GStreamer ambient display.
//!
//! Architecture:
//! - `state` module: GTK-free state machine with the view logic (testable)
//! - `app` module: Bridges state machine to GTK, video and timers
//! - `api` module: client for the remote robot (sensors, calendar)
//! - `monitor` module: sensor and meeting polling tasks
//! - `button` module: GPIO push button sampling thread
//! - `video` module: GStreamer pipeline for the looping animations
//! - `ui` module: GTK4 widgets and windows

use std::cell::RefCell;
use std::sync::Arc;

use gtk4::prelude::*;
use libadwaita as adw;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

mod api;
mod app;
mod button;
mod config;
mod monitor;
mod state;
mod ui;
mod video;

use app::{AppContext, AppMessage, MessageSender};
use state::KioskEvent;
use ui::MainWindow;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Pomodoro Kiosk");

    // Create tokio runtime for async operations
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    let shutdown = CancellationToken::new();
    let resync = Arc::new(Notify::new());
    let (message_tx, message_rx) = app::message_channel();

    // Sensor and calendar polling
    let background = runtime.spawn(monitor::run(
        message_tx.clone(),
        resync.clone(),
        shutdown.clone(),
    ));

    // Push button sampling
    let button = match button::spawn(message_tx.clone(), shutdown.clone()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Button unavailable, Pomodoro timer disabled: {}", e);
            None
        }
    };

    runtime.spawn(wait_for_interrupt(message_tx.clone(), shutdown.clone()));

    // Hide the cursor before GTK init
    std::env::set_var("XCURSOR_THEME", "InvisibleCursor");
    std::env::set_var("XCURSOR_SIZE", "1");

    let app = adw::Application::builder()
        .application_id("com.pomodoro.kiosk")
        .build();

    let message_rx = RefCell::new(Some(message_rx));

    app.connect_activate(move |app| {
        // A second activation just raises the existing window
        let Some(mut rx) = message_rx.borrow_mut().take() else {
            if let Some(window) = app.active_window() {
                window.present();
            }
            return;
        };

        let ctx = AppContext::new(message_tx.clone(), resync.clone());
        let main_window = MainWindow::new(app, ctx);

        // Drain the event channel from the GTK main loop
        let window = main_window.clone();
        glib::timeout_add_local(config::QUEUE_DRAIN_INTERVAL, move || {
            while let Ok(msg) = rx.try_recv() {
                window.handle_message(msg);
            }
            glib::ControlFlow::Continue
        });

        main_window.window.present();
    });

    app.run();

    log::info!("Pomodoro Kiosk shutting down");

    shutdown.cancel();

    if let Some(handle) = button {
        if handle.join().is_err() {
            log::error!("Button thread panicked");
        }
    }

    runtime.block_on(async {
        if tokio::time::timeout(config::SHUTDOWN_GRACE, background)
            .await
            .is_err()
        {
            log::warn!("Background tasks did not stop in time");
        }
    });
}

/// Turn Ctrl-C into an orderly shutdown
async fn wait_for_interrupt(tx: MessageSender, shutdown: CancellationToken) {
    tokio::select! {
        _ = shutdown.cancelled() => {}
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => log::info!("Interrupt received, exiting"),
                Err(e) => {
                    log::error!("Failed to listen for interrupt: {}", e);
                    return;
                }
            }
            shutdown.cancel();
            tx.send(AppMessage::Event(KioskEvent::Shutdown));
        }
    }
}
