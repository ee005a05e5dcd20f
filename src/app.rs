//! Application context - bridges the GTK-free state machine with GTK UI.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use gtk4 as gtk;
use tokio::sync::{mpsc, Notify};

use crate::state::{KioskCommand, KioskEvent, KioskStateMachine};
use crate::video::pipeline::PipelineError;
use crate::video::VideoPipeline;

/// Messages sent from background tasks to the GTK main loop
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// Process a kiosk event through the state machine
    Event(KioskEvent),
}

/// Sender that can dispatch messages to the GTK main loop from any thread
#[derive(Clone)]
pub struct MessageSender {
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl MessageSender {
    pub fn send(&self, msg: AppMessage) {
        let _ = self.tx.send(msg);
    }
}

/// Create the single channel every producer shares
pub fn message_channel() -> (MessageSender, mpsc::UnboundedReceiver<AppMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MessageSender { tx }, rx)
}

/// Application context - holds state and provides methods to interact with it
pub struct AppContext {
    /// The GTK-free state machine
    pub state_machine: RefCell<KioskStateMachine>,
    /// GStreamer video pipeline
    pub video: RefCell<Option<VideoPipeline>>,
    /// Sender for dispatching messages to GTK main loop
    pub message_tx: MessageSender,
    /// Wakes the sensor poller to report its selection again
    resync: Arc<Notify>,
    /// Pomodoro one second tick source
    timer_source: RefCell<Option<glib::SourceId>>,
}

impl AppContext {
    pub fn new(message_tx: MessageSender, resync: Arc<Notify>) -> Rc<Self> {
        Rc::new(Self {
            state_machine: RefCell::new(KioskStateMachine::new()),
            video: RefCell::new(None),
            message_tx,
            resync,
            timer_source: RefCell::new(None),
        })
    }

    /// Initialize the video pipeline
    pub fn init_video(&self) -> Result<gtk::gdk::Paintable, PipelineError> {
        let pipeline = VideoPipeline::new()?;
        let paintable = pipeline.paintable().clone();
        *self.video.borrow_mut() = Some(pipeline);
        Ok(paintable)
    }

    /// Send an event to the state machine (from any thread)
    pub fn send_event(&self, event: KioskEvent) {
        self.message_tx.send(AppMessage::Event(event));
    }

    /// Run the commands that bring up the first view
    pub fn start(self: &Rc<Self>) -> Vec<KioskCommand> {
        let commands = self.state_machine.borrow().start();
        for cmd in &commands {
            self.execute_command(cmd);
        }
        commands
    }

    /// Process an event and execute resulting commands
    /// This should be called from the GTK main loop
    pub fn process_event(self: &Rc<Self>, event: KioskEvent) -> Vec<KioskCommand> {
        let commands = self.state_machine.borrow_mut().process(event);

        for cmd in &commands {
            self.execute_command(cmd);
        }

        commands
    }

    /// Execute the non-widget part of a command
    fn execute_command(self: &Rc<Self>, cmd: &KioskCommand) {
        match cmd {
            KioskCommand::PlayVideo(animation) => {
                if let Some(video) = self.video.borrow().as_ref() {
                    if let Err(e) = video.play_file(animation.path()) {
                        log::error!("Failed to play {:?}: {}", animation, e);
                    }
                }
            }

            KioskCommand::StopVideo => {
                if let Some(video) = self.video.borrow().as_ref() {
                    if let Err(e) = video.stop() {
                        log::warn!("Failed to stop video: {}", e);
                    }
                }
            }

            KioskCommand::StartTimerTicks => {
                self.stop_timer_ticks();
                log::info!("Pomodoro timer started");
                let tx = self.message_tx.clone();
                let source = glib::timeout_add_local(Duration::from_secs(1), move || {
                    tx.send(AppMessage::Event(KioskEvent::TimerTick));
                    glib::ControlFlow::Continue
                });
                *self.timer_source.borrow_mut() = Some(source);
            }

            KioskCommand::StopTimerTicks => {
                self.stop_timer_ticks();
                log::info!("Pomodoro timer stopped");
            }

            KioskCommand::ResyncSensors => {
                self.resync.notify_one();
            }

            KioskCommand::ShowMessage(_)
            | KioskCommand::ShowTimer { .. }
            | KioskCommand::ShowNotification(_)
            | KioskCommand::CloseNotification
            | KioskCommand::Quit => {
                // Handled by the window
            }
        }
    }

    fn stop_timer_ticks(&self) {
        if let Some(source) = self.timer_source.borrow_mut().take() {
            source.remove();
        }
    }
}
