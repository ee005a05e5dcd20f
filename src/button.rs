//! Physical push button, sampled on a background thread.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::app::{AppMessage, MessageSender};
use crate::config;
use crate::state::KioskEvent;

#[derive(Error, Debug)]
pub enum ButtonError {
    #[error("GPIO error: {0}")]
    Gpio(#[from] gpio_cdev::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A digital input that can report whether it is pressed
pub trait ButtonInput {
    fn is_pressed(&mut self) -> Result<bool, ButtonError>;
}

/// Button wired active-high on a GPIO character device line
pub struct GpioButton {
    line: LineHandle,
}

impl GpioButton {
    pub fn open(chip: &str, offset: u32) -> Result<Self, ButtonError> {
        let mut chip = Chip::new(chip)?;
        let line = chip
            .get_line(offset)?
            .request(LineRequestFlags::INPUT, 0, "pomodoro-button")?;
        log::info!("Button ready on line {}", offset);
        Ok(Self { line })
    }
}

impl ButtonInput for GpioButton {
    fn is_pressed(&mut self) -> Result<bool, ButtonError> {
        Ok(self.line.get_value()? == 1)
    }
}

/// Sample `input` every `interval`, emitting one event per pressed sample.
///
/// Returns when `shutdown` is cancelled or the input fails.
pub fn poll<B, F>(
    mut input: B,
    interval: Duration,
    shutdown: &CancellationToken,
    mut on_press: F,
) -> Result<(), ButtonError>
where
    B: ButtonInput,
    F: FnMut(),
{
    while !shutdown.is_cancelled() {
        if input.is_pressed()? {
            log::info!("Button pressed");
            on_press();
        }
        thread::sleep(interval);
    }
    Ok(())
}

/// Open the configured button and start its polling thread
pub fn spawn(tx: MessageSender, shutdown: CancellationToken) -> Result<JoinHandle<()>, ButtonError> {
    let button = GpioButton::open(config::GPIO_CHIP, config::BUTTON_LINE)?;

    let handle = thread::Builder::new()
        .name("button".into())
        .spawn(move || {
            let result = poll(button, config::BUTTON_POLL_INTERVAL, &shutdown, || {
                tx.send(AppMessage::Event(KioskEvent::ButtonPress));
            });
            match result {
                Ok(()) => log::info!("Button polling stopped"),
                Err(e) => log::error!("Button polling aborted: {}", e),
            }
        })?;

    Ok(handle)
}
