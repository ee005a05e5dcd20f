//! UI components for the kiosk.

pub mod notification;
pub mod timer;
pub mod window;

pub use window::MainWindow;
