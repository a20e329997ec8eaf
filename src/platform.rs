//! Board capabilities the driver consumes: reset line, sleeps and backlight.
//!
//! Implementations for real hardware live in [`crate::hw`]; anything that can
//! drive a GPIO and block for a while will do.

use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Output level for a GPIO line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Platform-related errors
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("Backlight error: {0}")]
    Backlight(String),
}

/// Panel reset line
pub trait ResetLine: Send {
    fn set_level(&mut self, level: Level);
}

/// Blocking millisecond delay
pub trait Delay: Send {
    fn delay_ms(&mut self, ms: u32);
}

/// Backlight on/off control
pub trait Backlight: Send {
    fn enable(&mut self) -> Result<(), PlatformError>;
    fn disable(&mut self) -> Result<(), PlatformError>;
}

/// Delay backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// For panels whose backlight is hard-wired on
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBacklight;

impl Backlight for NoBacklight {
    fn enable(&mut self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn disable(&mut self) -> Result<(), PlatformError> {
        Ok(())
    }
}

/// Everything besides the bus that panel bring-up touches
pub struct PanelIo {
    pub reset: Box<dyn ResetLine>,
    pub delay: Box<dyn Delay>,
    pub backlight: Box<dyn Backlight>,
}

impl PanelIo {
    pub fn new(
        reset: impl ResetLine + 'static,
        delay: impl Delay + 'static,
        backlight: impl Backlight + 'static,
    ) -> Self {
        Self {
            reset: Box::new(reset),
            delay: Box::new(delay),
            backlight: Box::new(backlight),
        }
    }
}
