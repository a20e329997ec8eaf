//! Async front end for a [`Device`].
//!
//! Pipe operations sleep and block on the bus, so they run on tokio's
//! blocking pool. The controller is cheap to clone and shares one device.

use crate::device::Device;
use crate::error::DriverError;
use crate::framebuffer::Framebuffer;
use crate::panel::DisplayMode;
use crate::transport::SpiLink;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;

/// Controller errors
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Display task failed: {0}")]
    Task(#[from] JoinError),
}

/// Thread-safe display controller wrapper
pub struct DisplayController<L> {
    device: Arc<Device<L>>,
}

impl<L: SpiLink + 'static> DisplayController<L> {
    pub fn new(device: Arc<Device<L>>) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &Arc<Device<L>> {
        &self.device
    }

    /// Initialize the panel and start showing `fb`
    pub async fn enable(&self, fb: Arc<Framebuffer>) -> Result<(), ControllerError> {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || device.enable(fb)).await??;
        Ok(())
    }

    /// Blank the panel and put it to sleep
    pub async fn disable(&self) -> Result<(), ControllerError> {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || device.disable()).await??;
        Ok(())
    }

    /// Push one frame
    pub async fn pump(&self) -> Result<(), ControllerError> {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || device.pump_frame()).await??;
        Ok(())
    }

    /// Page flip; takes effect on the next vsync
    pub fn update(&self, fb: Arc<Framebuffer>) {
        self.device.update(fb);
    }

    /// Power down and wait for in-flight work to drain
    pub async fn remove(&self) -> Result<(), ControllerError> {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || device.remove()).await?;
        Ok(())
    }

    pub fn modes(&self) -> Vec<DisplayMode> {
        self.device.modes()
    }

    pub fn mode_valid(&self, mode: &DisplayMode) -> bool {
        self.device.mode_valid(mode)
    }

    /// Logical frame size
    pub fn size(&self) -> (u16, u16) {
        self.device.size()
    }

    pub fn fps(&self) -> u32 {
        self.device.fps()
    }

    pub fn is_enabled(&self) -> bool {
        self.device.is_enabled()
    }
}

impl<L> Clone for DisplayController<L> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
        }
    }
}
