//! Frame pump: copies the scanout frame into the staging buffer and streams
//! it to the panel as one video-mode data transfer.

use super::Device;
use crate::error::DriverError;
use crate::framebuffer::{Framebuffer, Rect};
use crate::transport::{Selector, SpiLink, TransferMode};
use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};

impl<L: SpiLink> Device<L> {
    /// Push the current frame to the panel.
    ///
    /// Safe to call from any context at any rate. Returns
    /// [`DriverError::TeardownInProgress`] without touching the bus once the
    /// device is being removed, and `Ok` without a transfer while the pipe is
    /// inactive. A failed transfer only loses this frame.
    pub fn pump_frame(&self) -> Result<(), DriverError> {
        let Some(_ticket) = self.lifetime.enter() else {
            return Err(DriverError::TeardownInProgress);
        };

        let Some(fb) = self.scanout() else {
            return Ok(());
        };

        let rect = Rect::full(self.width as u32, self.height as u32);
        let mut vram = self.vram.lock().unwrap_or_else(PoisonError::into_inner);
        fb.vmap().copy_to_rgb565be(&mut vram[..], &rect)?;

        {
            let mut bus = self.bus.lock();
            if self.lifetime.is_unplugged() {
                return Err(DriverError::TeardownInProgress);
            }
            bus.set_phase(Selector::Data, TransferMode::Video)?;
            bus.transfer(&vram[..])?;
        }

        let count = self.frames.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if count % self.fps == 0 {
            tracing::debug!("dbi: vsync, {} frames pushed", count);
        }

        Ok(())
    }

    fn scanout(&self) -> Option<Arc<Framebuffer>> {
        let pipe = self.pipe_state();
        if pipe.active { pipe.fb.clone() } else { None }
    }
}
