//! Vsync scheduler driving the frame pump.
//!
//! Ticks at the device's frame rate and pushes one frame per tick. Late
//! ticks are delayed rather than bunched up, so a slow bus lowers the
//! effective rate instead of queueing frames.

use crate::controller::{ControllerError, DisplayController};
use crate::error::DriverError;
use crate::transport::SpiLink;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

/// Periodic frame pump
pub struct VsyncScheduler<L> {
    controller: DisplayController<L>,
    period: Duration,
}

impl<L: SpiLink + 'static> VsyncScheduler<L> {
    pub fn new(controller: DisplayController<L>) -> Self {
        let fps = controller.fps().max(1) as u64;
        Self {
            controller,
            period: Duration::from_nanos(1_000_000_000 / fps),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run until `shutdown` fires or the device goes away
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Vsync scheduler started ({:?} period)", self.period);

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.controller.pump().await {
                        Ok(()) => {}
                        Err(ControllerError::Driver(DriverError::TeardownInProgress)) => {
                            tracing::debug!("Device torn down, stopping vsync");
                            break;
                        }
                        Err(e) => tracing::warn!("Frame dropped: {}", e),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Vsync scheduler shutting down");
                    break;
                }
            }
        }
    }
}
