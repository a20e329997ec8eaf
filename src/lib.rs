//! ST7735R TFT panel driver over a DBI (MIPI type C) SPI link.
//!
//! The driver core ([`device::Device`]) owns one panel: it serializes all bus
//! traffic, runs the register bring-up script and streams whole frames from a
//! host frame buffer in RGB565. The [`hw`] module backs it with rppal on a
//! Raspberry Pi; [`controller`] and [`scheduler`] drive it from tokio.

pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod hw;
pub mod image_proc;
pub mod init;
pub mod lifetime;
pub mod panel;
pub mod platform;
pub mod protocol;
pub mod scheduler;
pub mod transport;

#[cfg(test)]
mod mock;

pub use config::Config;
pub use controller::DisplayController;
pub use device::Device;
pub use error::DriverError;
pub use framebuffer::{Framebuffer, PixelFormat};
pub use scheduler::VsyncScheduler;
