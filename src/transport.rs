//! DBI-over-SPI bus transport.
//!
//! All traffic to the panel goes through one [`BusTransport`]. It owns the
//! physical link together with its framing configuration behind a single
//! lock, so a holder of [`BusGuard`] has exclusive use of both.

use crate::framebuffer::PixelFormat;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Data/command selector line state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Command,
    Data,
}

/// Transfer mode of the link: register traffic or bulk pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Command,
    Video,
}

/// Order of the bytes of a 16-bit pixel on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    MsbFirst,
    LsbFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSequence {
    Rgb,
    Bgr,
}

/// Physical DBI interface type C wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    /// SCL, SDA, CS and a dedicated D/C line
    FourWire,
    /// D/C carried as a ninth bit on SDA
    ThreeWire,
}

/// Framing parameters re-applied to the link before transfers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub pixel_format: PixelFormat,
    pub byte_order: ByteOrder,
    pub src_sequence: ColorSequence,
    pub out_sequence: ColorSequence,
    /// Logical (rotated) width
    pub video_width: u16,
    /// Logical (rotated) height
    pub video_height: u16,
    pub fps: u32,
    pub interface: Interface,
    /// Largest single write the link accepts; `None` sends everything at once
    pub max_transfer: Option<usize>,
    pub selector: Selector,
    pub mode: TransferMode,
}

impl TransportConfig {
    /// Bytes per transfer chunk for a payload of `len` bytes.
    ///
    /// Chunks are kept even so 16-bit pixels never straddle two writes.
    pub fn chunk_size(&self, len: usize) -> usize {
        match self.max_transfer {
            Some(max) if max > 0 && max < len => (max & !1).max(2),
            _ => len,
        }
    }
}

/// Link-level errors
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("SPI write failed: {0}")]
    WriteError(String),

    #[error("Link configuration failed: {0}")]
    ConfigError(String),
}

/// Bus transfer errors
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Transfer buffer allocation failed ({len} bytes)")]
    AllocationFailed { len: usize },

    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}

/// A physical serial link with a data/command selector
pub trait SpiLink: Send {
    /// Apply framing configuration, including the selector line level
    fn configure(&mut self, config: &TransportConfig) -> Result<(), LinkError>;

    /// Synchronously write `buf`
    fn write(&mut self, buf: &[u8]) -> Result<(), LinkError>;
}

struct Bus<L> {
    link: L,
    config: TransportConfig,
}

/// Lock-protected link plus its configuration
pub struct BusTransport<L> {
    bus: Mutex<Bus<L>>,
}

impl<L: SpiLink> BusTransport<L> {
    pub fn new(link: L, config: TransportConfig) -> Self {
        Self {
            bus: Mutex::new(Bus { link, config }),
        }
    }

    /// Acquire the bus lock
    pub fn lock(&self) -> BusGuard<'_, L> {
        BusGuard {
            bus: self.bus.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Lock the bus for a single transfer
    pub fn transfer(&self, bytes: &[u8]) -> Result<(), TransferError> {
        self.lock().transfer(bytes)
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> TransportConfig {
        self.lock().config().clone()
    }
}

/// Exclusive access to the link; the bus lock is released on drop
pub struct BusGuard<'a, L> {
    bus: MutexGuard<'a, Bus<L>>,
}

impl<L: SpiLink> BusGuard<'_, L> {
    pub fn config(&self) -> &TransportConfig {
        &self.bus.config
    }

    /// Re-apply the full configuration to the link
    pub fn apply(&mut self) -> Result<(), TransferError> {
        let Bus { link, config } = &mut *self.bus;
        link.configure(config).map_err(|e| {
            tracing::error!("dbi: link configuration failed: {}", e);
            TransferError::from(e)
        })
    }

    /// Switch selector and transfer mode, then re-apply the configuration
    pub fn set_phase(&mut self, selector: Selector, mode: TransferMode) -> Result<(), TransferError> {
        self.bus.config.selector = selector;
        self.bus.config.mode = mode;
        self.apply()
    }

    /// Copy `bytes` into a freshly allocated transfer buffer and send it.
    ///
    /// An empty slice is a no-op. The copy is released before returning on
    /// every path.
    pub fn transfer(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        if bytes.is_empty() {
            return Ok(());
        }

        let len = bytes.len();
        let mut buf = Vec::new();
        if buf.try_reserve_exact(len).is_err() {
            tracing::error!("dbi: transfer mem error ({} bytes)", len);
            return Err(TransferError::AllocationFailed { len });
        }
        buf.extend_from_slice(bytes);

        let chunk = self.bus.config.chunk_size(len);
        for part in buf.chunks(chunk) {
            self.bus.link.write(part).map_err(|e| {
                tracing::error!("dbi: transfer error: {}", e);
                TransferError::from(e)
            })?;
        }

        Ok(())
    }
}
