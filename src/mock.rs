//! Recording doubles for the link and board capabilities.
//!
//! Every double writes into one shared [`Trace`], so tests can assert on the
//! exact interleaving of reset pulses, sleeps, selector changes and writes.

use crate::config::PanelConfig;
use crate::device::Device;
use crate::framebuffer::PixelFormat;
use crate::platform::{Backlight, Delay, Level, PanelIo, PlatformError, ResetLine};
use crate::transport::{
    ByteOrder, ColorSequence, Interface, LinkError, Selector, SpiLink, TransferMode,
    TransportConfig,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Configure { selector: Selector, mode: TransferMode },
    Write { selector: Selector, mode: TransferMode, bytes: Vec<u8> },
    Reset(Level),
    Delay(u32),
    Backlight(bool),
}

#[derive(Debug, Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<Event>>>);

impl Trace {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn writes(&self) -> Vec<(Selector, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write { selector, bytes, .. } => Some((selector, bytes)),
                _ => None,
            })
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes().len()
    }

    /// Register writes as `(opcode, args)`, ignoring video traffic
    pub fn commands(&self) -> Vec<(u8, Vec<u8>)> {
        let mut out: Vec<(u8, Vec<u8>)> = Vec::new();
        for event in self.events() {
            if let Event::Write {
                selector,
                mode: TransferMode::Command,
                bytes,
            } = event
            {
                match selector {
                    Selector::Command => out.push((bytes[0], Vec::new())),
                    Selector::Data => {
                        if let Some((_, args)) = out.last_mut() {
                            args.extend_from_slice(&bytes);
                        }
                    }
                }
            }
        }
        out
    }

    pub fn opcodes(&self) -> Vec<u8> {
        self.commands().into_iter().map(|(op, _)| op).collect()
    }

    /// Video-mode payloads in the order they were written
    pub fn video_writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write {
                    mode: TransferMode::Video,
                    bytes,
                    ..
                } => Some(bytes),
                _ => None,
            })
            .collect()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Delay(ms) => Some(ms),
                _ => None,
            })
            .collect()
    }
}

/// Shared switch that makes every link write fail while set
#[derive(Debug, Clone, Default)]
pub struct FailSwitch(Arc<AtomicBool>);

impl FailSwitch {
    pub fn set(&self, fail: bool) {
        self.0.store(fail, Ordering::SeqCst);
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct MockLink {
    trace: Trace,
    selector: Selector,
    mode: TransferMode,
    fail: FailSwitch,
    fail_opcode: Option<u8>,
}

impl MockLink {
    pub fn new(trace: Trace) -> Self {
        Self {
            trace,
            selector: Selector::Command,
            mode: TransferMode::Command,
            fail: FailSwitch::default(),
            fail_opcode: None,
        }
    }

    /// A link that rejects the command phase of `opcode`
    pub fn failing_opcode(trace: Trace, opcode: u8) -> Self {
        Self {
            fail_opcode: Some(opcode),
            ..Self::new(trace)
        }
    }

    pub fn fail_switch(&self) -> FailSwitch {
        self.fail.clone()
    }
}

impl SpiLink for MockLink {
    fn configure(&mut self, config: &TransportConfig) -> Result<(), LinkError> {
        self.selector = config.selector;
        self.mode = config.mode;
        self.trace.push(Event::Configure {
            selector: config.selector,
            mode: config.mode,
        });
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), LinkError> {
        if self.fail.is_set() {
            return Err(LinkError::WriteError("injected failure".to_string()));
        }
        if self.selector == Selector::Command
            && self.fail_opcode.is_some()
            && self.fail_opcode == buf.first().copied()
        {
            return Err(LinkError::WriteError(format!("rejected opcode {:#04x}", buf[0])));
        }
        self.trace.push(Event::Write {
            selector: self.selector,
            mode: self.mode,
            bytes: buf.to_vec(),
        });
        Ok(())
    }
}

pub struct MockReset(pub Trace);

impl ResetLine for MockReset {
    fn set_level(&mut self, level: Level) {
        self.0.push(Event::Reset(level));
    }
}

pub struct MockDelay(pub Trace);

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.0.push(Event::Delay(ms));
    }
}

pub struct MockBacklight(pub Trace);

impl Backlight for MockBacklight {
    fn enable(&mut self) -> Result<(), PlatformError> {
        self.0.push(Event::Backlight(true));
        Ok(())
    }

    fn disable(&mut self) -> Result<(), PlatformError> {
        self.0.push(Event::Backlight(false));
        Ok(())
    }
}

pub fn mock_io(trace: &Trace) -> PanelIo {
    PanelIo::new(
        MockReset(trace.clone()),
        MockDelay(trace.clone()),
        MockBacklight(trace.clone()),
    )
}

pub fn test_config() -> TransportConfig {
    TransportConfig {
        pixel_format: PixelFormat::Rgb565,
        byte_order: ByteOrder::MsbFirst,
        src_sequence: ColorSequence::Rgb,
        out_sequence: ColorSequence::Rgb,
        video_width: 128,
        video_height: 160,
        fps: 30,
        interface: Interface::FourWire,
        max_transfer: None,
        selector: Selector::Command,
        mode: TransferMode::Command,
    }
}

/// Panel properties for the default 128x160 panel with chunking disabled
pub fn panel_props(rotation: u32) -> PanelConfig {
    PanelConfig {
        rotation,
        max_transfer_size: 0,
        ..PanelConfig::default()
    }
}

/// Probe a device on a mock link; the trace starts empty after probe
pub fn probe_mock(props: &PanelConfig) -> (Device<MockLink>, Trace) {
    let trace = Trace::default();
    let device = Device::probe(MockLink::new(trace.clone()), mock_io(&trace), props).unwrap();
    trace.clear();
    (device, trace)
}
