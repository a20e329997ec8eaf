//! ST7735R panel device.
//!
//! A [`Device`] owns the bus, the board I/O and the staging buffer for one
//! panel. It is built by [`Device::probe`] and shared between the lifecycle
//! context (pipe enable/disable) and the vsync context (frame pump).

mod pipe;
mod pump;

use crate::config::PanelConfig;
use crate::error::DriverError;
use crate::framebuffer::{Framebuffer, PixelFormat};
use crate::geometry::{AddressWindow, Rotation, address_mode};
use crate::init::{InitParams, InitPolicy, InitState};
use crate::lifetime::DeviceLifetime;
use crate::panel::{self, DisplayMode, PanelProfile};
use crate::platform::PanelIo;
use crate::transport::{
    BusTransport, ByteOrder, ColorSequence, Interface, Selector, SpiLink, TransferMode,
    TransportConfig,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Scanout state written by enable/disable and page flips
#[derive(Debug, Default)]
struct PipeState {
    active: bool,
    fb: Option<Arc<Framebuffer>>,
}

/// One probed panel
pub struct Device<L> {
    profile: &'static PanelProfile,
    rotation: Rotation,
    policy: InitPolicy,
    fps: u32,
    /// Logical (rotated) size
    width: u16,
    height: u16,
    window: AddressWindow,
    bus: BusTransport<L>,
    io: Mutex<PanelIo>,
    lifetime: DeviceLifetime,
    pipe: Mutex<PipeState>,
    /// Staging buffer in panel pixel encoding
    vram: Mutex<Vec<u8>>,
    init_state: Mutex<InitState>,
    frames: AtomicU32,
}

impl<L: SpiLink> Device<L> {
    /// Match the panel profile, validate properties, allocate the staging
    /// buffer and program the link's initial framing.
    pub fn probe(link: L, io: PanelIo, props: &PanelConfig) -> Result<Self, DriverError> {
        let profile = panel::lookup(&props.compatible).ok_or_else(|| {
            DriverError::Configuration(format!("No panel profile for '{}'", props.compatible))
        })?;

        let rotation = Rotation::from_degrees(props.rotation).inspect_err(|e| {
            tracing::error!("probe: {}", e);
        })?;

        if props.fps == 0 {
            return Err(DriverError::Configuration("fps must be greater than 0".to_string()));
        }

        let (width, height) = rotation.logical_size(profile.mode.hdisplay, profile.mode.vdisplay);
        let window = AddressWindow::new(profile.left_offset, profile.top_offset, width, height)?;

        let len = width as usize * height as usize * 2;
        let mut vram = Vec::new();
        if vram.try_reserve_exact(len).is_err() {
            tracing::error!("probe: staging buffer allocation failed ({} bytes)", len);
            return Err(DriverError::AllocationFailure(len));
        }
        vram.resize(len, 0);

        let config = TransportConfig {
            pixel_format: PixelFormat::Rgb565,
            byte_order: ByteOrder::MsbFirst,
            src_sequence: ColorSequence::Rgb,
            out_sequence: ColorSequence::Rgb,
            video_width: width,
            video_height: height,
            fps: props.fps,
            interface: Interface::FourWire,
            max_transfer: props.max_transfer(),
            selector: Selector::Command,
            mode: TransferMode::Command,
        };
        let bus = BusTransport::new(link, config);
        bus.lock().apply()?;

        tracing::info!(
            "Probed {} ({}x{}, rotation {}, {} fps{})",
            profile.compatible,
            width,
            height,
            rotation.degrees(),
            props.fps,
            if profile.write_only { ", write-only" } else { "" }
        );

        Ok(Self {
            profile,
            rotation,
            policy: props.init_policy,
            fps: props.fps,
            width,
            height,
            window,
            bus,
            io: Mutex::new(io),
            lifetime: DeviceLifetime::new(),
            pipe: Mutex::new(PipeState::default()),
            vram: Mutex::new(vram),
            init_state: Mutex::new(InitState::PoweredOff),
            frames: AtomicU32::new(0),
        })
    }

    /// Refuse all further entry, wait for in-flight work, then power the
    /// panel down if it was brought up.
    pub fn remove(&self) {
        self.lifetime.unplug();
        if self.is_enabled() || self.init_state() != InitState::PoweredOff {
            self.power_down();
        }
        tracing::info!("{} removed", self.profile.compatible);
    }

    /// Disable an active pipe
    pub fn shutdown(&self) {
        if self.is_enabled() {
            if let Err(e) = self.disable() {
                tracing::warn!("shutdown: {}", e);
            }
        }
    }

    pub fn profile(&self) -> &'static PanelProfile {
        self.profile
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Logical (rotated) width and height
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn address_window(&self) -> AddressWindow {
        self.window
    }

    /// MADCTL value programmed during bring-up
    pub fn address_mode(&self) -> u8 {
        address_mode(self.rotation, self.profile.bgr)
    }

    /// Modes offered on the connector: only the fixed native mode
    pub fn modes(&self) -> Vec<DisplayMode> {
        vec![self.profile.mode]
    }

    /// Smallest and largest frame buffer size accepted, as `(width, height)`
    pub fn size_limits(&self) -> ((u16, u16), (u16, u16)) {
        (self.size(), self.size())
    }

    pub fn init_state(&self) -> InitState {
        *self.init_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.pipe_state().active
    }

    /// Frames transferred since probe
    pub fn frames_pushed(&self) -> u32 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn transport_config(&self) -> TransportConfig {
        self.bus.config()
    }

    fn init_params(&self) -> InitParams {
        InitParams {
            address_mode: self.address_mode(),
            window: self.window,
        }
    }

    fn pipe_state(&self) -> MutexGuard<'_, PipeState> {
        self.pipe.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MADCTL_MV, MADCTL_MX};
    use crate::mock::{MockLink, Trace, mock_io, panel_props, probe_mock};

    #[test]
    fn test_probe_rotation_0() {
        let (device, _) = probe_mock(&panel_props(0));

        assert_eq!(device.size(), (128, 160));
        let window = device.address_window();
        assert_eq!((window.column_start, window.column_end), (1, 129));
        assert_eq!((window.page_start, window.page_end), (2, 162));
        assert_eq!(device.vram.lock().unwrap().len(), 40960);
        assert_eq!(device.init_state(), InitState::PoweredOff);
    }

    #[test]
    fn test_probe_rotation_90() {
        let (device, _) = probe_mock(&panel_props(90));

        assert_eq!(device.size(), (160, 128));
        assert_eq!(device.address_mode(), MADCTL_MX | MADCTL_MV);
        let window = device.address_window();
        assert_eq!((window.column_start, window.column_end), (1, 161));
        assert_eq!((window.page_start, window.page_end), (2, 130));

        let config = device.transport_config();
        assert_eq!((config.video_width, config.video_height), (160, 128));
    }

    #[test]
    fn test_probe_rejects_illegal_rotation() {
        for rotation in [45, 100, 359] {
            let trace = Trace::default();
            let result = Device::probe(
                MockLink::new(trace.clone()),
                mock_io(&trace),
                &panel_props(rotation),
            );
            assert!(
                matches!(result, Err(DriverError::Configuration(_))),
                "rotation {}",
                rotation
            );
            assert_eq!(trace.write_count(), 0);
        }
    }

    #[test]
    fn test_probe_rejects_unknown_panel() {
        let trace = Trace::default();
        let props = PanelConfig {
            compatible: "sitronix,st7789v".to_string(),
            ..panel_props(0)
        };
        let result = Device::probe(MockLink::new(trace.clone()), mock_io(&trace), &props);
        assert!(matches!(result, Err(DriverError::Configuration(_))));
    }

    #[test]
    fn test_probe_rejects_zero_fps() {
        let trace = Trace::default();
        let props = PanelConfig {
            fps: 0,
            ..panel_props(0)
        };
        let result = Device::probe(MockLink::new(trace.clone()), mock_io(&trace), &props);
        assert!(matches!(result, Err(DriverError::Configuration(_))));
    }

    #[test]
    fn test_bgr_profile_sets_bgr_bit() {
        let props = PanelConfig {
            compatible: "okaya,rh128128t".to_string(),
            ..panel_props(180)
        };
        let (device, _) = probe_mock(&props);
        assert_eq!(device.address_mode(), crate::geometry::MADCTL_BGR);
        assert_eq!(device.size(), (128, 128));
    }

    #[test]
    fn test_mode_limits_follow_rotation() {
        let (device, _) = probe_mock(&panel_props(270));
        assert_eq!(device.size_limits(), ((160, 128), (160, 128)));
        assert_eq!(device.modes(), vec![panel::YYH_TFT18019.mode]);
    }
}
