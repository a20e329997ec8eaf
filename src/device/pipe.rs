//! Display pipe entry points: enable, disable, page flip and mode check.

use super::Device;
use crate::error::DriverError;
use crate::framebuffer::Framebuffer;
use crate::init::{InitState, PanelInitializer};
use crate::panel::{DisplayMode, cmd};
use crate::transport::SpiLink;
use std::sync::{Arc, PoisonError};

impl<L: SpiLink> Device<L> {
    /// Bring the panel up, show `fb` and switch the backlight on
    pub fn enable(&self, fb: Arc<Framebuffer>) -> Result<(), DriverError> {
        let Some(_ticket) = self.lifetime.enter() else {
            return Err(DriverError::TeardownInProgress);
        };
        let mut io = self.io.lock().unwrap_or_else(PoisonError::into_inner);

        let report = PanelInitializer::new(&self.bus, self.policy, &self.init_state)
            .run(&mut io, &self.init_params())?;
        if report.failed_commands > 0 {
            tracing::warn!(
                "Panel initialized with {} failed command(s)",
                report.failed_commands
            );
        }

        // remove() powers the panel back down once this section exits
        if self.lifetime.is_unplugged() {
            return Err(DriverError::TeardownInProgress);
        }

        {
            let mut pipe = self.pipe_state();
            pipe.fb = Some(fb);
            pipe.active = true;
        }

        match self.pump_frame() {
            Ok(()) | Err(DriverError::TeardownInProgress) => {}
            Err(e) => tracing::warn!("Initial frame transfer failed: {}", e),
        }

        if let Err(e) = io.backlight.enable() {
            tracing::warn!("Backlight enable failed: {}", e);
        }

        tracing::info!("Panel enabled");
        Ok(())
    }

    /// Stop scanout, blank the panel and put it to sleep
    pub fn disable(&self) -> Result<(), DriverError> {
        let Some(_ticket) = self.lifetime.enter() else {
            return Err(DriverError::TeardownInProgress);
        };
        self.power_down();
        Ok(())
    }

    /// Display off, sleep in, backlight off. Callers either hold a ticket or
    /// have already unplugged the device.
    pub(super) fn power_down(&self) {
        let mut io = self.io.lock().unwrap_or_else(PoisonError::into_inner);

        self.pipe_state().active = false;

        {
            let mut bus = self.bus.lock();
            for opcode in [cmd::SET_DISPLAY_OFF, cmd::ENTER_SLEEP_MODE] {
                if let Err(e) = bus.command(opcode, &[]) {
                    tracing::warn!("Disable: command {:#04x} failed: {}", opcode, e);
                }
            }
        }

        if let Err(e) = io.backlight.disable() {
            tracing::warn!("Backlight disable failed: {}", e);
        }

        *self.init_state.lock().unwrap_or_else(PoisonError::into_inner) = InitState::PoweredOff;
        tracing::info!("Panel disabled");
    }

    /// Page flip: make `fb` the frame shown from the next vsync on.
    /// Ignored while the pipe is inactive.
    pub fn update(&self, fb: Arc<Framebuffer>) {
        let mut pipe = self.pipe_state();
        if pipe.active {
            pipe.fb = Some(fb);
        } else {
            tracing::debug!("Frame update ignored, pipe inactive");
        }
    }

    /// Only the panel's native mode can be driven
    pub fn mode_valid(&self, candidate: &DisplayMode) -> bool {
        self.profile.mode.accepts(candidate)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DriverError;
    use crate::framebuffer::{Framebuffer, PixelFormat};
    use crate::init::InitState;
    use crate::device::Device;
    use crate::init::SLEEP_EXIT_MS;
    use crate::mock::{Event, MockBacklight, MockLink, MockReset, Trace, panel_props, probe_mock};
    use crate::panel::DisplayMode;
    use crate::platform::{Delay, PanelIo};
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::Duration;

    fn frame(w: u32, h: u32) -> Arc<Framebuffer> {
        Arc::new(Framebuffer::new(w, h, PixelFormat::Rgb565))
    }

    #[test]
    fn test_enable_inits_pushes_frame_then_backlight() {
        let (device, trace) = probe_mock(&panel_props(0));

        device.enable(frame(128, 160)).unwrap();

        assert!(device.is_enabled());
        assert_eq!(device.init_state(), InitState::MemoryWriteArmed);
        assert_eq!(trace.opcodes().last(), Some(&0x2c));

        let video = trace.video_writes();
        assert_eq!(video.len(), 1);
        assert_eq!(video[0].len(), 40960);

        let events = trace.events();
        assert_eq!(events.last(), Some(&Event::Backlight(true)));
        assert_eq!(device.frames_pushed(), 1);
    }

    #[test]
    fn test_enable_window_for_rotation_90() {
        let (device, trace) = probe_mock(&panel_props(90));

        device.enable(frame(160, 128)).unwrap();

        let commands = trace.commands();
        assert!(commands.contains(&(0x36, vec![0x60])));
        assert!(commands.contains(&(0x2a, vec![0x00, 0x01, 0x00, 0xa1])));
        assert!(commands.contains(&(0x2b, vec![0x00, 0x02, 0x00, 0x82])));
    }

    #[test]
    fn test_disable_sequence() {
        let (device, trace) = probe_mock(&panel_props(0));
        device.enable(frame(128, 160)).unwrap();
        trace.clear();

        device.disable().unwrap();

        assert_eq!(trace.commands(), vec![(0x28, vec![]), (0x10, vec![])]);
        assert_eq!(trace.events().last(), Some(&Event::Backlight(false)));
        assert!(!device.is_enabled());
        assert_eq!(device.init_state(), InitState::PoweredOff);
    }

    #[test]
    fn test_reenable_reproduces_sequence() {
        let (device, trace) = probe_mock(&panel_props(0));

        device.enable(frame(128, 160)).unwrap();
        let first = trace.events();

        device.disable().unwrap();
        trace.clear();
        device.enable(frame(128, 160)).unwrap();

        assert_eq!(trace.events(), first);
    }

    #[test]
    fn test_update_only_while_active() {
        let (device, trace) = probe_mock(&panel_props(0));

        device.update(frame(128, 160));
        device.pump_frame().unwrap();
        assert_eq!(trace.write_count(), 0);

        device.enable(frame(128, 160)).unwrap();
        let white = frame(128, 160);
        white.fill_with(|_, _| (0xff, 0xff, 0xff));
        device.update(white);
        device.pump_frame().unwrap();

        let video = trace.video_writes();
        assert_eq!(video.len(), 2);
        assert!(video[1].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_mode_valid() {
        let (device, _) = probe_mock(&panel_props(90));
        assert!(device.mode_valid(&DisplayMode::simple(128, 160, 28, 35)));
        assert!(!device.mode_valid(&DisplayMode::simple(160, 128, 28, 35)));
        assert!(!device.mode_valid(&DisplayMode::simple(320, 240, 0, 0)));
    }

    #[test]
    fn test_remove_disables_and_blocks_entry() {
        let (device, trace) = probe_mock(&panel_props(0));
        device.enable(frame(128, 160)).unwrap();
        trace.clear();

        device.remove();

        assert_eq!(trace.opcodes(), vec![0x28, 0x10]);
        assert!(matches!(
            device.enable(frame(128, 160)),
            Err(DriverError::TeardownInProgress)
        ));
        assert!(matches!(device.disable(), Err(DriverError::TeardownInProgress)));
    }

    /// Records like `MockDelay`, but stalls on one wait and reports reaching it
    struct StallingDelay {
        trace: Trace,
        stall_on: u32,
        reached: mpsc::Sender<()>,
    }

    impl Delay for StallingDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.trace.push(Event::Delay(ms));
            if ms == self.stall_on {
                let _ = self.reached.send(());
                thread::sleep(Duration::from_millis(200));
            }
        }
    }

    #[test]
    fn test_remove_during_enable_leaves_panel_off() {
        let trace = Trace::default();
        let (tx, rx) = mpsc::channel();
        let io = PanelIo::new(
            MockReset(trace.clone()),
            StallingDelay {
                trace: trace.clone(),
                stall_on: SLEEP_EXIT_MS,
                reached: tx,
            },
            MockBacklight(trace.clone()),
        );
        let device = Arc::new(
            Device::probe(MockLink::new(trace.clone()), io, &panel_props(0)).unwrap(),
        );

        let enabler = {
            let device = Arc::clone(&device);
            thread::spawn(move || device.enable(frame(128, 160)))
        };
        rx.recv().unwrap();
        device.remove();
        let result = enabler.join().unwrap();

        assert!(matches!(result, Err(DriverError::TeardownInProgress)));
        assert!(!device.is_enabled());
        assert_eq!(device.init_state(), InitState::PoweredOff);
        assert!(trace.video_writes().is_empty());
        assert!(!trace.events().contains(&Event::Backlight(true)));
        assert_eq!(trace.events().last(), Some(&Event::Backlight(false)));

        let opcodes = trace.opcodes();
        assert_eq!(&opcodes[opcodes.len() - 2..], &[0x28, 0x10]);
    }

    #[test]
    fn test_remove_without_enable_sends_nothing() {
        let (device, trace) = probe_mock(&panel_props(0));

        device.remove();

        assert!(trace.events().is_empty());
    }

    #[test]
    fn test_strict_enable_fails_without_scanout() {
        use crate::config::PanelConfig;
        use crate::init::InitPolicy;
        use crate::mock::mock_io;

        let trace = Trace::default();
        let link = MockLink::new(trace.clone());
        let fail = link.fail_switch();
        let props = PanelConfig {
            init_policy: InitPolicy::Strict,
            ..panel_props(0)
        };
        let device = Device::probe(link, mock_io(&trace), &props).unwrap();

        fail.set(true);
        assert!(matches!(
            device.enable(frame(128, 160)),
            Err(DriverError::LinkFailure(_))
        ));
        assert!(!device.is_enabled());
        assert_eq!(device.init_state(), InitState::SoftReset);
    }
}
