//! Panel bring-up sequence.
//!
//! Takes the panel from an unknown power state to accepting pixel data:
//! hardware reset, sleep exit, register programming, orientation, gamma,
//! display on and finally an armed memory write covering the whole window.
//! The delays are minimums from the controller datasheet; shorter ones leave
//! the panel blank or garbled.

use crate::error::DriverError;
use crate::geometry::AddressWindow;
use crate::panel::{self, cmd};
use crate::platform::{Level, PanelIo};
use crate::transport::{BusTransport, SpiLink, TransferError};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Reset pulse width
pub const RESET_PULSE_MS: u32 = 5;
/// Wait after releasing reset
pub const RESET_RECOVERY_MS: u32 = 120;
pub const SOFT_RESET_MS: u32 = 5;
pub const SLEEP_EXIT_MS: u32 = 500;
pub const DISPLAY_ON_MS: u32 = 100;
pub const NORMAL_MODE_MS: u32 = 20;

/// Bring-up progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitState {
    #[default]
    PoweredOff,
    HardReset,
    SoftReset,
    SleepExit,
    RegisterProgram,
    ColorModeSet,
    DisplayOn,
    NormalMode,
    AddressWindowSet,
    MemoryWriteArmed,
}

/// What to do when a command fails during bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitPolicy {
    /// Log the failure and carry on with the sequence
    #[default]
    Tolerant,
    /// Abort bring-up on the first failure
    Strict,
}

/// Orientation-dependent inputs to the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitParams {
    pub address_mode: u8,
    pub window: AddressWindow,
}

/// Outcome of a completed bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub state: InitState,
    /// Commands that failed and were skipped under [`InitPolicy::Tolerant`]
    pub failed_commands: usize,
}

pub struct PanelInitializer<'a, L> {
    bus: &'a BusTransport<L>,
    policy: InitPolicy,
    state: &'a Mutex<InitState>,
    failed: usize,
}

impl<'a, L: SpiLink> PanelInitializer<'a, L> {
    /// `state` is updated as the sequence advances, so it shows where a
    /// strict-mode failure stopped.
    pub fn new(bus: &'a BusTransport<L>, policy: InitPolicy, state: &'a Mutex<InitState>) -> Self {
        Self {
            bus,
            policy,
            state,
            failed: 0,
        }
    }

    pub fn run(mut self, io: &mut PanelIo, params: &InitParams) -> Result<InitReport, DriverError> {
        self.enter(InitState::HardReset);
        io.reset.set_level(Level::Low);
        io.delay.delay_ms(RESET_PULSE_MS);
        io.reset.set_level(Level::High);
        io.delay.delay_ms(RESET_RECOVERY_MS);

        self.enter(InitState::SoftReset);
        self.command(cmd::SOFT_RESET, &[])?;
        io.delay.delay_ms(SOFT_RESET_MS);

        self.enter(InitState::SleepExit);
        self.command(cmd::EXIT_SLEEP_MODE, &[])?;
        io.delay.delay_ms(SLEEP_EXIT_MS);

        self.enter(InitState::RegisterProgram);
        for (opcode, args) in panel::REGISTER_PROGRAM {
            self.command(*opcode, args)?;
        }
        self.command(cmd::EXIT_INVERT_MODE, &[])?;
        self.command(cmd::SET_ADDRESS_MODE, &[params.address_mode])?;

        self.enter(InitState::ColorModeSet);
        self.command(cmd::SET_PIXEL_FORMAT, &[cmd::PIXEL_FMT_16BIT])?;
        self.command(cmd::GAMCTRP1, &panel::GAMMA_POSITIVE)?;
        self.command(cmd::GAMCTRN1, &panel::GAMMA_NEGATIVE)?;

        self.enter(InitState::DisplayOn);
        self.command(cmd::SET_DISPLAY_ON, &[])?;
        io.delay.delay_ms(DISPLAY_ON_MS);

        self.enter(InitState::NormalMode);
        self.command(cmd::ENTER_NORMAL_MODE, &[])?;
        io.delay.delay_ms(NORMAL_MODE_MS);

        self.enter(InitState::AddressWindowSet);
        self.command(cmd::SET_COLUMN_ADDRESS, &params.window.column_args())?;
        self.command(cmd::SET_PAGE_ADDRESS, &params.window.page_args())?;

        self.enter(InitState::MemoryWriteArmed);
        self.command(cmd::WRITE_MEMORY_START, &[])?;

        Ok(InitReport {
            state: InitState::MemoryWriteArmed,
            failed_commands: self.failed,
        })
    }

    fn enter(&self, state: InitState) {
        tracing::debug!("panel init: {:?}", state);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn command(&mut self, opcode: u8, args: &[u8]) -> Result<(), DriverError> {
        match self.bus.command(opcode, args) {
            Ok(()) => Ok(()),
            Err(e) => self.on_failure(opcode, e),
        }
    }

    fn on_failure(&mut self, opcode: u8, err: TransferError) -> Result<(), DriverError> {
        match self.policy {
            InitPolicy::Tolerant => {
                tracing::warn!("panel init: command {:#04x} failed, continuing: {}", opcode, err);
                self.failed += 1;
                Ok(())
            }
            InitPolicy::Strict => {
                tracing::error!("panel init: command {:#04x} failed: {}", opcode, err);
                Err(err.into())
            }
        }
    }
}
