//! Two-phase DBI command protocol.
//!
//! A command is one opcode byte sent with the selector in command position,
//! followed by its argument bytes with the selector in data position. Both
//! phases run under one acquisition of the bus lock, so no other transfer can
//! slip between an opcode and its arguments.

use crate::transport::{BusGuard, BusTransport, Selector, SpiLink, TransferError, TransferMode};

impl<L: SpiLink> BusGuard<'_, L> {
    /// Send `opcode` followed by `args`.
    ///
    /// The data phase is skipped for zero-argument commands. If the opcode
    /// write fails, its arguments are not sent.
    pub fn command(&mut self, opcode: u8, args: &[u8]) -> Result<(), TransferError> {
        self.set_phase(Selector::Command, TransferMode::Command)?;
        self.transfer(&[opcode])?;
        self.set_phase(Selector::Data, TransferMode::Command)?;
        self.transfer(args)
    }
}

impl<L: SpiLink> BusTransport<L> {
    /// Lock the bus and send one command
    pub fn command(&self, opcode: u8, args: &[u8]) -> Result<(), TransferError> {
        self.lock().command(opcode, args)
    }
}
