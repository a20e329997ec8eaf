//! Device-is-live guard.
//!
//! Entry points take a [`DeviceTicket`] before touching device resources.
//! Once [`DeviceLifetime::unplug`] has run, no new tickets are handed out and
//! `unplug` itself waits until every outstanding ticket has been dropped.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    unplugged: bool,
    active: usize,
}

#[derive(Debug, Default)]
pub struct DeviceLifetime {
    state: Mutex<State>,
    drained: Condvar,
}

impl DeviceLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter a device section. Returns `None` once the device is unplugged.
    pub fn enter(&self) -> Option<DeviceTicket<'_>> {
        let mut state = self.state();
        if state.unplugged {
            return None;
        }
        state.active += 1;
        Some(DeviceTicket { lifetime: self })
    }

    pub fn is_unplugged(&self) -> bool {
        self.state().unplugged
    }

    /// Mark the device gone and wait for in-flight sections to finish.
    ///
    /// Must not be called while the calling thread holds a ticket.
    pub fn unplug(&self) {
        let mut state = self.state();
        state.unplugged = true;
        while state.active > 0 {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn exit(&self) {
        let mut state = self.state();
        state.active -= 1;
        if state.active == 0 {
            self.drained.notify_all();
        }
    }
}

/// Proof of being inside a device section; exits on drop
#[must_use = "the device section ends when the ticket is dropped"]
pub struct DeviceTicket<'a> {
    lifetime: &'a DeviceLifetime,
}

impl Drop for DeviceTicket<'_> {
    fn drop(&mut self) {
        self.lifetime.exit();
    }
}
