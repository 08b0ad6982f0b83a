//! Process-wide host toolkit bootstrap
//!
//! Each backend type owns a `static` [`HostBootstrap`]. Backend creation calls
//! [`HostBootstrap::acquire`] and destruction calls [`HostBootstrap::release`]; the
//! host init hook only runs on the 0 -> 1 transition and the shutdown hook on 1 -> 0.

use std::sync::Mutex;

use crate::error::{GfxError, Result};

#[derive(Debug, Default)]
struct BootstrapState {
    refs: usize,
    inits: usize,
}

#[derive(Debug)]
pub struct HostBootstrap {
    name: &'static str,
    state: Mutex<BootstrapState>,
}

impl HostBootstrap {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(BootstrapState { refs: 0, inits: 0 }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BootstrapState>> {
        self.state
            .lock()
            .map_err(|_| GfxError::Unknown(format!("{} bootstrap lock poisoned", self.name)))
    }

    /// Add a reference, running `init` if this is the first one.
    ///
    /// A failing `init` leaves the count untouched.
    pub fn acquire<F>(&self, init: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut state = self.lock()?;
        if state.refs == 0 {
            init()?;
            state.inits += 1;
            tracing::debug!(host = self.name, "host toolkit initialized");
        }
        state.refs = state
            .refs
            .checked_add(1)
            .ok_or_else(|| GfxError::Overflow(format!("{} backend count", self.name)))?;
        Ok(())
    }

    /// Drop a reference, running `shutdown` when the last one goes away
    pub fn release<F>(&self, shutdown: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut state = self.lock()?;
        if state.refs == 0 {
            return Err(GfxError::State(format!(
                "{} bootstrap released more often than acquired",
                self.name
            )));
        }
        state.refs -= 1;
        if state.refs == 0 {
            tracing::debug!(host = self.name, "host toolkit shut down");
            shutdown()?;
        }
        Ok(())
    }

    pub fn refs(&self) -> usize {
        self.lock().map(|s| s.refs).unwrap_or(0)
    }

    /// Number of times the init hook has run
    pub fn init_count(&self) -> usize {
        self.lock().map(|s| s.inits).unwrap_or(0)
    }
}
