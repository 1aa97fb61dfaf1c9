// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Session state machine
//!
//! ```text
//! ┌──────┐ preheat() / first ingestion ┌─────────┐  close()  ┌────────┐
//! │ Idle │────────────────────────────►│ Started │──────────►│ Closed │
//! └──┬───┘                             └─────────┘           └────────┘
//!    │                 close(): nothing to drain                 ▲
//!    └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration is only accepted while `Idle`. `Closed` is terminal.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

use crate::core::{FrameFeedError, Result};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SessionState {
    /// Graph not started - streams and side packets can be configured
    #[default]
    Idle = 0,
    /// Graph running - ingestion is admitted
    Started = 1,
    /// Graph drained and torn down
    Closed = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Started,
            _ => Self::Closed,
        }
    }

    pub fn is_configurable(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Linearizable register for [`SessionState`].
///
/// Reads are a single atomic load. Transitions serialize on `transition`, so
/// exactly one caller runs the start action and configuration can never
/// interleave with it.
pub(crate) struct Lifecycle {
    state: AtomicU8,
    transition: Mutex<()>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Idle as u8),
            transition: Mutex::new(()),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Runs `start` if the session is still idle.
    ///
    /// Returns `Ok(true)` for the caller that performed the start. Callers
    /// racing it block until the start action has finished. The session is
    /// `Started` afterwards even if `start` failed; the failure is returned
    /// to the starting caller only.
    pub(crate) fn ensure_started<F>(&self, start: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        match self.state() {
            SessionState::Started => return Ok(false),
            SessionState::Closed => return Err(closed_error()),
            SessionState::Idle => {}
        }

        let _transition = self.transition.lock();
        match self.state() {
            SessionState::Started => Ok(false),
            SessionState::Closed => Err(closed_error()),
            SessionState::Idle => {
                let outcome = start();
                self.state
                    .store(SessionState::Started as u8, Ordering::Release);
                outcome.map(|()| true)
            }
        }
    }

    /// Runs `configure` while holding the transition lock, provided the
    /// session is idle.
    pub(crate) fn configure<R, F>(&self, operation: &str, configure: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        let _transition = self.transition.lock();
        let state = self.state();
        if !state.is_configurable() {
            return Err(FrameFeedError::Configuration(format!(
                "{} must be called before the graph is started (session is {:?})",
                operation, state
            )));
        }
        configure()
    }

    /// Moves to `Closed` and returns the state the session was in before.
    ///
    /// Only the first caller sees `Started`; that caller owns the drain and
    /// runs it after this returns, without the transition lock held.
    pub(crate) fn close(&self) -> SessionState {
        let _transition = self.transition.lock();
        let previous = self.state();
        self.state
            .store(SessionState::Closed as u8, Ordering::Release);
        previous
    }
}

fn closed_error() -> FrameFeedError {
    FrameFeedError::SessionClosed("no further input is accepted".into())
}
