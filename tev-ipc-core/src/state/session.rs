//! Session lifecycle state machine.
//!
//! Models the life of one viewer connection with validated transitions
//! that return `Result` instead of panicking.

use std::time::{Duration, Instant};

use crate::error::TevError;

// ── SessionPhase ─────────────────────────────────────────────────

/// The current phase of a [`Session`](crate::Session).
///
/// ```text
///  Closed ──► Connecting ──► Open
///    ▲            │            │
///    └────────────┴────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No connection. Initial and terminal state.
    #[default]
    Closed,

    /// TCP connect in flight.
    Connecting,

    /// Connected; packets may be sent.
    Open {
        /// When the connection was established.
        since: Instant,
    },
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open { .. } => write!(f, "Open"),
        }
    }
}

impl SessionPhase {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// How long the session has been open. `None` for any other phase.
    pub fn open_duration(&self) -> Option<Duration> {
        match self {
            Self::Open { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    /// Fails with [`TevError::NotOpen`] unless the session is open.
    pub fn ensure_open(&self) -> Result<(), TevError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TevError::NotOpen)
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Connecting`.
    ///
    /// Valid from: `Closed`.
    pub fn begin_connect(&mut self) -> Result<(), TevError> {
        match self {
            Self::Closed => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(TevError::AlreadyOpen),
        }
    }

    /// Transition to `Open`.
    ///
    /// Valid from: `Connecting`.
    pub fn complete_connect(&mut self) -> Result<(), TevError> {
        match self {
            Self::Connecting => {
                *self = Self::Open {
                    since: Instant::now(),
                };
                Ok(())
            }
            Self::Open { .. } => Err(TevError::AlreadyOpen),
            Self::Closed => Err(TevError::NotOpen),
        }
    }

    /// Transition back to `Closed` after a failed connect.
    ///
    /// Valid from: `Connecting`.
    pub fn abort_connect(&mut self) -> Result<(), TevError> {
        match self {
            Self::Connecting => {
                *self = Self::Closed;
                Ok(())
            }
            Self::Open { .. } => Err(TevError::AlreadyOpen),
            Self::Closed => Err(TevError::NotOpen),
        }
    }

    /// Transition to `Closed`.
    ///
    /// Valid from: `Open`.
    pub fn close(&mut self) -> Result<(), TevError> {
        match self {
            Self::Open { .. } => {
                *self = Self::Closed;
                Ok(())
            }
            _ => Err(TevError::NotOpen),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
