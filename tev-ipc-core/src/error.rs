//! Domain-specific error types for the tev IPC client.
//!
//! All fallible operations return `Result<T, TevError>`.
//! No panics on invalid caller input; every error is typed. Transport
//! failures are carried through untouched in [`TevError::Connection`].

use thiserror::Error;

/// The canonical error type for the tev IPC client.
#[derive(Debug, Error)]
pub enum TevError {
    // ── State Errors ─────────────────────────────────────────────
    /// `open` was called on a session that already holds a connection.
    #[error("communication already started")]
    AlreadyOpen,

    /// An operation needed a connection but the session is closed.
    #[error("communication was not started")]
    NotOpen,

    // ── Configuration Errors ─────────────────────────────────────
    /// The pixel buffer has more channels than names were supplied.
    #[error("not enough channel names provided: {provided} given, {needed} needed")]
    NotEnoughChannelNames { needed: usize, provided: usize },

    /// A packet that carries channels was given none.
    #[error("at least one channel is required")]
    EmptyChannelList,

    /// Tile width or height was zero.
    #[error("tile size must be positive, got {width}x{height}")]
    InvalidTileSize { width: usize, height: usize },

    /// Image width or height was not positive.
    #[error("image dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// A pixel-buffer view does not fit inside its backing slice.
    #[error("invalid image layout: {0}")]
    InvalidLayout(String),

    /// A `host[:port]` string could not be parsed.
    #[error("invalid viewer address: {0:?}")]
    InvalidAddress(String),

    /// Strided image data does not match the declared size, offsets and strides.
    #[error("image data has {actual} values, expected {expected}")]
    ImageDataSize { expected: usize, actual: usize },

    // ── Encoding Errors ──────────────────────────────────────────
    /// Wire strings are NUL-terminated and cannot contain a NUL themselves.
    #[error("string contains an interior NUL byte: {0:?}")]
    InteriorNul(String),

    /// Channel names are sent as 7-bit ASCII.
    #[error("channel name is not ASCII: {0:?}")]
    NonAsciiChannelName(String),

    /// A vector-graphics command was built with the wrong number of parameters.
    #[error("{kind} takes {expected} parameters, got {actual}")]
    ArityMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value}")]
    UnknownVariant { type_name: &'static str, value: i64 },

    /// A value does not fit the wire field it is written to.
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i128 },

    /// The serialized packet cannot be described by its 32-bit length header.
    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// A received frame is malformed.
    #[error("invalid packet: {0}")]
    InvalidPacket(&'static str),

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),
}

impl TevError {
    /// Returns `true` for errors caused by operating a session in the wrong state.
    pub fn is_state_error(&self) -> bool {
        matches!(self, TevError::AlreadyOpen | TevError::NotOpen)
    }

    /// Returns `true` for errors caused by inconsistent caller-supplied parameters.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            TevError::NotEnoughChannelNames { .. }
                | TevError::EmptyChannelList
                | TevError::InvalidTileSize { .. }
                | TevError::InvalidDimensions { .. }
                | TevError::InvalidLayout(_)
                | TevError::InvalidAddress(_)
                | TevError::ImageDataSize { .. }
        )
    }

    /// Returns `true` for errors reported by the transport.
    pub fn is_io_error(&self) -> bool {
        matches!(self, TevError::Connection(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = TevError> = std::result::Result<T, E>;
