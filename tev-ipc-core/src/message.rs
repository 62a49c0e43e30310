//! Packet type tags understood by the tev viewer.
//!
//! Uses a proper enum with `TryFrom`; unknown values are errors, not panics.

use crate::error::TevError;
use std::fmt;

// ── PacketType ───────────────────────────────────────────────────

/// The signed tag byte that follows the length field of every packet.
///
/// Only the latest revision of each command is listed. Older layouts
/// (`OpenImage` v1 = 0, `UpdateImage` v1 = 3, `UpdateImage` v2 = 5) are
/// still accepted by the viewer but never produced by this client.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Reload an already opened image from disk.
    ReloadImage = 1,
    /// Close an image.
    CloseImage = 2,
    /// Create a blank image with named channels.
    CreateImage = 4,
    /// Push pixel values for a region, with per-channel offset/stride (v3).
    UpdateImage = 6,
    /// Open an image from the viewer's disk, with a channel selector (v2).
    OpenImage = 7,
    /// Replace or extend the vector-graphics overlay of an image.
    VectorGraphics = 8,
}

impl PacketType {
    /// The wire tag.
    pub const fn tag(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for PacketType {
    type Error = TevError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PacketType::ReloadImage),
            2 => Ok(PacketType::CloseImage),
            4 => Ok(PacketType::CreateImage),
            6 => Ok(PacketType::UpdateImage),
            7 => Ok(PacketType::OpenImage),
            8 => Ok(PacketType::VectorGraphics),
            _ => Err(TevError::UnknownVariant {
                type_name: "PacketType",
                value: value as i64,
            }),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
