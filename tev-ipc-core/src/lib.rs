//! # tev-ipc-core
//!
//! Client library for remote-controlling the tev image viewer over its
//! binary TCP protocol.
//!
//! This crate contains:
//! - **Packets**: `IpcPacket`, `PacketType`, `ChannelDesc`, length-prefixed little-endian encoding
//! - **Codec**: `IpcCodec` for framed TCP I/O via `tokio_util`
//! - **Images**: `ImageView` strided pixel buffers over any `Sample` type
//! - **Tiling**: `TileGrid` and `tiles` for splitting updates into bounded packets
//! - **Vector graphics**: `VgCommand` and one constructor per drawing operation in [`vg`]
//! - **Network**: `Session` owning one connection, `ConnectionInfo`
//! - **State**: `SessionPhase` state machine
//! - **Client**: `CreateImage`, `ImageUpdate` and the high-level `Session` commands
//! - **Error**: `TevError`, typed, `thiserror`-based error hierarchy

pub mod client;
pub mod codec;
pub mod error;
pub mod image;
pub mod message;
pub mod network;
pub mod packet;
pub mod state;
pub mod tile;
pub mod vg;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use client::{CreateImage, DEFAULT_CHANNEL_NAMES, ImageUpdate};
pub use codec::{DEFAULT_MAX_FRAME_LEN, IpcCodec};
pub use error::TevError;
pub use image::{ImageView, Sample};
pub use message::PacketType;
pub use network::{ConnectionInfo, DEFAULT_HOST, DEFAULT_PORT, Session, SessionStats};
pub use packet::{ChannelDesc, HEADER_SIZE, IpcPacket, MAX_PACKET_SIZE};
pub use state::SessionPhase;
pub use tile::{DEFAULT_TILE_SIZE, Tile, TileGrid, TileRect, TileSize};
pub use vg::{VgCommand, VgKind, Winding};

/// Former name of [`Session`].
pub type TevIpc = Session;

/// Former name of [`Session`].
pub type Ipc = Session;
