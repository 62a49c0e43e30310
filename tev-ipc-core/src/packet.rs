//! Length-prefixed IPC packets.
//!
//! Every packet starts with its total length (including the length field
//! itself) and a signed type tag:
//!
//! ```text
//! length:  u32  (4)   little-endian, patched after the body is written
//! type:    i8   (1)   see [`PacketType`]
//! body:    ...        type-specific
//! ```
//!
//! Integers are little-endian two's-complement, floats are IEEE-754 `f32`,
//! and strings are raw bytes followed by a single NUL terminator.

use std::fmt::{self, Debug};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::TevError;
use crate::message::PacketType;
use crate::vg::VgCommand;

/// Size of the length prefix.
pub const LENGTH_SIZE: usize = 4;

/// Length prefix plus type tag.
pub const HEADER_SIZE: usize = LENGTH_SIZE + 1;

/// Largest packet the 32-bit length field can describe.
pub const MAX_PACKET_SIZE: usize = u32::MAX as usize;

// ── ChannelDesc ──────────────────────────────────────────────────

/// Where one named channel lives inside the flat pixel array of an
/// `UpdateImage` packet: value of pixel `i` is `data[offset + i * stride]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDesc {
    pub name: String,
    pub offset: i64,
    pub stride: i64,
}

impl ChannelDesc {
    pub fn new(name: impl Into<String>, offset: i64, stride: i64) -> Self {
        Self {
            name: name.into(),
            offset,
            stride,
        }
    }

    /// Descriptors for `names.len()` fully interleaved channels.
    pub fn interleaved<S: AsRef<str>>(names: &[S]) -> Vec<Self> {
        let n = names.len() as i64;
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Self::new(name.as_ref(), i as i64, n))
            .collect()
    }
}

// ── PacketWriter ─────────────────────────────────────────────────

/// Append-only body builder. Reserves the length field on construction and
/// patches it in [`finish`](Self::finish).
pub(crate) struct PacketWriter {
    kind: PacketType,
    buf: BytesMut,
}

impl PacketWriter {
    pub(crate) fn new(kind: PacketType) -> Self {
        Self::with_capacity(kind, 64)
    }

    pub(crate) fn with_capacity(kind: PacketType, capacity: usize) -> Self {
        let mut buf = BytesMut::with_capacity(capacity.max(HEADER_SIZE));
        buf.put_u32_le(0); // reserved for length
        buf.put_i8(kind.tag());
        Self { kind, buf }
    }

    pub(crate) fn put_bool(&mut self, value: bool) -> &mut Self {
        self.buf.put_u8(value as u8);
        self
    }

    pub(crate) fn put_i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32_le(value);
        self
    }

    pub(crate) fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    pub(crate) fn put_i64(&mut self, value: i64) -> &mut Self {
        self.buf.put_i64_le(value);
        self
    }

    pub(crate) fn put_f32s(&mut self, values: &[f32]) -> &mut Self {
        self.buf.reserve(values.len() * 4);
        for &v in values {
            self.buf.put_f32_le(v);
        }
        self
    }

    /// UTF-8 bytes plus NUL terminator.
    pub(crate) fn put_str(&mut self, value: &str) -> Result<&mut Self, TevError> {
        if value.as_bytes().contains(&0) {
            return Err(TevError::InteriorNul(value.to_string()));
        }
        self.buf.put_slice(value.as_bytes());
        self.buf.put_u8(0);
        Ok(self)
    }

    /// Channel names are restricted to 7-bit ASCII.
    pub(crate) fn put_channel_name(&mut self, value: &str) -> Result<&mut Self, TevError> {
        if !value.is_ascii() {
            return Err(TevError::NonAsciiChannelName(value.to_string()));
        }
        self.put_str(value)
    }

    pub(crate) fn put_vg_command(&mut self, command: &VgCommand) -> &mut Self {
        self.buf.put_i8(command.kind().tag());
        self.put_f32s(command.params())
    }

    pub(crate) fn finish(mut self) -> Result<IpcPacket, TevError> {
        let len = self.buf.len();
        let len32 = u32::try_from(len).map_err(|_| TevError::PacketTooLarge {
            size: len,
            max: MAX_PACKET_SIZE,
        })?;
        self.buf[..LENGTH_SIZE].copy_from_slice(&len32.to_le_bytes());
        Ok(IpcPacket {
            kind: self.kind,
            bytes: self.buf.freeze(),
        })
    }
}

fn wire_i32(field: &'static str, value: usize) -> Result<i32, TevError> {
    i32::try_from(value).map_err(|_| TevError::OutOfRange {
        field,
        value: value as i128,
    })
}

// ── IpcPacket ────────────────────────────────────────────────────

/// A fully serialized packet. Cheap to clone; the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct IpcPacket {
    kind: PacketType,
    bytes: Bytes,
}

impl IpcPacket {
    /// `OpenImage` (v2): open `path` from the viewer's file system.
    /// An empty `channel_selector` selects every channel.
    pub fn open_image(path: &str, channel_selector: &str, grab_focus: bool) -> Result<Self, TevError> {
        let mut w = PacketWriter::new(PacketType::OpenImage);
        w.put_bool(grab_focus);
        w.put_str(path)?;
        w.put_str(channel_selector)?;
        w.finish()
    }

    /// `ReloadImage`: re-read the named image from disk.
    pub fn reload_image(name: &str, grab_focus: bool) -> Result<Self, TevError> {
        let mut w = PacketWriter::new(PacketType::ReloadImage);
        w.put_bool(grab_focus);
        w.put_str(name)?;
        w.finish()
    }

    /// `CloseImage`.
    pub fn close_image(name: &str) -> Result<Self, TevError> {
        let mut w = PacketWriter::new(PacketType::CloseImage);
        w.put_str(name)?;
        w.finish()
    }

    /// `CreateImage`: a blank `width × height` image with the given channels.
    pub fn create_image<S: AsRef<str>>(
        name: &str,
        width: i32,
        height: i32,
        channel_names: &[S],
        grab_focus: bool,
    ) -> Result<Self, TevError> {
        if width <= 0 || height <= 0 {
            return Err(TevError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        if channel_names.is_empty() {
            return Err(TevError::EmptyChannelList);
        }
        let n_channels = wire_i32("channel count", channel_names.len())?;

        let mut w = PacketWriter::new(PacketType::CreateImage);
        w.put_bool(grab_focus);
        w.put_str(name)?;
        w.put_i32(width).put_i32(height);
        w.put_i32(n_channels);
        for channel in channel_names {
            w.put_channel_name(channel.as_ref())?;
        }
        w.finish()
    }

    /// `UpdateImage` (v3) with explicit per-channel layout.
    ///
    /// `data` must hold exactly `max(offset + (width * height - 1) * stride + 1)`
    /// values over all channels.
    pub fn update_image(
        name: &str,
        grab_focus: bool,
        channels: &[ChannelDesc],
        (x, y): (i32, i32),
        (width, height): (i32, i32),
        data: &[f32],
    ) -> Result<Self, TevError> {
        if channels.is_empty() {
            return Err(TevError::EmptyChannelList);
        }
        if width <= 0 || height <= 0 {
            return Err(TevError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        let expected = strided_data_len(channels, width as usize * height as usize)?;
        if data.len() != expected {
            return Err(TevError::ImageDataSize {
                expected,
                actual: data.len(),
            });
        }
        let n_channels = wire_i32("channel count", channels.len())?;

        let names_len: usize = channels.iter().map(|c| c.name.len() + 1).sum();
        let capacity = HEADER_SIZE + 1 + name.len() + 1 + 4 + names_len + 16
            + channels.len() * 16
            + data.len() * 4;

        let mut w = PacketWriter::with_capacity(PacketType::UpdateImage, capacity);
        w.put_bool(grab_focus);
        w.put_str(name)?;
        w.put_i32(n_channels);
        for channel in channels {
            w.put_channel_name(&channel.name)?;
        }
        w.put_i32(x).put_i32(y).put_i32(width).put_i32(height);
        for channel in channels {
            w.put_i64(channel.offset);
        }
        for channel in channels {
            w.put_i64(channel.stride);
        }
        w.put_f32s(data);
        w.finish()
    }

    /// `VectorGraphics`: replace (or, with `append`, extend) the overlay
    /// of the named image with `commands`.
    pub fn vector_graphics(
        name: &str,
        grab_focus: bool,
        append: bool,
        commands: &[VgCommand],
    ) -> Result<Self, TevError> {
        let count = u32::try_from(commands.len()).map_err(|_| TevError::OutOfRange {
            field: "command count",
            value: commands.len() as i128,
        })?;
        let body: usize = commands.iter().map(VgCommand::encoded_len).sum();

        let mut w = PacketWriter::with_capacity(
            PacketType::VectorGraphics,
            HEADER_SIZE + name.len() + 7 + body,
        );
        w.put_bool(grab_focus);
        w.put_str(name)?;
        w.put_bool(append);
        w.put_u32(count);
        for command in commands {
            w.put_vg_command(command);
        }
        w.finish()
    }

    /// Wrap a received frame, checking its length header and tag.
    pub fn from_frame(bytes: Bytes) -> Result<Self, TevError> {
        if bytes.len() < HEADER_SIZE {
            return Err(TevError::InvalidPacket("frame shorter than header"));
        }
        let declared = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if declared != bytes.len() {
            return Err(TevError::InvalidPacket("length header does not match frame size"));
        }
        let kind = PacketType::try_from(bytes[LENGTH_SIZE] as i8)?;
        Ok(Self { kind, bytes })
    }

    pub fn packet_type(&self) -> PacketType {
        self.kind
    }

    /// The complete wire representation, length prefix included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes after the type tag.
    pub fn body(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`: a packet carries at least its header.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Debug for IpcPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpcPacket")
            .field("type", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Number of values an `UpdateImage` body must carry for `n_pixels` pixels.
fn strided_data_len(channels: &[ChannelDesc], n_pixels: usize) -> Result<usize, TevError> {
    let mut len = 0usize;
    for channel in channels {
        if channel.offset < 0 || channel.stride < 0 {
            return Err(TevError::InvalidLayout(format!(
                "channel {:?} has negative offset or stride",
                channel.name
            )));
        }
        let last = (n_pixels as u128 - 1) * channel.stride as u128 + channel.offset as u128 + 1;
        let last = usize::try_from(last).map_err(|_| {
            TevError::InvalidLayout(format!("channel {:?} addresses beyond memory", channel.name))
        })?;
        len = len.max(last);
    }
    Ok(len)
}

// ── Tests ────────────────────────────────────────────────────────
