//! `tokio_util` codec for the tev IPC stream.
//!
//! Encoding writes an already serialized [`IpcPacket`] verbatim. Decoding
//! only splits the stream at length prefixes and checks the header; bodies
//! are left uninterpreted.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::TevError;
use crate::packet::{HEADER_SIZE, IpcPacket, LENGTH_SIZE};

/// Largest frame the decoder accepts unless raised with
/// [`IpcCodec::with_max_frame_len`]. An untiled 4096×4096 RGBA update fits.
pub const DEFAULT_MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct IpcCodec {
    max_frame_len: usize,
}

impl IpcCodec {
    pub fn new() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Reject incoming frames longer than `max` bytes. Nothing is buffered
    /// for a frame whose header exceeds it.
    pub fn with_max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = max;
        self
    }
}

impl Default for IpcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IpcCodec {
    type Item = IpcPacket;
    type Error = TevError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_SIZE {
            return Ok(None);
        }

        let len = u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if len < HEADER_SIZE {
            return Err(TevError::InvalidPacket("length field smaller than header"));
        }
        if len > self.max_frame_len {
            return Err(TevError::PacketTooLarge {
                size: len,
                max: self.max_frame_len,
            });
        }
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        let frame = src.split_to(len).freeze();
        IpcPacket::from_frame(frame).map(Some)
    }
}

impl Encoder<IpcPacket> for IpcCodec {
    type Error = TevError;

    fn encode(&mut self, item: IpcPacket, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(item.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_split_stream() {
        let mut codec = IpcCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(IpcPacket::close_image("a").unwrap(), &mut buf)
            .unwrap();
        codec
            .encode(IpcPacket::reload_image("b", true).unwrap(), &mut buf)
            .unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.body(), b"a\0");
        assert_eq!(second.body(), b"\x01b\0");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn partial_frame_waits_for_more() {
        let packet = IpcPacket::open_image("/data/img.exr", "", false).unwrap();
        let bytes = packet.as_bytes();
        let mut codec = IpcCodec::new();

        let mut buf = BytesMut::from(&bytes[..3]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&bytes[3..10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&bytes[10..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), packet);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut codec = IpcCodec::new().with_max_frame_len(16);
        let mut buf = BytesMut::from(&100u32.to_le_bytes()[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(TevError::PacketTooLarge { size: 100, max: 16 })
        ));
    }

    #[test]
    fn default_limit_rejects_huge_header_without_reserving() {
        let mut codec = IpcCodec::default();
        let mut buf = BytesMut::from(&u32::MAX.to_le_bytes()[..]);
        buf.extend_from_slice(&[7]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(TevError::PacketTooLarge { max: DEFAULT_MAX_FRAME_LEN, .. })
        ));
        assert!(buf.capacity() < 1024);
    }

    #[test]
    fn undersized_length_is_rejected() {
        let mut codec = IpcCodec::new();
        let mut buf = BytesMut::from(&[2u8, 0, 0, 0, 0][..]);
        assert!(codec.decode(&mut buf).is_err());
    }
}
