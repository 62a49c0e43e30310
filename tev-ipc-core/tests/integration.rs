//! Integration tests: full session lifecycle, packet ordering and error
//! scenarios over a real TCP connection on localhost. A fake viewer accepts
//! the connection and splits the byte stream back into frames.

use std::time::Duration;

use futures::StreamExt;
use tev_ipc_core::{
    ConnectionInfo, CreateImage, ImageUpdate, ImageView, IpcCodec, IpcPacket, PacketType, Session,
    TevError, TileSize, vg,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_test::{assert_err, assert_ok};
use tokio_util::codec::FramedRead;

// ── Helpers ──────────────────────────────────────────────────────

/// Spin up a listener on an OS-assigned port and return the connection
/// info. The listener is returned so the caller can accept on it.
async fn ephemeral_listener() -> (TcpListener, ConnectionInfo) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let info = ConnectionInfo::new(addr.ip().to_string(), addr.port());
    (listener, info)
}

/// Accept one client and collect every frame it sends until it hangs up.
fn fake_viewer(listener: TcpListener) -> JoinHandle<Vec<IpcPacket>> {
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut frames = FramedRead::new(stream, IpcCodec::new());
        let mut received = Vec::new();
        while let Some(frame) = frames.next().await {
            received.push(frame.unwrap());
        }
        received
    })
}

async fn received(viewer: JoinHandle<Vec<IpcPacket>>) -> Vec<IpcPacket> {
    tokio::time::timeout(Duration::from_secs(5), viewer)
        .await
        .expect("timeout")
        .unwrap()
}

fn i32_at(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

fn f32_at(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

/// `(x, y, width, height)` of an `UpdateImage` packet with the given
/// name and channel names.
fn update_rect(p: &IpcPacket, name: &str, channels: &[&str]) -> (i32, i32, i32, i32) {
    let names: usize = channels.iter().map(|c| c.len() + 1).sum();
    let at = 1 + name.len() + 1 + 4 + names;
    let body = p.body();
    (
        i32_at(body, at),
        i32_at(body, at + 4),
        i32_at(body, at + 8),
        i32_at(body, at + 12),
    )
}

// ── Session lifecycle ────────────────────────────────────────────

#[tokio::test]
async fn test_open_send_close() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    let mut tev = Session::new(info);
    assert_ok!(tev.open().await);
    assert!(tev.uptime().is_some());
    assert_ok!(tev.open_image("/data/a.exr", "", true).await);
    assert_ok!(tev.reload_image("a.exr", false).await);
    assert_ok!(tev.close_image("a.exr").await);
    assert_ok!(tev.close().await);

    let packets = received(viewer).await;
    let kinds: Vec<_> = packets.iter().map(IpcPacket::packet_type).collect();
    assert_eq!(
        kinds,
        vec![
            PacketType::OpenImage,
            PacketType::ReloadImage,
            PacketType::CloseImage
        ]
    );
    assert_eq!(packets[0].body(), b"\x01/data/a.exr\0\0");
}

#[tokio::test]
async fn test_double_open_and_double_close() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    let mut tev = Session::connect(info).await.unwrap();
    let err = tev.open().await.unwrap_err();
    assert!(err.is_state_error());

    assert_ok!(tev.close().await);
    let err = tev.close().await.unwrap_err();
    assert!(err.is_state_error());
    assert!(received(viewer).await.is_empty());
}

#[tokio::test]
async fn test_close_never_opened() {
    let mut tev = Session::new(ConnectionInfo::default());
    assert!(matches!(tev.close().await, Err(TevError::NotOpen)));
}

#[tokio::test]
async fn test_connection_refused() {
    let (listener, info) = ephemeral_listener().await;
    drop(listener);

    let err = Session::connect(info).await.unwrap_err();
    assert!(err.is_io_error());
}

#[tokio::test]
async fn test_scoped_session_releases_connection() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    let stats = Session::scoped(info, async |tev| {
        tev.close_image("a").await?;
        tev.close_image("b").await?;
        Ok(tev.stats())
    })
    .await
    .unwrap();
    assert_eq!(stats.packets_sent, 2);

    // The viewer only sees EOF once the client has shut the socket.
    let packets = received(viewer).await;
    assert_eq!(packets.len(), 2);
    assert_eq!(stats.bytes_sent, packets.iter().map(|p| p.len() as u64).sum());
}

#[tokio::test]
async fn test_dropped_session_releases_connection() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    {
        let mut tev = Session::connect(info).await.unwrap();
        tev.close_image("a").await.unwrap();
    }

    assert_eq!(received(viewer).await.len(), 1);
}

// ── Image commands ───────────────────────────────────────────────

#[tokio::test]
async fn test_create_image_bytes() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    let mut tev = Session::connect(info).await.unwrap();
    let create = CreateImage::new("Test", 200, 300).with_channels(&["R", "G", "B"]);
    tev.create_image(&create).await.unwrap();
    tev.close().await.unwrap();

    let packets = received(viewer).await;
    let b = packets[0].as_bytes();
    assert_eq!(u32::from_le_bytes(b[0..4].try_into().unwrap()) as usize, b.len());
    assert_eq!(b[4], 4);
    assert_eq!(&b[6..11], b"Test\0");
    assert_eq!(i32_at(b, 11), 200);
    assert_eq!(i32_at(b, 15), 300);
    assert_eq!(i32_at(b, 19), 3);
    assert_eq!(&b[23..], b"R\0G\0B\0");
}

#[tokio::test]
async fn test_update_tiles_arrive_in_row_major_order() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    // 300 rows x 200 columns, three channels.
    let (height, width) = (300, 200);
    let data: Vec<f32> = (0..height * width * 3).map(|v| v as f32).collect();
    let image = ImageView::interleaved(&data, height, width, 3).unwrap();
    let update = ImageUpdate::new("Test", image)
        .with_channels(&["R", "G", "B"])
        .at(10, 20);

    let mut tev = Session::connect(info).await.unwrap();
    let sent = tev.update_image(&update).await.unwrap();
    tev.close().await.unwrap();
    assert_eq!(sent, 6);

    let packets = received(viewer).await;
    let rects: Vec<_> = packets
        .iter()
        .map(|p| update_rect(p, "Test", &["R", "G", "B"]))
        .collect();
    assert_eq!(
        rects,
        vec![
            (10, 20, 128, 128),
            (138, 20, 72, 128),
            (10, 148, 128, 128),
            (138, 148, 72, 128),
            (10, 276, 128, 44),
            (138, 276, 72, 44),
        ]
    );

    // Second tile starts at source pixel (row 0, col 128).
    let body = packets[1].body();
    let data_at = 1 + 5 + 4 + 6 + 16 + 3 * 8 * 2;
    assert_eq!(f32_at(body, data_at), (128 * 3) as f32);
    assert_eq!(body.len() - data_at, 72 * 128 * 3 * 4);
}

#[tokio::test]
async fn test_update_without_tiling_is_one_packet() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    let data = vec![1u8; 300 * 200];
    let image = ImageView::single_channel(&data, 300, 200).unwrap();
    let update = ImageUpdate::new("Test", image).without_tiling();

    let mut tev = Session::connect(info).await.unwrap();
    assert_eq!(tev.update_image(&update).await.unwrap(), 1);
    tev.close().await.unwrap();

    let packets = received(viewer).await;
    assert_eq!(packets.len(), 1);
    assert_eq!(update_rect(&packets[0], "Test", &["R"]), (0, 0, 200, 300));
}

#[tokio::test]
async fn test_custom_tile_size() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    let data = vec![0f64; 10 * 10];
    let image = ImageView::single_channel(&data, 10, 10).unwrap();
    let update = ImageUpdate::new("t", image).tile_size(TileSize::square(4).unwrap());

    let mut tev = Session::connect(info).await.unwrap();
    assert_eq!(tev.update_image(&update).await.unwrap(), 9);
    tev.close().await.unwrap();
    assert_eq!(received(viewer).await.len(), 9);
}

#[tokio::test]
async fn test_not_enough_channel_names_sends_nothing() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    let data = vec![0f32; 4 * 4 * 5];
    let image = ImageView::interleaved(&data, 4, 4, 5).unwrap();
    // Defaults name only four channels.
    let update = ImageUpdate::new("t", image);

    let mut tev = Session::connect(info).await.unwrap();
    let err = tev.update_image(&update).await.unwrap_err();
    assert!(err.is_configuration_error());
    assert!(tev.is_open());
    assert_eq!(tev.stats().packets_sent, 0);
    tev.close().await.unwrap();

    assert!(received(viewer).await.is_empty());
}

// ── Vector graphics ──────────────────────────────────────────────

#[tokio::test]
async fn test_vector_graphics_stream() {
    let (listener, info) = ephemeral_listener().await;
    let viewer = fake_viewer(listener);

    let commands = [vg::begin_path(), vg::rect(0.0, 0.0, 64.0, 64.0), vg::stroke()];
    let mut tev = Session::connect(info).await.unwrap();
    tev.update_vector_graphics("im", &commands, false, false)
        .await
        .unwrap();
    tev.close().await.unwrap();

    let packets = received(viewer).await;
    let b = packets[0].as_bytes();
    assert_eq!(b[4], 8);
    assert_eq!(&b[6..9], b"im\0");
    assert_eq!(b[9], 0);
    assert_eq!(u32::from_le_bytes(b[10..14].try_into().unwrap()), 3);
    assert_eq!(b[14], 6);
    assert_eq!(b[15], 18);
    assert_eq!(
        [f32_at(b, 16), f32_at(b, 20), f32_at(b, 24), f32_at(b, 28)],
        [0.0, 0.0, 64.0, 64.0]
    );
    assert_eq!(b[32], 5);
    assert_eq!(b.len(), 33);
}

#[tokio::test]
async fn test_operations_require_open_session() {
    let mut tev = Session::new(ConnectionInfo::default());
    assert_err!(tev.open_image("a", "", true).await);
    assert_err!(tev.reload_image("a", true).await);
    assert_err!(
        tev.update_vector_graphics("a", &[vg::save()], true, false)
            .await
    );
}
