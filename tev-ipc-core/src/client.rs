//! High-level viewer commands on top of [`Session`].
//!
//! Every method checks that the session is open before touching anything
//! else, builds its packet(s) and writes them in call order. Pixel updates go
//! through the tiler and are sent one packet per tile.

use tracing::debug;

use crate::error::TevError;
use crate::image::{ImageView, Sample};
use crate::network::Session;
use crate::packet::{ChannelDesc, IpcPacket};
use crate::tile::{self, TileGrid, TileSize};
use crate::vg::VgCommand;

/// Channel names used when the caller does not supply any.
pub const DEFAULT_CHANNEL_NAMES: [&str; 4] = ["R", "G", "B", "A"];

// ── CreateImage ──────────────────────────────────────────────────

/// Parameters of a `CreateImage` command.
#[derive(Debug, Clone)]
pub struct CreateImage<'a> {
    name: &'a str,
    width: i32,
    height: i32,
    channel_names: &'a [&'a str],
    grab_focus: bool,
}

impl<'a> CreateImage<'a> {
    /// A `width × height` image with RGBA channels that grabs focus.
    pub fn new(name: &'a str, width: i32, height: i32) -> Self {
        Self {
            name,
            width,
            height,
            channel_names: &DEFAULT_CHANNEL_NAMES,
            grab_focus: true,
        }
    }

    pub fn with_channels(mut self, channel_names: &'a [&'a str]) -> Self {
        self.channel_names = channel_names;
        self
    }

    pub fn grab_focus(mut self, grab_focus: bool) -> Self {
        self.grab_focus = grab_focus;
        self
    }

    pub fn packet(&self) -> Result<IpcPacket, TevError> {
        IpcPacket::create_image(
            self.name,
            self.width,
            self.height,
            self.channel_names,
            self.grab_focus,
        )
    }
}

// ── ImageUpdate ──────────────────────────────────────────────────

/// A pixel update for an existing image, split into tiles on send.
///
/// The buffer's channel axis (or 1 without one) decides how many of the
/// supplied names are used; the first `n` names label the `n` channels.
#[derive(Debug, Clone)]
pub struct ImageUpdate<'a, T> {
    name: &'a str,
    image: ImageView<'a, T>,
    channel_names: &'a [&'a str],
    x: i64,
    y: i64,
    grab_focus: bool,
    tile_size: Option<TileSize>,
}

impl<'a, T: Sample> ImageUpdate<'a, T> {
    /// Update at the image origin with RGBA names and 128×128 tiles.
    pub fn new(name: &'a str, image: ImageView<'a, T>) -> Self {
        Self {
            name,
            image,
            channel_names: &DEFAULT_CHANNEL_NAMES,
            x: 0,
            y: 0,
            grab_focus: false,
            tile_size: Some(TileSize::default()),
        }
    }

    pub fn with_channels(mut self, channel_names: &'a [&'a str]) -> Self {
        self.channel_names = channel_names;
        self
    }

    /// Image-space position of the buffer's top-left pixel.
    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn grab_focus(mut self, grab_focus: bool) -> Self {
        self.grab_focus = grab_focus;
        self
    }

    pub fn tile_size(mut self, tile_size: TileSize) -> Self {
        self.tile_size = Some(tile_size);
        self
    }

    /// Send the whole buffer as a single packet.
    pub fn without_tiling(mut self) -> Self {
        self.tile_size = None;
        self
    }

    pub fn grid(&self) -> TileGrid {
        match self.tile_size {
            Some(size) => TileGrid::new(self.image.height(), self.image.width(), size),
            None => TileGrid::whole(self.image.height(), self.image.width()),
        }
    }

    fn selected_channels(&self) -> Result<Vec<ChannelDesc>, TevError> {
        let needed = self.image.channel_count();
        if self.channel_names.len() < needed {
            return Err(TevError::NotEnoughChannelNames {
                needed,
                provided: self.channel_names.len(),
            });
        }
        Ok(ChannelDesc::interleaved(&self.channel_names[..needed]))
    }

    /// Encoded tile packets in transmission order.
    ///
    /// Channel names are checked up front; per-tile failures (coordinates
    /// overflowing the wire's `i32`, bad names) surface as the iterator runs.
    pub fn packets(&self) -> Result<impl Iterator<Item = Result<IpcPacket, TevError>>, TevError> {
        let channels = self.selected_channels()?;
        let (name, grab_focus, x0, y0) = (self.name, self.grab_focus, self.x, self.y);

        Ok(tile::tiles(self.image, self.grid()).map(move |tile| {
            let tile = tile?;
            let origin = (
                image_coord("x", x0, tile.rect.x)?,
                image_coord("y", y0, tile.rect.y)?,
            );
            let extent = (
                image_coord("width", 0, tile.rect.width)?,
                image_coord("height", 0, tile.rect.height)?,
            );
            IpcPacket::update_image(name, grab_focus, &channels, origin, extent, &tile.data)
        }))
    }
}

fn image_coord(field: &'static str, base: i64, offset: usize) -> Result<i32, TevError> {
    let value = base as i128 + offset as i128;
    i32::try_from(value).map_err(|_| TevError::OutOfRange { field, value })
}

// ── Session operations ───────────────────────────────────────────

impl Session {
    /// Ask the viewer to open `path` from its own file system. An empty
    /// `channel_selector` loads every channel.
    pub async fn open_image(
        &mut self,
        path: &str,
        channel_selector: &str,
        grab_focus: bool,
    ) -> Result<(), TevError> {
        self.ensure_open()?;
        debug!(path, channel_selector, "open image");
        self.send(IpcPacket::open_image(path, channel_selector, grab_focus)?)
            .await
    }

    pub async fn reload_image(&mut self, name: &str, grab_focus: bool) -> Result<(), TevError> {
        self.ensure_open()?;
        debug!(name, "reload image");
        self.send(IpcPacket::reload_image(name, grab_focus)?).await
    }

    pub async fn close_image(&mut self, name: &str) -> Result<(), TevError> {
        self.ensure_open()?;
        debug!(name, "close image");
        self.send(IpcPacket::close_image(name)?).await
    }

    pub async fn create_image(&mut self, image: &CreateImage<'_>) -> Result<(), TevError> {
        self.ensure_open()?;
        debug!(
            name = image.name,
            width = image.width,
            height = image.height,
            channels = image.channel_names.len(),
            "create image"
        );
        self.send(image.packet()?).await
    }

    /// Send a pixel update, one packet per tile in row-major order.
    ///
    /// Returns the number of tiles sent. Fails before sending anything if
    /// there are fewer channel names than channels. A failure part way
    /// through leaves the earlier tiles delivered.
    pub async fn update_image<T: Sample>(
        &mut self,
        update: &ImageUpdate<'_, T>,
    ) -> Result<usize, TevError> {
        self.ensure_open()?;
        let packets = update.packets()?;
        let grid = update.grid();
        debug!(
            name = update.name,
            height = update.image.height(),
            width = update.image.width(),
            channels = update.image.channel_count(),
            tiles = grid.len(),
            "update image"
        );

        let mut sent = 0;
        for packet in packets {
            self.send(packet?).await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Replace (or with `append`, extend) the named image's vector overlay.
    pub async fn update_vector_graphics(
        &mut self,
        name: &str,
        commands: &[VgCommand],
        append: bool,
        grab_focus: bool,
    ) -> Result<(), TevError> {
        self.ensure_open()?;
        debug!(name, commands = commands.len(), append, "update vector graphics");
        self.send(IpcPacket::vector_graphics(name, grab_focus, append, commands)?)
            .await
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ConnectionInfo;

    fn i32_at(bytes: &[u8], at: usize) -> i32 {
        i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn create_image_defaults_to_rgba() {
        let p = CreateImage::new("img", 4, 4).packet().unwrap();
        assert_eq!(p.as_bytes()[5], 1);
        assert!(p.as_bytes().ends_with(b"R\0G\0B\0A\0"));
    }

    #[test]
    fn defaults_are_not_shared_between_builders() {
        let custom = ["X", "Y"];
        let a = CreateImage::new("a", 1, 1).with_channels(&custom);
        let b = CreateImage::new("b", 1, 1);
        assert!(a.packet().unwrap().as_bytes().ends_with(b"X\0Y\0"));
        assert!(b.packet().unwrap().as_bytes().ends_with(b"R\0G\0B\0A\0"));
        assert_eq!(DEFAULT_CHANNEL_NAMES, ["R", "G", "B", "A"]);
    }

    #[test]
    fn update_checks_channel_names_first() {
        let data = [0u8; 2 * 2 * 3];
        let view = ImageView::interleaved(&data, 2, 2, 3).unwrap();
        let update = ImageUpdate::new("img", view).with_channels(&["R", "G"]);
        assert!(matches!(
            update.packets().map(|_| ()),
            Err(TevError::NotEnoughChannelNames {
                needed: 3,
                provided: 2
            })
        ));
    }

    #[test]
    fn single_channel_buffer_uses_first_name() {
        let data = [0.5f32; 6];
        let view = ImageView::single_channel(&data, 2, 3).unwrap();
        let update = ImageUpdate::new("img", view).with_channels(&["Bonus", "Unused"]);
        let packets: Vec<_> = update.packets().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(packets.len(), 1);
        let b = packets[0].as_bytes();
        assert_eq!(i32_at(b, 10), 1);
        assert_eq!(&b[14..20], b"Bonus\0");
    }

    #[test]
    fn tile_origins_are_offset_by_target() {
        let data = vec![0u16; 3 * 5];
        let view = ImageView::single_channel(&data, 3, 5).unwrap();
        let update = ImageUpdate::new("i", view)
            .with_channels(&["L"])
            .at(100, 200)
            .tile_size(TileSize::new(4, 2).unwrap());

        let origins: Vec<(i32, i32, i32, i32)> = update
            .packets()
            .unwrap()
            .map(|p| {
                let p = p.unwrap();
                // grab(1) "i\0"(2) count(4) "L\0"(2) after the 5-byte header
                let b = &p.as_bytes()[14..];
                (i32_at(b, 0), i32_at(b, 4), i32_at(b, 8), i32_at(b, 12))
            })
            .collect();
        assert_eq!(
            origins,
            vec![
                (100, 200, 4, 2),
                (104, 200, 1, 2),
                (100, 202, 4, 1),
                (104, 202, 1, 1)
            ]
        );
    }

    #[test]
    fn coordinates_overflowing_i32_are_rejected() {
        let data = [0f32; 4];
        let view = ImageView::single_channel(&data, 2, 2).unwrap();
        let update = ImageUpdate::new("i", view).at(i32::MAX as i64, 0);
        let results: Vec<_> = update.packets().unwrap().collect();
        assert!(matches!(results[0], Err(TevError::OutOfRange { field: "x", .. })));
    }

    #[test]
    fn empty_buffer_produces_no_packets() {
        let data: [f32; 0] = [];
        let view = ImageView::interleaved(&data, 0, 10, 3).unwrap();
        let update = ImageUpdate::new("i", view);
        assert_eq!(update.packets().unwrap().count(), 0);
    }

    #[tokio::test]
    async fn operations_on_closed_session_fail() {
        let mut session = Session::new(ConnectionInfo::default());
        assert!(session.close_image("a").await.unwrap_err().is_state_error());
        assert!(
            session
                .create_image(&CreateImage::new("a", 1, 1))
                .await
                .unwrap_err()
                .is_state_error()
        );

        let data = [0f32; 3];
        let view = ImageView::interleaved(&data, 1, 1, 3).unwrap();
        // State is checked before channel names.
        let update = ImageUpdate::new("a", view).with_channels(&["R"]);
        assert!(matches!(
            session.update_image(&update).await,
            Err(TevError::NotOpen)
        ));
    }
}
