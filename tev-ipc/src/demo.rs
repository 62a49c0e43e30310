//! Demo driver: builds a striped test image in the viewer and draws an
//! overlay on top of it.

use tev_ipc_core::vg::{self, Winding};
use tev_ipc_core::{CreateImage, ImageUpdate, ImageView, Session, TevError, TileSize, VgCommand};
use tracing::info;

/// Name of the image the demo creates.
pub const IMAGE_NAME: &str = "Test Image";

pub const WIDTH: usize = 200;
pub const HEIGHT: usize = 300;

/// Interleaved RGB pattern plus a single-channel sum of the three.
#[derive(Debug, Clone)]
pub struct TestPattern {
    pub rgb: Vec<f32>,
    pub bonus: Vec<f32>,
}

impl TestPattern {
    /// White image with a red-free horizontal band, a green-free vertical
    /// band and a blue-free square.
    pub fn new() -> Self {
        let mut rgb = vec![1.0f32; HEIGHT * WIDTH * 3];
        let mut zero = |rows: std::ops::Range<usize>, cols: std::ops::Range<usize>, ch: usize| {
            for row in rows {
                for col in cols.clone() {
                    rgb[(row * WIDTH + col) * 3 + ch] = 0.0;
                }
            }
        };
        zero(40..61, 0..WIDTH, 0);
        zero(0..HEIGHT, 40..61, 1);
        zero(50..71, 50..71, 2);

        let bonus = rgb.chunks_exact(3).map(|px| px.iter().sum()).collect();
        Self { rgb, bonus }
    }

    pub fn rgb_view(&self) -> Result<ImageView<'_, f32>, TevError> {
        ImageView::interleaved(&self.rgb, HEIGHT, WIDTH, 3)
    }

    pub fn bonus_view(&self) -> Result<ImageView<'_, f32>, TevError> {
        ImageView::single_channel(&self.bonus, HEIGHT, WIDTH)
    }
}

impl Default for TestPattern {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlay outlining the blue-free square and marking the band crossing.
pub fn overlay() -> Vec<VgCommand> {
    vec![
        vg::save(),
        vg::begin_path(),
        vg::rect(50.0, 50.0, 21.0, 21.0),
        vg::stroke_color(1.0, 0.0, 1.0, 1.0),
        vg::stroke(),
        vg::begin_path(),
        vg::circle(50.5, 50.5, 15.0),
        vg::path_winding(Winding::CounterClockwise),
        vg::fill_color(0.0, 0.0, 0.0, 0.25),
        vg::fill(),
        vg::restore(),
    ]
}

/// Create the test image, push its pixels and draw the overlay.
pub async fn run(tev: &mut Session, tile_size: Option<TileSize>) -> Result<(), TevError> {
    let pattern = TestPattern::new();

    let create = CreateImage::new(IMAGE_NAME, WIDTH as i32, HEIGHT as i32)
        .with_channels(&["R", "G", "B", "Bonus"]);
    tev.create_image(&create).await?;

    let mut rgb = ImageUpdate::new(IMAGE_NAME, pattern.rgb_view()?).with_channels(&["R", "G", "B"]);
    let mut bonus = ImageUpdate::new(IMAGE_NAME, pattern.bonus_view()?).with_channels(&["Bonus"]);
    match tile_size {
        Some(size) => {
            rgb = rgb.tile_size(size);
            bonus = bonus.tile_size(size);
        }
        None => {
            rgb = rgb.without_tiling();
            bonus = bonus.without_tiling();
        }
    }

    let tiles = tev.update_image(&rgb).await? + tev.update_image(&bonus).await?;
    tev.update_vector_graphics(IMAGE_NAME, &overlay(), false, false)
        .await?;

    info!(image = IMAGE_NAME, tiles, "demo image sent");
    Ok(())
}
