use cg_core::error::TileError;
use cg_core::frame::{FrameBuffer, RawFrame};
use cg_core::geometry::GridGeometry;
use cg_core::palette::Palette;

use crate::luminance::luminance_grid;
use crate::resize::Resizer;

/// Place one palette tile per grid cell on a fresh transparent canvas.
///
/// `luma` is row-major with `geometry.columns` entries per row. Gaps between
/// tiles stay fully transparent.
///
/// # Panics
/// Debug builds assert that `luma` holds exactly `geometry.cells()` values.
#[must_use]
pub fn compose(luma: &[u8], palette: &Palette, geometry: &GridGeometry) -> FrameBuffer {
    debug_assert_eq!(luma.len(), geometry.cells());
    let mut canvas = FrameBuffer::new(geometry.canvas_width, geometry.canvas_height);
    let columns = geometry.columns as usize;

    for (i, row) in luma.chunks_exact(columns).enumerate() {
        for (j, &value) in row.iter().enumerate() {
            let tile = palette.lookup(value);
            let (left, top) = geometry.tile_origin(i as u32, j as u32);
            canvas.blit_rgb(tile.rgb(), tile.size(), left, top);
        }
    }
    canvas
}

/// Render one source frame into a composed tile frame.
///
/// Pure: the same frame, palette and geometry always give byte-identical output.
///
/// # Errors
/// Returns [`TileError::MalformedFrame`] if the frame buffer does not match
/// its declared dimensions.
///
/// # Example
/// ```
/// use cg_core::frame::RawFrame;
/// use cg_core::geometry::{GridGeometry, COLUMNS};
/// use cg_core::palette::{default_levels, Palette, Tile, PIXEL_SIZE};
/// use cg_tiles::compositor::render_frame;
///
/// let tiles = (0..5u8).map(|i| Tile::solid(PIXEL_SIZE, (i, i, i))).collect();
/// let palette = Palette::build("grey", tiles, default_levels()).unwrap();
/// let geometry = GridGeometry::compute(53, 30, COLUMNS).unwrap();
/// let out = render_frame(&RawFrame::solid_luma(53, 30, 255), &palette, &geometry).unwrap();
/// assert_eq!(out.pixel(0, 0), (4, 4, 4, 255));
/// assert_eq!(out.pixel(11, 0).3, 0);
/// ```
pub fn render_frame(
    frame: &RawFrame,
    palette: &Palette,
    geometry: &GridGeometry,
) -> Result<FrameBuffer, TileError> {
    // Resizer à usage unique : il garde des buffers internes et n'est pas Sync.
    let mut resizer = Resizer::new();
    let luma = luminance_grid(frame, geometry, &mut resizer)?;
    Ok(compose(&luma, palette, geometry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_core::frame::Channels;
    use cg_core::geometry::{COLUMNS, PIXEL_SPACING};
    use cg_core::palette::{PIXEL_SIZE, STEPS, Tile, default_levels};

    fn palette() -> Palette {
        let tiles = (0..STEPS)
            .map(|i| Tile::solid(PIXEL_SIZE, (10 * i as u8 + 1, 0, 0)))
            .collect();
        Palette::build("test", tiles, default_levels()).unwrap()
    }

    #[test]
    fn black_frame_uses_step_zero_everywhere() {
        let geometry = GridGeometry::compute(53, 30, COLUMNS).unwrap();
        let out = render_frame(&RawFrame::solid_rgb(53, 30, (0, 0, 0)), &palette(), &geometry)
            .unwrap();
        assert_eq!((out.width, out.height), (geometry.canvas_width, geometry.canvas_height));
        for row in 0..geometry.rows {
            for col in 0..geometry.columns {
                let (x, y) = geometry.tile_origin(row, col);
                assert_eq!(out.pixel(x, y), (1, 0, 0, 255));
                assert_eq!(out.pixel(x + PIXEL_SIZE - 1, y + PIXEL_SIZE - 1), (1, 0, 0, 255));
            }
        }
    }

    #[test]
    fn gaps_stay_transparent() {
        let geometry = GridGeometry::compute(53, 30, COLUMNS).unwrap();
        let out = render_frame(&RawFrame::solid_luma(53, 30, 128), &palette(), &geometry)
            .unwrap();
        for dx in 0..PIXEL_SPACING {
            assert_eq!(out.pixel(PIXEL_SIZE + dx, 0).3, 0);
            assert_eq!(out.pixel(0, PIXEL_SIZE + dx).3, 0);
        }
        let opaque = out.data.chunks_exact(4).filter(|p| p[3] == 255).count();
        assert_eq!(opaque, geometry.cells() * (PIXEL_SIZE * PIXEL_SIZE) as usize);
    }

    #[test]
    fn each_cell_follows_its_own_luminance() {
        let geometry = GridGeometry::compute(53, 30, COLUMNS).unwrap();
        let mut data = vec![0u8; 53 * 30];
        data[0] = 255;
        data[53 * 29 + 52] = 130;
        let out = render_frame(
            &RawFrame::new(data, 53, 30, Channels::Luma),
            &palette(),
            &geometry,
        )
        .unwrap();
        assert_eq!(out.pixel(0, 0), (41, 0, 0, 255));
        let (x, y) = geometry.tile_origin(29, 52);
        assert_eq!(out.pixel(x, y), (21, 0, 0, 255));
        let (x, y) = geometry.tile_origin(0, 1);
        assert_eq!(out.pixel(x, y), (1, 0, 0, 255));
    }

    #[test]
    fn rendering_is_deterministic() {
        let geometry = GridGeometry::compute(320, 180, COLUMNS).unwrap();
        let data: Vec<u8> = (0..320 * 180 * 3).map(|i| (i * 7 % 251) as u8).collect();
        let frame = RawFrame::new(data, 320, 180, Channels::Rgb);
        let a = render_frame(&frame, &palette(), &geometry).unwrap();
        let b = render_frame(&frame.clone(), &palette(), &geometry).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_frame_is_an_error() {
        let geometry = GridGeometry::compute(53, 30, COLUMNS).unwrap();
        let frame = RawFrame::new(vec![0; 10], 53, 30, Channels::Rgb);
        assert!(matches!(
            render_frame(&frame, &palette(), &geometry),
            Err(TileError::MalformedFrame { .. })
        ));
    }
}
