use cg_core::color::luma;
use cg_core::error::TileError;
use cg_core::frame::{Channels, RawFrame};
use cg_core::geometry::GridGeometry;

use crate::resize::Resizer;

/// Downsample a frame to the grid, then reduce it to one luminance byte per cell.
///
/// Resizing happens before the colour conversion, so RGB sources are
/// area-averaged per channel and converted with BT.601 weights afterwards.
/// The result is row-major, `geometry.rows × geometry.columns`.
///
/// # Errors
/// Returns [`TileError::MalformedFrame`] if the frame is inconsistent.
///
/// # Example
/// ```
/// use cg_core::frame::RawFrame;
/// use cg_core::geometry::{GridGeometry, COLUMNS};
/// use cg_tiles::luminance::luminance_grid;
/// use cg_tiles::resize::Resizer;
///
/// let geometry = GridGeometry::compute(106, 60, COLUMNS).unwrap();
/// let frame = RawFrame::solid_rgb(106, 60, (255, 255, 255));
/// let grid = luminance_grid(&frame, &geometry, &mut Resizer::new()).unwrap();
/// assert_eq!(grid.len(), 53 * 30);
/// assert!(grid.iter().all(|&v| v == 255));
/// ```
pub fn luminance_grid(
    frame: &RawFrame,
    geometry: &GridGeometry,
    resizer: &mut Resizer,
) -> Result<Vec<u8>, TileError> {
    let small = resizer.resize(frame, geometry.columns, geometry.rows)?;
    Ok(match small.channels {
        Channels::Luma => small.data,
        Channels::Rgb => small
            .data
            .chunks_exact(3)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect(),
    })
}
