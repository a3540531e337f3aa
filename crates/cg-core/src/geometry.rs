use crate::error::TileError;
use crate::palette::PIXEL_SIZE;

/// Colonnes de la grille (une année de contributions).
pub const COLUMNS: u32 = 53;

/// Transparent gap between neighbouring tiles, in pixels.
pub const PIXEL_SPACING: u32 = 8;

/// Grid and canvas dimensions derived from the source aspect ratio.
///
/// # Example
/// ```
/// use cg_core::geometry::{GridGeometry, COLUMNS};
/// let g = GridGeometry::compute(1920, 1080, COLUMNS).unwrap();
/// assert_eq!(g.rows, 30);
/// assert_eq!(g.canvas_width, 11 * 53 + 8 * 52);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// Grid rows.
    pub rows: u32,
    /// Grid columns.
    pub columns: u32,
    /// Output width in pixels.
    pub canvas_width: u32,
    /// Output height in pixels.
    pub canvas_height: u32,
}

impl GridGeometry {
    /// Derive the grid for a `source_width × source_height` source.
    ///
    /// `rows = round(columns × height / width)` with ties rounded to even,
    /// so `2.5 → 2` and `7.5 → 8`.
    ///
    /// # Errors
    /// Returns [`TileError::DegenerateGeometry`] when `columns` is zero or the
    /// row count is zero or not finite.
    pub fn compute(
        source_width: u32,
        source_height: u32,
        columns: u32,
    ) -> Result<Self, TileError> {
        let degenerate = |reason: String| TileError::DegenerateGeometry {
            width: source_width,
            height: source_height,
            reason,
        };

        if columns == 0 {
            return Err(degenerate("grid needs at least one column".into()));
        }

        let rows_f = f64::from(columns) * f64::from(source_height) / f64::from(source_width);
        if !rows_f.is_finite() {
            return Err(degenerate(format!("row count {rows_f} is not finite")));
        }
        let rows = rows_f.round_ties_even();
        if rows < 1.0 {
            return Err(degenerate(format!("row count rounds to {rows}")));
        }
        if rows > f64::from(u32::MAX / (PIXEL_SIZE + PIXEL_SPACING)) {
            return Err(degenerate(format!("row count {rows} is too large")));
        }
        let rows = rows as u32;

        Ok(Self {
            rows,
            columns,
            canvas_width: span(columns),
            canvas_height: span(rows),
        })
    }

    /// Top-left pixel of cell `(row, col)` on the canvas.
    ///
    /// # Example
    /// ```
    /// use cg_core::geometry::{GridGeometry, COLUMNS};
    /// let g = GridGeometry::compute(53, 30, COLUMNS).unwrap();
    /// assert_eq!(g.tile_origin(0, 0), (0, 0));
    /// assert_eq!(g.tile_origin(2, 1), (19, 38));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn tile_origin(&self, row: u32, col: u32) -> (u32, u32) {
        let pitch = PIXEL_SIZE + PIXEL_SPACING;
        (col * pitch, row * pitch)
    }

    /// Number of grid cells.
    #[must_use]
    pub fn cells(&self) -> usize {
        self.rows as usize * self.columns as usize
    }
}

/// Pixel extent of `n` tiles separated by `n - 1` gaps.
fn span(n: u32) -> u32 {
    PIXEL_SIZE * n + PIXEL_SPACING * (n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_hd_gives_thirty_rows() {
        let g = GridGeometry::compute(1920, 1080, COLUMNS).unwrap();
        assert_eq!(g.rows, 30);
        assert_eq!(g.columns, 53);
        assert_eq!(g.canvas_width, 999);
        assert_eq!(g.canvas_height, 11 * 30 + 8 * 29);
    }

    #[test]
    fn rounding_ties_go_to_even() {
        // 53 * 5 / 106 = 2.5
        assert_eq!(GridGeometry::compute(106, 5, COLUMNS).unwrap().rows, 2);
        // 53 * 15 / 106 = 7.5
        assert_eq!(GridGeometry::compute(106, 15, COLUMNS).unwrap().rows, 8);
        // 53 * 7 / 106 = 3.5
        assert_eq!(GridGeometry::compute(106, 7, COLUMNS).unwrap().rows, 4);
    }

    #[test]
    fn matching_aspect_is_identity() {
        let g = GridGeometry::compute(53, 30, COLUMNS).unwrap();
        assert_eq!(g.rows, 30);
        assert_eq!(g.cells(), 53 * 30);
    }

    #[test]
    fn single_row_has_no_vertical_gap() {
        let g = GridGeometry::compute(53, 1, COLUMNS).unwrap();
        assert_eq!(g.rows, 1);
        assert_eq!(g.canvas_height, PIXEL_SIZE);
    }

    #[test]
    fn very_wide_source_is_degenerate() {
        assert!(matches!(
            GridGeometry::compute(10_000, 10, COLUMNS),
            Err(TileError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn zero_dimensions_are_degenerate() {
        assert!(GridGeometry::compute(0, 1080, COLUMNS).is_err());
        assert!(GridGeometry::compute(1920, 0, COLUMNS).is_err());
        assert!(GridGeometry::compute(0, 0, COLUMNS).is_err());
        assert!(GridGeometry::compute(1920, 1080, 0).is_err());
    }

    #[test]
    fn tiles_never_overlap() {
        let g = GridGeometry::compute(1920, 1080, COLUMNS).unwrap();
        let (x0, _) = g.tile_origin(0, 0);
        let (x1, _) = g.tile_origin(0, 1);
        assert_eq!(x1 - x0, PIXEL_SIZE + PIXEL_SPACING);
        let (xl, yl) = g.tile_origin(g.rows - 1, g.columns - 1);
        assert_eq!(xl + PIXEL_SIZE, g.canvas_width);
        assert_eq!(yl + PIXEL_SIZE, g.canvas_height);
    }
}
