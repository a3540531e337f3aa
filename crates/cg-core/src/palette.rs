use std::sync::Arc;

use crate::error::TileError;

/// Nombre de paliers d'un thème.
pub const STEPS: usize = 5;

/// Edge length of a theme tile, in pixels.
pub const PIXEL_SIZE: u32 = 11;

/// Representative luminance of step `i`: `min(i * 64, 255)`.
///
/// # Example
/// ```
/// use cg_core::palette::default_levels;
/// assert_eq!(default_levels(), [0, 64, 128, 192, 255]);
/// ```
#[must_use]
pub fn default_levels() -> [u8; STEPS] {
    let mut levels = [0u8; STEPS];
    for (i, level) in levels.iter_mut().enumerate() {
        *level = (i * 64).min(255) as u8;
    }
    levels
}

/// One square theme tile, RGB row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    rgb: Vec<u8>,
    size: u32,
}

impl Tile {
    /// Wrap RGB pixels of a `size × size` square.
    ///
    /// # Errors
    /// Returns [`TileError::InvalidPalette`] if the buffer length is not `size² × 3`.
    pub fn from_rgb(rgb: Vec<u8>, size: u32) -> Result<Self, TileError> {
        let expected = size as usize * size as usize * 3;
        if rgb.len() != expected {
            return Err(TileError::InvalidPalette {
                reason: format!(
                    "tile buffer has {} bytes, expected {expected}",
                    rgb.len()
                ),
            });
        }
        Ok(Self { rgb, size })
    }

    /// Uniform tile of the given colour.
    #[must_use]
    pub fn solid(size: u32, rgb: (u8, u8, u8)) -> Self {
        Self {
            rgb: [rgb.0, rgb.1, rgb.2].repeat(size as usize * size as usize),
            size,
        }
    }

    /// RGB bytes.
    #[must_use]
    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    /// Edge length.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Thème : `STEPS` tuiles et leurs niveaux de luminance, plus une LUT 256 entrées.
///
/// The LUT is filled once at construction. Every later lookup is a plain
/// indexed read, so a `Palette` can be shared across render workers as-is.
///
/// # Example
/// ```
/// use cg_core::palette::{default_levels, Palette, Tile, PIXEL_SIZE};
/// let tiles = (0..5u8).map(|i| Tile::solid(PIXEL_SIZE, (i, i, i))).collect();
/// let palette = Palette::build("grey", tiles, default_levels()).unwrap();
/// assert_eq!(palette.lookup_index(0), 0);
/// assert_eq!(palette.lookup_index(255), 4);
/// ```
#[derive(Debug)]
pub struct Palette {
    name: String,
    tiles: Vec<Arc<Tile>>,
    levels: [u8; STEPS],
    lut: [u8; 256],
}

impl Palette {
    /// Build a palette and precompute its lookup table.
    ///
    /// # Errors
    /// Returns [`TileError::InvalidPalette`] if there are not exactly `STEPS`
    /// tiles, a tile is not `PIXEL_SIZE` wide, or levels decrease.
    pub fn build(name: &str, tiles: Vec<Tile>, levels: [u8; STEPS]) -> Result<Self, TileError> {
        if tiles.len() != STEPS {
            return Err(TileError::InvalidPalette {
                reason: format!("expected {STEPS} tiles, got {}", tiles.len()),
            });
        }
        if let Some((i, tile)) = tiles
            .iter()
            .enumerate()
            .find(|(_, t)| t.size() != PIXEL_SIZE)
        {
            return Err(TileError::InvalidPalette {
                reason: format!(
                    "tile {i} is {0}×{0}, expected {PIXEL_SIZE}×{PIXEL_SIZE}",
                    tile.size()
                ),
            });
        }
        if levels.windows(2).any(|w| w[1] < w[0]) {
            return Err(TileError::InvalidPalette {
                reason: format!("levels must be non-decreasing: {levels:?}"),
            });
        }

        Ok(Self {
            name: name.to_string(),
            tiles: tiles.into_iter().map(Arc::new).collect(),
            levels,
            lut: build_lut(&levels),
        })
    }

    /// Theme name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step levels.
    #[must_use]
    pub fn levels(&self) -> &[u8; STEPS] {
        &self.levels
    }

    /// All tiles, darkest step first.
    #[must_use]
    pub fn tiles(&self) -> &[Arc<Tile>] {
        &self.tiles
    }

    /// Step index for a luminance byte.
    #[inline(always)]
    #[must_use]
    pub fn lookup_index(&self, value: u8) -> usize {
        usize::from(self.lut[usize::from(value)])
    }

    /// Tile for a luminance byte.
    #[inline(always)]
    #[must_use]
    pub fn lookup(&self, value: u8) -> &Arc<Tile> {
        &self.tiles[self.lookup_index(value)]
    }

    /// Like [`Palette::lookup`], clamping out-of-range input to `[0, 255]` first.
    ///
    /// # Example
    /// ```
    /// use cg_core::palette::{default_levels, Palette, Tile, PIXEL_SIZE};
    /// let tiles = (0..5u8).map(|i| Tile::solid(PIXEL_SIZE, (i, i, i))).collect();
    /// let palette = Palette::build("grey", tiles, default_levels()).unwrap();
    /// assert!(std::sync::Arc::ptr_eq(palette.lookup_clamped(-40), palette.lookup(0)));
    /// assert!(std::sync::Arc::ptr_eq(palette.lookup_clamped(999), palette.lookup(255)));
    /// ```
    #[must_use]
    pub fn lookup_clamped(&self, value: i32) -> &Arc<Tile> {
        self.lookup(value.clamp(0, 255) as u8)
    }
}

/// Nearest-level search for every byte value.
///
/// Strict `<` keeps the first (lowest step) level on equal distance.
fn build_lut(levels: &[u8; STEPS]) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let mut best = 0usize;
        let mut best_distance = u32::MAX;
        for (i, &level) in levels.iter().enumerate() {
            let distance = (value as i32 - i32::from(level)).unsigned_abs();
            if distance < best_distance {
                best_distance = distance;
                best = i;
            }
        }
        *slot = best as u8;
    }
    lut
}
