use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cg_core::color::parse_hex;
use cg_core::error::TileError;
use cg_core::palette::{PIXEL_SIZE, Palette, STEPS, Tile, default_levels};

/// Couleurs GitHub des thèmes intégrés, du palier 0 au palier 4.
pub const BUILTIN_THEMES: &[(&str, [&str; STEPS])] = &[
    ("light", ["#ebedf0", "#9be9a8", "#40c463", "#30a14e", "#216e39"]),
    ("dark", ["#161b22", "#0e4429", "#006d32", "#26a641", "#39d353"]),
];

/// Path of step `index` inside a theme directory.
#[must_use]
pub fn tile_path(themes_dir: &Path, name: &str, index: usize) -> PathBuf {
    themes_dir.join(name).join(format!("{index}.png"))
}

/// Validate and load `themes_dir/name/{0..STEPS}.png` into a [`Palette`].
///
/// Tiles are checked in step order; the first problem is returned.
///
/// # Errors
/// - [`TileError::ThemeNotFound`] if the theme directory is absent.
/// - [`TileError::ThemeAssetMissing`] if a step file is absent.
/// - [`TileError::ThemeAssetWrongDimensions`] if a tile is not `PIXEL_SIZE` square.
/// - [`TileError::Decode`] if a tile exists but is not a readable image.
pub fn load_theme(themes_dir: &Path, name: &str) -> Result<Palette, TileError> {
    let dir = themes_dir.join(name);
    if !dir.is_dir() {
        return Err(TileError::ThemeNotFound {
            theme: name.to_string(),
            dir: themes_dir.to_path_buf(),
        });
    }

    let mut tiles = Vec::with_capacity(STEPS);
    for index in 0..STEPS {
        let path = tile_path(themes_dir, name, index);
        if !path.is_file() {
            return Err(TileError::ThemeAssetMissing {
                theme: name.to_string(),
                index,
                path,
            });
        }

        let img = image::open(&path).map_err(|e| TileError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let (width, height) = (img.width(), img.height());
        if width != PIXEL_SIZE || height != PIXEL_SIZE {
            return Err(TileError::ThemeAssetWrongDimensions {
                theme: name.to_string(),
                index,
                width,
                height,
                expected: PIXEL_SIZE,
            });
        }

        tiles.push(Tile::from_rgb(img.into_rgb8().into_raw(), PIXEL_SIZE)?);
    }

    let palette = Palette::build(name, tiles, default_levels())?;
    log::info!("Thème '{name}' chargé depuis {}", dir.display());
    Ok(palette)
}

/// Write a solid-colour theme as `STEPS` PNG tiles.
///
/// # Errors
/// Returns an error if a colour is not `#rrggbb` or a file cannot be written.
pub fn write_theme(themes_dir: &Path, name: &str, colours: &[&str; STEPS]) -> Result<()> {
    let dir = themes_dir.join(name);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Impossible de créer {}", dir.display()))?;

    for (index, hex) in colours.iter().enumerate() {
        let (r, g, b) =
            parse_hex(hex).with_context(|| format!("Couleur invalide '{hex}' (#rrggbb)"))?;
        let path = tile_path(themes_dir, name, index);
        image::RgbImage::from_pixel(PIXEL_SIZE, PIXEL_SIZE, image::Rgb([r, g, b]))
            .save(&path)
            .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    }
    Ok(())
}

/// Write every entry of [`BUILTIN_THEMES`] under `themes_dir`.
///
/// # Errors
/// Returns an error if any tile cannot be written.
pub fn install_builtin_themes(themes_dir: &Path) -> Result<()> {
    for (name, colours) in BUILTIN_THEMES {
        write_theme(themes_dir, name, colours)?;
        log::info!("Thème intégré '{name}' installé dans {}", themes_dir.display());
    }
    Ok(())
}
