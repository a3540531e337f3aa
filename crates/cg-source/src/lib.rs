//! Input-side collaborators for contribgif: theme assets and animation decoders.

pub mod image;
pub mod theme;

#[cfg(feature = "video")]
pub mod video;

use std::path::Path;

use cg_core::error::TileError;
use cg_core::traits::FrameSource;

/// Extensions d'images animées reconnues.
pub const ANIMATED_IMAGE_EXTS: &[&str] = &["gif"];

/// Open `path` as a frame source, dispatching on its extension.
///
/// # Errors
/// - [`TileError::InputNotFound`] if the file does not exist.
/// - [`TileError::UnsupportedFormat`] for unknown extensions or unreadable streams.
///
/// # Example
/// ```
/// use cg_core::error::TileError;
/// use cg_source::open_source;
/// use std::path::Path;
/// assert!(matches!(
///     open_source(Path::new("/no/such/file.gif")),
///     Err(TileError::InputNotFound { .. })
/// ));
/// ```
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>, TileError> {
    if !path.exists() {
        return Err(TileError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ANIMATED_IMAGE_EXTS.contains(&ext.as_str()) {
        return Ok(Box::new(crate::image::GifSource::open(path)?));
    }

    #[cfg(feature = "video")]
    if video::VIDEO_EXTS.contains(&ext.as_str()) {
        return Ok(Box::new(video::VideoSource::open(path)?));
    }

    Err(TileError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: supported_formats(),
    })
}

/// Human-readable list of accepted extensions, e.g. `.gif, .mp4`.
#[must_use]
pub fn supported_formats() -> String {
    let mut exts: Vec<&str> = ANIMATED_IMAGE_EXTS.to_vec();
    #[cfg(feature = "video")]
    exts.extend_from_slice(video::VIDEO_EXTS);
    exts.iter()
        .map(|e| format!(".{e}"))
        .collect::<Vec<_>>()
        .join(", ")
}
