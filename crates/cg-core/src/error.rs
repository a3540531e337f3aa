use std::path::PathBuf;

use thiserror::Error;

/// Errors shared by every stage of the tile pipeline.
///
/// Validation variants (input, theme, geometry) are raised before any frame
/// is rendered. Render and encode variants abort the whole run.
#[derive(Error, Debug)]
pub enum TileError {
    /// Source file does not exist.
    #[error("video '{}' could not be found", path.display())]
    InputNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Source exists but cannot be handled.
    #[error("video '{}' is not of a supported format ({format})", path.display())]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
        /// Extension or decoder diagnostic.
        format: String,
    },

    /// Source decoding failed after the source was opened.
    #[error("failed to decode '{}': {reason}", path.display())]
    Decode {
        /// Source path.
        path: PathBuf,
        /// Decoder diagnostic.
        reason: String,
    },

    /// Theme directory does not exist.
    #[error("theme '{theme}' could not be found in {}", dir.display())]
    ThemeNotFound {
        /// Theme name.
        theme: String,
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// One of the step tiles is missing from the theme directory.
    #[error("image '{index}.png' could not be found in theme '{theme}'")]
    ThemeAssetMissing {
        /// Theme name.
        theme: String,
        /// Step index of the missing tile.
        index: usize,
        /// Expected path.
        path: PathBuf,
    },

    /// A step tile is not `PIXEL_SIZE × PIXEL_SIZE`.
    #[error(
        "image '{index}.png' in theme '{theme}' has incorrect dimensions ({width}, {height}), image should have dimensions ({expected}, {expected})"
    )]
    ThemeAssetWrongDimensions {
        /// Theme name.
        theme: String,
        /// Step index of the tile.
        index: usize,
        /// Actual width.
        width: u32,
        /// Actual height.
        height: u32,
        /// Required edge length.
        expected: u32,
    },

    /// Palette construction received inconsistent tiles or levels.
    #[error("invalid palette: {reason}")]
    InvalidPalette {
        /// What was wrong.
        reason: String,
    },

    /// Aspect ratio yields zero or non-finite rows.
    #[error("degenerate geometry for {width}×{height} source: {reason}")]
    DegenerateGeometry {
        /// Source width.
        width: u32,
        /// Source height.
        height: u32,
        /// Diagnostic.
        reason: String,
    },

    /// Raw frame buffer does not match its declared dimensions.
    #[error("malformed frame {width}×{height}×{channels}: expected {expected} bytes, got {actual}")]
    MalformedFrame {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Declared channel count.
        channels: usize,
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// A frame failed to render inside the scheduler.
    #[error("frame {index} failed to render: {reason}")]
    FrameRenderFailure {
        /// Original sequence index of the frame.
        index: usize,
        /// Underlying renderer diagnostic.
        reason: String,
    },

    /// The assembler received no frames.
    #[error("animation has no frames")]
    EmptyAnimation,

    /// Frame and duration counts differ.
    #[error("animation has {frames} frames but {durations} durations")]
    DurationMismatch {
        /// Number of frames.
        frames: usize,
        /// Number of durations.
        durations: usize,
    },

    /// Output container could not be written.
    #[error("failed to encode output: {reason}")]
    EncodeFailure {
        /// Encoder diagnostic.
        reason: String,
    },

    /// Invalid configuration value or structure.
    #[error("invalid configuration: {0}")]
    Config(String),
}
