use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use cg_core::error::TileError;
use cg_core::frame::{Channels, RawFrame, TimedFrame};
use cg_core::traits::FrameSource;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, Frames, ImageDecoder};

/// Source GIF animé. Chaque frame est composée sur le canvas complet puis aplatie en RGB.
///
/// # Example
/// ```no_run
/// use cg_source::image::GifSource;
/// use std::path::Path;
/// let source = GifSource::open(Path::new("input.gif")).unwrap();
/// ```
pub struct GifSource {
    path: PathBuf,
    width: u32,
    height: u32,
    frames: Frames<'static>,
}

impl GifSource {
    /// Open a GIF and read its logical screen size.
    ///
    /// # Errors
    /// Returns [`TileError::Decode`] if the file cannot be read and
    /// [`TileError::UnsupportedFormat`] if it is not a GIF.
    pub fn open(path: &Path) -> Result<Self, TileError> {
        let file = File::open(path).map_err(|e| TileError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let decoder =
            GifDecoder::new(BufReader::new(file)).map_err(|e| TileError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: format!("gif: {e}"),
            })?;
        let (width, height) = decoder.dimensions();
        log::info!("GIF {width}x{height} — {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            frames: decoder.into_frames(),
        })
    }
}

/// GIF delays are rational milliseconds; round to the nearest whole one.
fn delay_ms(numer: u32, denom: u32) -> u32 {
    if denom == 0 {
        return 0;
    }
    ((u64::from(numer) + u64::from(denom) / 2) / u64::from(denom)) as u32
}

impl FrameSource for GifSource {
    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<TimedFrame>, TileError> {
        let Some(frame) = self.frames.next() else {
            return Ok(None);
        };
        let frame = frame.map_err(|e| TileError::Decode {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let (numer, denom) = frame.delay().numer_denom_ms();
        let rgb = DynamicImage::ImageRgba8(frame.into_buffer()).into_rgb8();
        let (width, height) = rgb.dimensions();

        Ok(Some(TimedFrame {
            frame: RawFrame::new(rgb.into_raw(), width, height, Channels::Rgb),
            duration_ms: delay_ms(numer, denom),
        }))
    }
}
