use std::borrow::Cow;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use cg_core::error::TileError;
use gif::{DisposalMethod, Encoder, Frame, Repeat};

use crate::assembler::Animation;

/// Palette index reserved for transparent pixels.
pub const TRANSPARENT_INDEX: u8 = 0;

/// Slots left in a 256-entry table once the transparent index is taken.
const MAX_OPAQUE_COLORS: usize = 255;

/// NeuQuant speed for the per-frame fallback (1 = best, 30 = fastest).
const QUANTIZE_SPEED: i32 = 10;

/// Table de couleurs globale : index 0 transparent, puis ordre de première apparition.
struct ColorTable {
    flat: Vec<u8>,
    index: HashMap<[u8; 3], u8>,
}

impl ColorTable {
    /// `None` when the animation carries more opaque colours than a GIF table holds.
    fn from_animation(anim: &Animation) -> Option<Self> {
        let mut flat = vec![0u8, 0, 0];
        let mut index = HashMap::new();
        for frame in anim.frames() {
            for px in frame.buffer.data.chunks_exact(4) {
                if px[3] == 0 {
                    continue;
                }
                let rgb = [px[0], px[1], px[2]];
                if index.contains_key(&rgb) {
                    continue;
                }
                if index.len() == MAX_OPAQUE_COLORS {
                    return None;
                }
                index.insert(rgb, (index.len() + 1) as u8);
                flat.extend_from_slice(&rgb);
            }
        }
        Some(Self { flat, index })
    }

    fn indices(&self, rgba: &[u8]) -> Vec<u8> {
        rgba.chunks_exact(4)
            .map(|px| {
                if px[3] == 0 {
                    TRANSPARENT_INDEX
                } else {
                    self.index
                        .get(&[px[0], px[1], px[2]])
                        .copied()
                        .unwrap_or(TRANSPARENT_INDEX)
                }
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

/// Milliseconds to GIF centiseconds, rounded half up.
fn delay_cs(ms: u32) -> u16 {
    let cs = (u64::from(ms) + 5) / 10;
    u16::try_from(cs).unwrap_or(u16::MAX)
}

/// Swap palette slots so the frame's transparent colour sits at [`TRANSPARENT_INDEX`].
///
/// The quantizer picks its own transparent slot; every frame of the output
/// keys transparency on index 0.
fn move_transparent_to_zero(frame: &mut Frame<'_>) {
    let Some(t) = frame.transparent else {
        return;
    };
    if t == TRANSPARENT_INDEX {
        return;
    }
    let zero = TRANSPARENT_INDEX;
    if let Some(palette) = frame.palette.as_mut() {
        let (a, b) = (usize::from(zero) * 3, usize::from(t) * 3);
        if b + 3 <= palette.len() {
            for c in 0..3 {
                palette.swap(a + c, b + c);
            }
        }
    }
    for px in frame.buffer.to_mut().iter_mut() {
        if *px == t {
            *px = zero;
        } else if *px == zero {
            *px = t;
        }
    }
    frame.transparent = Some(zero);
}

fn encode_error(e: impl std::fmt::Display) -> TileError {
    TileError::EncodeFailure {
        reason: e.to_string(),
    }
}

fn dimension(value: u32, axis: &str) -> Result<u16, TileError> {
    u16::try_from(value).map_err(|_| TileError::EncodeFailure {
        reason: format!("canvas {axis} {value} exceeds the GIF limit of {}", u16::MAX),
    })
}

/// Encode an animation as a looping GIF into `writer` and hand the writer back.
///
/// Transparent pixels map to [`TRANSPARENT_INDEX`]; every frame uses
/// background disposal so gaps never show the previous frame.
///
/// # Errors
/// Returns [`TileError::EncodeFailure`] if the canvas does not fit GIF
/// dimensions or the writer fails.
///
/// # Example
/// ```
/// use cg_core::frame::FrameBuffer;
/// use cg_export::assembler::assemble;
/// use cg_export::muxer::encode_gif;
/// let anim = assemble(vec![FrameBuffer::new(8, 8)], vec![100]).unwrap();
/// let bytes = encode_gif(Vec::new(), &anim).unwrap();
/// assert!(bytes.starts_with(b"GIF89a"));
/// ```
pub fn encode_gif<W: Write>(writer: W, anim: &Animation) -> Result<W, TileError> {
    let width = dimension(anim.width(), "width")?;
    let height = dimension(anim.height(), "height")?;

    let table = ColorTable::from_animation(anim);
    match &table {
        Some(t) => log::debug!("GIF : table globale de {} couleurs opaques", t.len()),
        None => log::warn!(
            "more than {MAX_OPAQUE_COLORS} colours across frames, quantizing each frame"
        ),
    }
    let global: &[u8] = table.as_ref().map_or(&[], |t| t.flat.as_slice());

    let mut encoder = Encoder::new(writer, width, height, global).map_err(encode_error)?;
    encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;

    for frame in anim.frames() {
        let mut out = match &table {
            Some(t) => Frame {
                width,
                height,
                buffer: Cow::Owned(t.indices(&frame.buffer.data)),
                transparent: Some(TRANSPARENT_INDEX),
                ..Frame::default()
            },
            None => {
                let mut rgba = frame.buffer.data.clone();
                let mut quantized =
                    Frame::from_rgba_speed(width, height, &mut rgba, QUANTIZE_SPEED);
                move_transparent_to_zero(&mut quantized);
                quantized
            }
        };
        out.delay = delay_cs(frame.duration_ms);
        out.dispose = DisposalMethod::Background;
        encoder.write_frame(&out).map_err(encode_error)?;
    }

    encoder.into_inner().map_err(encode_error)
}

/// `<path>.part`, the sibling file written before the final rename.
#[must_use]
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Write the GIF to `path` atomically: encode into `<path>.part`, then rename.
///
/// On failure the partial file is removed and `path` is left untouched.
///
/// # Errors
/// Returns [`TileError::EncodeFailure`] on encoding or I/O errors.
pub fn write_gif(path: &Path, anim: &Animation) -> Result<(), TileError> {
    let part = part_path(path);
    let result = File::create(&part)
        .map_err(encode_error)
        .and_then(|file| encode_gif(BufWriter::new(file), anim))
        .and_then(|mut w| w.flush().map_err(encode_error))
        .and_then(|()| std::fs::rename(&part, path).map_err(encode_error));

    match &result {
        Ok(()) => log::info!(
            "GIF écrit : {} ({} frames, {} ms)",
            path.display(),
            anim.frames().len(),
            anim.total_duration_ms()
        ),
        Err(e) => {
            log::error!("{}: {e}", path.display());
            let _ = std::fs::remove_file(&part);
        }
    }
    result
}
