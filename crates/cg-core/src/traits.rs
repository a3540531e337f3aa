use crate::error::TileError;
use crate::frame::TimedFrame;

/// Fournit les frames décodées d'une animation source, dans l'ordre.
///
/// Implémenté par : `GifSource`, `VideoSource`, and in-memory sources in tests.
/// The pipeline never branches on the concrete format. Decoding runs on the
/// calling thread, so implementors need not be `Send`.
///
/// # Example
/// ```
/// use cg_core::error::TileError;
/// use cg_core::frame::{RawFrame, TimedFrame};
/// use cg_core::traits::FrameSource;
///
/// struct OneFrame(Option<TimedFrame>);
/// impl FrameSource for OneFrame {
///     fn native_size(&self) -> (u32, u32) { (4, 2) }
///     fn next_frame(&mut self) -> Result<Option<TimedFrame>, TileError> { Ok(self.0.take()) }
/// }
///
/// let mut src = OneFrame(Some(TimedFrame { frame: RawFrame::solid_luma(4, 2, 0), duration_ms: 40 }));
/// assert_eq!(src.aspect_ratio(), 2.0);
/// assert!(src.next_frame().unwrap().is_some());
/// assert!(src.next_frame().unwrap().is_none());
/// ```
pub trait FrameSource {
    /// Dimensions natives de la source.
    fn native_size(&self) -> (u32, u32);

    /// Width over height.
    fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.native_size();
        f64::from(w) / f64::from(h)
    }

    /// Frame count if known ahead of decoding.
    fn frame_count_hint(&self) -> Option<usize> {
        None
    }

    /// Next frame, or `None` once the source is exhausted.
    ///
    /// # Errors
    /// Returns [`TileError::Decode`] if the underlying stream is corrupt.
    fn next_frame(&mut self) -> Result<Option<TimedFrame>, TileError>;
}

/// Upper bound on frames preallocated from [`FrameSource::frame_count_hint`].
///
/// Hints come from container metadata and can be arbitrarily wrong.
pub const MAX_PREALLOC_FRAMES: usize = 10_000;

/// Preallocation size for a source: its hint, capped.
#[must_use]
pub fn capacity_hint(source: &dyn FrameSource) -> usize {
    source
        .frame_count_hint()
        .unwrap_or(0)
        .min(MAX_PREALLOC_FRAMES)
}

/// Pull up to `max` frames; an empty result means the source is exhausted.
///
/// # Errors
/// Propagates decode errors from the source.
pub fn next_chunk(source: &mut dyn FrameSource, max: usize) -> Result<Vec<TimedFrame>, TileError> {
    let mut chunk = Vec::with_capacity(max.min(MAX_PREALLOC_FRAMES));
    while chunk.len() < max {
        match source.next_frame()? {
            Some(frame) => chunk.push(frame),
            None => break,
        }
    }
    Ok(chunk)
}

/// Drain a source into ordered `(frame, duration)` pairs.
///
/// # Errors
/// Propagates decode errors, and returns [`TileError::EmptyAnimation`] if the
/// source yields nothing.
pub fn collect_frames(source: &mut dyn FrameSource) -> Result<Vec<TimedFrame>, TileError> {
    let mut frames = Vec::with_capacity(capacity_hint(source));
    while let Some(frame) = source.next_frame()? {
        frames.push(frame);
    }
    if frames.is_empty() {
        return Err(TileError::EmptyAnimation);
    }
    Ok(frames)
}
