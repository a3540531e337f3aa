use cg_core::error::TileError;
use cg_core::frame::FrameBuffer;

/// One composed frame and how long it stays on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Composed RGBA canvas.
    pub buffer: FrameBuffer,
    /// Display duration in milliseconds.
    pub duration_ms: u32,
}

/// Ordered, validated frames ready for encoding.
///
/// All frames share the same canvas size and there is at least one of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Animation {
    width: u32,
    height: u32,
    frames: Vec<AnimationFrame>,
}

impl Animation {
    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames in display order.
    #[must_use]
    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    /// Total running time of one loop, in milliseconds.
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.duration_ms)).sum()
    }
}

/// Pair composed frames with their durations, index by index.
///
/// # Errors
/// - [`TileError::EmptyAnimation`] if `frames` is empty.
/// - [`TileError::DurationMismatch`] if the counts differ.
/// - [`TileError::EncodeFailure`] if a frame's canvas size differs from the first one.
///
/// # Example
/// ```
/// use cg_core::frame::FrameBuffer;
/// use cg_export::assembler::assemble;
/// let anim = assemble(vec![FrameBuffer::new(4, 4); 2], vec![100, 250]).unwrap();
/// assert_eq!(anim.total_duration_ms(), 350);
/// ```
pub fn assemble(frames: Vec<FrameBuffer>, durations: Vec<u32>) -> Result<Animation, TileError> {
    if frames.is_empty() {
        return Err(TileError::EmptyAnimation);
    }
    if frames.len() != durations.len() {
        return Err(TileError::DurationMismatch {
            frames: frames.len(),
            durations: durations.len(),
        });
    }

    let (width, height) = (frames[0].width, frames[0].height);
    if let Some((i, f)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.width != width || f.height != height)
    {
        return Err(TileError::EncodeFailure {
            reason: format!(
                "frame {i} is {}x{}, expected {width}x{height}",
                f.width, f.height
            ),
        });
    }

    let frames: Vec<AnimationFrame> = frames
        .into_iter()
        .zip(durations)
        .map(|(buffer, duration_ms)| AnimationFrame {
            buffer,
            duration_ms,
        })
        .collect();

    log::info!("Animation : {} frames, {width}x{height}", frames.len());
    Ok(Animation {
        width,
        height,
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_follow_their_frames() {
        let mut a = FrameBuffer::new(2, 2);
        a.data[3] = 255;
        let b = FrameBuffer::new(2, 2);
        let anim = assemble(vec![a.clone(), b.clone()], vec![40, 1000]).unwrap();
        assert_eq!(anim.frames()[0].buffer, a);
        assert_eq!(anim.frames()[0].duration_ms, 40);
        assert_eq!(anim.frames()[1].buffer, b);
        assert_eq!(anim.frames()[1].duration_ms, 1000);
        assert_eq!((anim.width(), anim.height()), (2, 2));
    }

    #[test]
    fn zero_frames_is_fatal() {
        assert!(matches!(
            assemble(Vec::new(), Vec::new()),
            Err(TileError::EmptyAnimation)
        ));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        assert!(matches!(
            assemble(vec![FrameBuffer::new(1, 1)], vec![10, 20]),
            Err(TileError::DurationMismatch {
                frames: 1,
                durations: 2
            })
        ));
    }

    #[test]
    fn mixed_canvas_sizes_are_rejected() {
        let frames = vec![FrameBuffer::new(3, 3), FrameBuffer::new(3, 4)];
        assert!(matches!(
            assemble(frames, vec![10, 10]),
            Err(TileError::EncodeFailure { .. })
        ));
    }
}
