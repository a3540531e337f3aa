use crate::error::TileError;

/// Pixel layout of a decoded source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    /// Single luminance channel.
    Luma,
    /// Interleaved RGB, 3 bytes per pixel.
    Rgb,
}

impl Channels {
    /// Bytes per pixel.
    #[inline(always)]
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::Luma => 1,
            Self::Rgb => 3,
        }
    }
}

/// One decoded source frame, row-major, no padding.
///
/// # Example
/// ```
/// use cg_core::frame::{Channels, RawFrame};
/// let frame = RawFrame::solid_rgb(4, 2, (10, 20, 30));
/// assert_eq!(frame.data.len(), 4 * 2 * 3);
/// assert!(frame.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Pixel bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Layout of `data`.
    pub channels: Channels,
}

impl RawFrame {
    /// Wrap an existing buffer.
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: Channels) -> Self {
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Uniform RGB frame.
    #[must_use]
    pub fn solid_rgb(width: u32, height: u32, rgb: (u8, u8, u8)) -> Self {
        let data = [rgb.0, rgb.1, rgb.2].repeat(width as usize * height as usize);
        Self::new(data, width, height, Channels::Rgb)
    }

    /// Uniform single-channel frame.
    #[must_use]
    pub fn solid_luma(width: u32, height: u32, value: u8) -> Self {
        Self::new(
            vec![value; width as usize * height as usize],
            width,
            height,
            Channels::Luma,
        )
    }

    /// Byte length implied by the declared dimensions.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels.count()
    }

    /// Check that dimensions are non-zero and match the buffer length.
    ///
    /// # Errors
    /// Returns [`TileError::MalformedFrame`] on any mismatch.
    pub fn validate(&self) -> Result<(), TileError> {
        let expected = self.expected_len();
        if self.width == 0 || self.height == 0 || self.data.len() != expected {
            return Err(TileError::MalformedFrame {
                width: self.width,
                height: self.height,
                channels: self.channels.count(),
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// A raw frame paired with its display duration in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedFrame {
    /// Pixels.
    pub frame: RawFrame,
    /// Display time, milliseconds.
    pub duration_ms: u32,
}

/// Canvas RGBA d'une frame composée. Fond transparent par défaut.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel.
///
/// # Example
/// ```
/// use cg_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// assert_eq!(fb.pixel(3, 3), (0, 0, 0, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer entièrement transparent aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Copy an opaque RGB square of edge `size` with its top-left at `(left, top)`.
    ///
    /// Pixels falling outside the canvas are clipped.
    pub fn blit_rgb(&mut self, rgb: &[u8], size: u32, left: u32, top: u32) {
        let stride = self.width as usize * 4;
        let right = (left + size).min(self.width);
        let bottom = (top + size).min(self.height);
        for y in top..bottom {
            let src_row = (y - top) as usize * size as usize * 3;
            let dst_row = y as usize * stride;
            for x in left..right {
                let s = src_row + (x - left) as usize * 3;
                let d = dst_row + x as usize * 4;
                self.data[d..d + 3].copy_from_slice(&rgb[s..s + 3]);
                self.data[d + 3] = 255;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_short_buffer() {
        let mut frame = RawFrame::solid_rgb(4, 4, (1, 2, 3));
        frame.data.pop();
        assert!(matches!(
            frame.validate(),
            Err(TileError::MalformedFrame {
                expected: 48,
                actual: 47,
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_zero_dimensions() {
        let frame = RawFrame::new(Vec::new(), 0, 5, Channels::Luma);
        assert!(frame.validate().is_err());
    }

    #[test]
    fn blit_writes_opaque_square_only() {
        let mut fb = FrameBuffer::new(5, 5);
        let tile = [9u8, 8, 7].repeat(4);
        fb.blit_rgb(&tile, 2, 1, 2);
        assert_eq!(fb.pixel(1, 2), (9, 8, 7, 255));
        assert_eq!(fb.pixel(2, 3), (9, 8, 7, 255));
        assert_eq!(fb.pixel(0, 2), (0, 0, 0, 0));
        assert_eq!(fb.pixel(3, 2), (0, 0, 0, 0));
        assert_eq!(fb.pixel(1, 4), (0, 0, 0, 0));
    }

    #[test]
    fn blit_clips_at_edges() {
        let mut fb = FrameBuffer::new(3, 3);
        let tile = [1u8, 1, 1].repeat(4);
        fb.blit_rgb(&tile, 2, 2, 2);
        assert_eq!(fb.pixel(2, 2), (1, 1, 1, 255));
    }
}
