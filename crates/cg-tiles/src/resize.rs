use cg_core::error::TileError;
use cg_core::frame::{Channels, RawFrame};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};

/// Resizer moyenne-par-zone wrappant fast_image_resize.
///
/// Each output pixel is the coverage-weighted average of the source area it
/// maps to. Whole-number shrink ratios go through fast_image_resize's box
/// convolution, which gives that average directly; other ratios use an exact
/// fractional-coverage pass, so partly covered source pixels count in
/// proportion to their overlap.
///
/// # Example
/// ```
/// use cg_core::frame::RawFrame;
/// use cg_tiles::resize::Resizer;
/// let mut r = Resizer::new();
/// let small = r.resize(&RawFrame::solid_rgb(100, 60, (9, 9, 9)), 10, 6).unwrap();
/// assert_eq!((small.width, small.height), (10, 6));
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
}

impl Resizer {
    /// Create a new area-averaging resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box)),
        }
    }

    /// Resize `src` to `width × height`, keeping its channel layout.
    ///
    /// # Errors
    /// Returns [`TileError::MalformedFrame`] if `src` does not match its
    /// declared dimensions, either size is zero, or the resize backend rejects it.
    pub fn resize(&mut self, src: &RawFrame, width: u32, height: u32) -> Result<RawFrame, TileError> {
        src.validate()?;
        if src.width == width && src.height == height {
            return Ok(src.clone());
        }

        if width == 0 || height == 0 || src.width == 0 || src.height == 0 {
            return Err(backend_error(src, &"zero-sized resize"));
        }

        if src.width % width != 0 || src.height % height != 0 {
            return Ok(area_average(src, width, height));
        }

        let pixel_type = match src.channels {
            Channels::Luma => PixelType::U8,
            Channels::Rgb => PixelType::U8x3,
        };

        // fast_image_resize prend possession du buffer source
        let src_image = Image::from_vec_u8(src.width, src.height, src.data.clone(), pixel_type)
            .map_err(|e| backend_error(src, &e))?;
        let mut dst_image = Image::new(width, height, pixel_type);

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .map_err(|e| backend_error(src, &e))?;

        Ok(RawFrame::new(dst_image.into_vec(), width, height, src.channels))
    }
}

/// Per output index: first covered source index and the normalised overlap
/// weight of each source pixel from there on.
fn coverage(src_len: u32, dst_len: u32) -> Vec<(usize, Vec<f64>)> {
    let scale = f64::from(src_len) / f64::from(dst_len);
    (0..dst_len)
        .map(|o| {
            let start = f64::from(o) * scale;
            let end = start + scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len as usize);
            let weights = (first..last)
                .map(|i| {
                    let lo = start.max(i as f64);
                    let hi = end.min(i as f64 + 1.0);
                    (hi - lo).max(0.0) / scale
                })
                .collect();
            (first, weights)
        })
        .collect()
}

/// Moyenne par zone exacte, séparable : passe horizontale puis verticale.
fn area_average(src: &RawFrame, width: u32, height: u32) -> RawFrame {
    let ch = src.channels.count();
    let (sw, sh) = (src.width as usize, src.height as usize);
    let w = width as usize;
    let cols = coverage(src.width, width);
    let rows = coverage(src.height, height);

    let mut horiz = vec![0f64; w * sh * ch];
    for (y, row) in src.data.chunks_exact(sw * ch).enumerate() {
        for (x, (first, weights)) in cols.iter().enumerate() {
            for c in 0..ch {
                horiz[(y * w + x) * ch + c] = weights
                    .iter()
                    .enumerate()
                    .map(|(k, wt)| wt * f64::from(row[(first + k) * ch + c]))
                    .sum();
            }
        }
    }

    let mut out = vec![0u8; w * height as usize * ch];
    for (y, (first, weights)) in rows.iter().enumerate() {
        for x in 0..w {
            for c in 0..ch {
                let v: f64 = weights
                    .iter()
                    .enumerate()
                    .map(|(k, wt)| wt * horiz[((first + k) * w + x) * ch + c])
                    .sum();
                out[(y * w + x) * ch + c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    RawFrame::new(out, width, height, src.channels)
}

fn backend_error(src: &RawFrame, e: &dyn std::fmt::Display) -> TileError {
    log::error!("resize {}x{} failed: {e}", src.width, src.height);
    TileError::MalformedFrame {
        width: src.width,
        height: src.height,
        channels: src.channels.count(),
        expected: src.expected_len(),
        actual: src.data.len(),
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}
