use std::sync::atomic::{AtomicBool, Ordering};

use cg_core::error::TileError;
use cg_core::frame::{FrameBuffer, RawFrame};
use cg_core::geometry::GridGeometry;
use cg_core::palette::Palette;
use cg_core::traits::{FrameSource, capacity_hint, next_chunk};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::compositor::render_frame;

/// Log a progress line every this many rendered frames.
const PROGRESS_EVERY: usize = 100;

/// Pool de workers pour le rendu parallèle des frames.
///
/// Each task is tagged with its input index; results are gathered on the
/// calling thread and written back into their original slot, so output
/// order never depends on completion order.
///
/// # Example
/// ```
/// use cg_tiles::scheduler::RenderScheduler;
/// let scheduler = RenderScheduler::new(2).unwrap();
/// let doubled = scheduler.map_ordered(&[1, 2, 3], |_, &x| Ok(x * 2)).unwrap();
/// assert_eq!(doubled, vec![2, 4, 6]);
/// ```
pub struct RenderScheduler {
    pool: ThreadPool,
}

impl RenderScheduler {
    /// Build a pool with `workers` threads. `0` uses the available parallelism.
    ///
    /// # Errors
    /// Returns [`TileError::Config`] if the OS refuses to spawn the threads.
    pub fn new(workers: usize) -> Result<Self, TileError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("cg-render-{i}"))
            .build()
            .map_err(|e| TileError::Config(format!("render pool: {e}")))?;
        log::info!("Pool de rendu : {} workers", pool.current_num_threads());
        Ok(Self { pool })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Render every frame in parallel; output index `i` is the render of input `i`.
    ///
    /// # Errors
    /// Returns [`TileError::FrameRenderFailure`] for the lowest index among
    /// the failures observed. No partial output is returned.
    pub fn render_all(
        &self,
        frames: &[RawFrame],
        palette: &Palette,
        geometry: &GridGeometry,
    ) -> Result<Vec<FrameBuffer>, TileError> {
        self.map_ordered(frames, |_, frame| render_frame(frame, palette, geometry))
    }

    /// Decode and render `source` in chunks of at most `chunk_len` frames.
    ///
    /// Only one chunk of raw frames is alive at a time; composed frames and
    /// durations are appended in source order.
    ///
    /// # Errors
    /// - Decode errors from the source.
    /// - [`TileError::EmptyAnimation`] if the source yields nothing.
    /// - [`TileError::FrameRenderFailure`] with the frame's index in the whole stream.
    pub fn render_source(
        &self,
        source: &mut dyn FrameSource,
        chunk_len: usize,
        palette: &Palette,
        geometry: &GridGeometry,
    ) -> Result<(Vec<FrameBuffer>, Vec<u32>), TileError> {
        let chunk_len = chunk_len.max(1);
        let mut composed = Vec::with_capacity(capacity_hint(source));
        let mut durations = Vec::with_capacity(composed.capacity());

        loop {
            let chunk = next_chunk(source, chunk_len)?;
            if chunk.is_empty() {
                break;
            }
            let offset = composed.len();
            let (frames, chunk_durations): (Vec<RawFrame>, Vec<u32>) = chunk
                .into_iter()
                .map(|t| (t.frame, t.duration_ms))
                .unzip();

            let rendered = self
                .render_all(&frames, palette, geometry)
                .map_err(|e| match e {
                    TileError::FrameRenderFailure { index, reason } => {
                        TileError::FrameRenderFailure {
                            index: index + offset,
                            reason,
                        }
                    }
                    other => other,
                })?;
            drop(frames);

            composed.extend(rendered);
            durations.extend(chunk_durations);
            if composed.len() / PROGRESS_EVERY > offset / PROGRESS_EVERY {
                log::info!("Progress: {} frames rendues", composed.len());
            }
        }

        if composed.is_empty() {
            return Err(TileError::EmptyAnimation);
        }
        log::info!("{} frames rendues", composed.len());
        Ok((composed, durations))
    }

    /// Scatter `f` over `items` on the pool and gather results in input order.
    ///
    /// Once a task fails, tasks that have not started yet are skipped, so a
    /// failure among them is never observed.
    ///
    /// # Errors
    /// Returns [`TileError::FrameRenderFailure`] carrying the lowest index
    /// among the failures observed and that task's error message.
    pub fn map_ordered<T, U, F>(&self, items: &[T], f: F) -> Result<Vec<U>, TileError>
    where
        T: Sync,
        U: Send,
        F: Fn(usize, &T) -> Result<U, TileError> + Sync,
    {
        let total = items.len();
        let mut slots: Vec<Option<U>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut first_error: Option<(usize, TileError)> = None;
        let failed = AtomicBool::new(false);

        let (tx, rx) = flume::unbounded::<(usize, Result<U, TileError>)>();
        let f = &f;
        let failed_ref = &failed;

        self.pool.in_place_scope(|scope| {
            for (index, item) in items.iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    if failed_ref.load(Ordering::Relaxed) {
                        return;
                    }
                    let result = f(index, item);
                    if result.is_err() {
                        failed_ref.store(true, Ordering::Relaxed);
                    }
                    let _ = tx.send((index, result));
                });
            }
            drop(tx);

            // === Gather : réordonnancement par index ===
            for (index, result) in rx.iter() {
                match result {
                    Ok(value) => slots[index] = Some(value),
                    Err(e) => {
                        log::warn!("frame {index}: {e}");
                        if first_error.as_ref().is_none_or(|(i, _)| index < *i) {
                            first_error = Some((index, e));
                        }
                    }
                }
            }
        });

        if let Some((index, e)) = first_error {
            return Err(TileError::FrameRenderFailure {
                index,
                reason: e.to_string(),
            });
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| TileError::FrameRenderFailure {
                    index,
                    reason: "worker produced no result".into(),
                })
            })
            .collect()
    }
}
