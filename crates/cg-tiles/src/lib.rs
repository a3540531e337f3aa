//! Tile rendering engine for contribgif.
//!
//! Downsamples source frames to the contribution grid, maps each cell to a
//! palette tile, and renders whole animations on a worker pool.

pub mod compositor;
pub mod luminance;
pub mod resize;
pub mod scheduler;
