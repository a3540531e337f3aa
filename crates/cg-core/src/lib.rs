//! Types, palette lookup, geometry, and configuration shared by the contribgif workspace.
//!
//! This crate holds no codecs; decoding and encoding live in `cg-source`
//! and `cg-export`.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod palette;
pub mod traits;

pub use config::TileConfig;
pub use error::TileError;
pub use frame::{Channels, FrameBuffer, RawFrame, TimedFrame};
pub use geometry::GridGeometry;
pub use palette::{Palette, Tile};
pub use traits::FrameSource;
