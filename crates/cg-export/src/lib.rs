//! Animation assembly and GIF output for contribgif.

pub mod assembler;
pub mod muxer;
