//! # Timeline Assembly
//!
//! Orders numbered transitions and content composites into the final program.

pub mod assembler;

pub use assembler::{Timeline, TimelineAssembler};
