//! # Composition Engine
//!
//! The composition engine coordinates override loading, clip selection,
//! overlay compositing, timeline assembly and rendering.

pub mod engine;

// Re-exports for convenience
pub use engine::{CompositionEngine, Job};
