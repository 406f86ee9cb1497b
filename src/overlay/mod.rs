//! # Overlay Compositing
//!
//! Text layers (clip number, clip name) and the composites that carry them.

pub mod compositor;
pub mod layer;

pub use compositor::{display_name, ClipKind, CompositeClip, OverlayCompositor, Visual};
pub use layer::{Anchor, Background, BoxSize, OverlayLayer, TextStyle};
