//! # Clip Selection
//!
//! Loads start overrides, discovers source clips and cuts each one down to
//! a uniform segment.

pub mod discovery;
pub mod overrides;
pub mod selector;
pub mod types;

pub use discovery::discover_clips;
pub use overrides::StartOverrideMap;
pub use selector::{check_identifier, ClipSelector, SegmentPlan};
pub use types::{identifier_for, Geometry, MediaInfo, Segment, SourceClip};
