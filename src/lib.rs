//! # Power Hour
//!
//! Assemble a power hour compilation: every source clip gets exactly one
//! minute of program time, made of a numbered transition followed by a
//! trimmed segment of the clip, with the clip number and name overlaid.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use power_hour::{
//!     composition::{CompositionEngine, Job},
//!     config::Config,
//!     media::FfmpegEngine,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let engine = CompositionEngine::new(config.clone(), FfmpegEngine::new(&config.tools));
//!
//! let job = Job {
//!     source_dir: "source_video".into(),
//!     overrides: Some("power_hour.cfg".into()),
//!     transition: "transition.avi".into(),
//!     output: "out.avi".into(),
//! };
//! engine.compose(&job).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`clips`] - Start overrides, clip discovery and segment selection
//! - [`overlay`] - Index/name overlays and composite clips
//! - [`timeline`] - Ordering composites into the final program
//! - [`media`] - The media engine abstraction and its ffmpeg implementation
//! - [`composition`] - Main composition engine
//! - [`config`] - Configuration management
//!
//! ## Custom Media Engines
//!
//! Rendering is delegated through the [`MediaEngine`](media::MediaEngine)
//! trait. An engine that can safely reuse one decoded transition across
//! composites reports it through `supports_shared_reuse`; otherwise the
//! transition is probed again for every composite.

pub mod clips;
pub mod composition;
pub mod config;
pub mod error;
pub mod media;
pub mod overlay;
pub mod timeline;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{CompositionEngine, Job},
    config::Config,
    error::{PowerHourError, Result},
    media::{FfmpegEngine, MediaEngine},
    timeline::Timeline,
};
