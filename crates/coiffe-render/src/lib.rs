//! coiffe-render — Hairstyle preview rendering.
//!
//! Loads the user's photo and a hairstyle template through a memoizing
//! image cache, then composites them on a DPI-aware canvas with the template
//! placed, scaled and rotated to fit the detected face.

pub mod cache;
pub mod canvas;
pub mod error;
pub mod fetch;
pub mod pipeline;

pub use cache::{CachedImage, ImageCache};
pub use canvas::{Canvas, Context2d, Transform, MAX_CANVAS_DIMENSION};
pub use error::RenderError;
pub use fetch::{ImageFetcher, SourceFetcher};
pub use pipeline::{canvas_handle, export_png, CanvasHandle, RenderOutcome, RenderPipeline};
