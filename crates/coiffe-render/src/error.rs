use coiffe_core::FaceError;
use thiserror::Error;

const SOURCE_LABEL_LEN: usize = 48;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to load image {source_label}: {reason}")]
    ImageLoad { source_label: String, reason: String },
    #[error("canvas unavailable: {0}")]
    CanvasUnavailable(String),
    #[error("render failed: {reason}")]
    Render { reason: String, recoverable: bool },
    #[error("landmarks: {0}")]
    Face(#[from] FaceError),
}

impl RenderError {
    pub(crate) fn image_load(src: &str, reason: impl Into<String>) -> Self {
        RenderError::ImageLoad {
            source_label: source_label(src),
            reason: reason.into(),
        }
    }

    /// Whether re-invoking the render (possibly with a different source) may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RenderError::ImageLoad { .. } => true,
            RenderError::Render { recoverable, .. } => *recoverable,
            RenderError::CanvasUnavailable(_) | RenderError::Face(_) => false,
        }
    }
}

/// Short display form of an image source; embedded data URIs are truncated.
pub fn source_label(src: &str) -> String {
    if src.chars().count() <= SOURCE_LABEL_LEN {
        return src.to_string();
    }
    let head: String = src.chars().take(SOURCE_LABEL_LEN).collect();
    format!("{head}…")
}
