use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaceError {
    #[error("invalid landmarks: expected at least {expected} points, got {actual}")]
    InvalidLandmarks { expected: usize, actual: usize },
    #[error("malformed landmark data: {0}")]
    MalformedLandmarks(String),
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
    #[error("degenerate face: {measurement} is {value}")]
    DegenerateFace { measurement: &'static str, value: f64 },
    #[error("validation service: {0}")]
    Validation(String),
}
