use serde::{Deserialize, Serialize};
use std::fmt;

/// One normalized face-mesh point. `x` and `y` are fractions of the source
/// image width and height; `z` is detector depth and is carried but unused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Map to pixel coordinates for an image of the given size.
    pub fn to_pixels(&self, width: f64, height: f64) -> (f64, f64) {
        (self.x * width, self.y * height)
    }
}

/// Face shape categories produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceShape {
    Oval,
    Round,
    Square,
    Heart,
    Oblong,
    Diamond,
}

impl FaceShape {
    pub const ALL: [FaceShape; 6] = [
        FaceShape::Oval,
        FaceShape::Round,
        FaceShape::Square,
        FaceShape::Heart,
        FaceShape::Oblong,
        FaceShape::Diamond,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oval => "oval",
            Self::Round => "round",
            Self::Square => "square",
            Self::Heart => "heart",
            Self::Oblong => "oblong",
            Self::Diamond => "diamond",
        }
    }
}

impl fmt::Display for FaceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel-space face dimensions and the ratios the classifier works from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMeasurements {
    pub face_width: f64,
    pub face_height: f64,
    pub jaw_width: f64,
    pub cheekbone_width: f64,
    pub forehead_width: f64,
    pub width_height_ratio: f64,
    pub jaw_cheek_ratio: f64,
    pub forehead_jaw_ratio: f64,
    pub forehead_cheek_ratio: f64,
}

/// Result of a face-shape analysis. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceClassification {
    pub shape: FaceShape,
    /// Integer score in [50, 98].
    pub confidence: u8,
    pub reasoning: String,
    pub measurements: FaceMeasurements,
}

/// Placement of a hairstyle template in destination canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPosition {
    /// Top-left corner.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Radians; positive for a face tilted clockwise.
    pub rotation: f64,
}

impl OverlayPosition {
    /// Pivot point for rotation: the overlay's own center.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
