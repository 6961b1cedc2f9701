//! Face-mesh landmark extraction.
//!
//! Maps the 468-point MediaPipe Face Mesh topology onto the eleven anchor
//! points used by every measurement and placement calculation, and converts
//! raw detector output into typed [`Landmark`] values.

use crate::error::FaceError;
use crate::types::Landmark;
use serde::Deserialize;

/// Number of points in a complete face-mesh landmark set.
pub const FACE_MESH_LANDMARKS: usize = 468;

/// Named anchor points on the face mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyLandmark {
    ForeheadTop,
    ChinBottom,
    LeftCheekbone,
    RightCheekbone,
    LeftJaw,
    RightJaw,
    LeftForehead,
    RightForehead,
    LeftEyeOuter,
    RightEyeOuter,
    NoseTip,
}

impl KeyLandmark {
    pub const ALL: [KeyLandmark; 11] = [
        KeyLandmark::ForeheadTop,
        KeyLandmark::ChinBottom,
        KeyLandmark::LeftCheekbone,
        KeyLandmark::RightCheekbone,
        KeyLandmark::LeftJaw,
        KeyLandmark::RightJaw,
        KeyLandmark::LeftForehead,
        KeyLandmark::RightForehead,
        KeyLandmark::LeftEyeOuter,
        KeyLandmark::RightEyeOuter,
        KeyLandmark::NoseTip,
    ];

    /// Index into the 468-point face mesh.
    pub const fn index(self) -> usize {
        match self {
            KeyLandmark::ForeheadTop => 10,
            KeyLandmark::ChinBottom => 152,
            KeyLandmark::LeftCheekbone => 234,
            KeyLandmark::RightCheekbone => 454,
            KeyLandmark::LeftJaw => 172,
            KeyLandmark::RightJaw => 397,
            KeyLandmark::LeftForehead => 54,
            KeyLandmark::RightForehead => 284,
            KeyLandmark::LeftEyeOuter => 33,
            KeyLandmark::RightEyeOuter => 263,
            KeyLandmark::NoseTip => 1,
        }
    }
}

const fn max_key_index() -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < KeyLandmark::ALL.len() {
        let idx = KeyLandmark::ALL[i].index();
        if idx > max {
            max = idx;
        }
        i += 1;
    }
    max
}

// Every anchor must exist in a complete mesh.
const _: () = assert!(max_key_index() < FACE_MESH_LANDMARKS);

/// The eleven anchor points of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyLandmarks {
    pub forehead_top: Landmark,
    pub chin_bottom: Landmark,
    pub left_cheekbone: Landmark,
    pub right_cheekbone: Landmark,
    pub left_jaw: Landmark,
    pub right_jaw: Landmark,
    pub left_forehead: Landmark,
    pub right_forehead: Landmark,
    pub left_eye_outer: Landmark,
    pub right_eye_outer: Landmark,
    pub nose_tip: Landmark,
}

impl KeyLandmarks {
    pub fn get(&self, key: KeyLandmark) -> &Landmark {
        match key {
            KeyLandmark::ForeheadTop => &self.forehead_top,
            KeyLandmark::ChinBottom => &self.chin_bottom,
            KeyLandmark::LeftCheekbone => &self.left_cheekbone,
            KeyLandmark::RightCheekbone => &self.right_cheekbone,
            KeyLandmark::LeftJaw => &self.left_jaw,
            KeyLandmark::RightJaw => &self.right_jaw,
            KeyLandmark::LeftForehead => &self.left_forehead,
            KeyLandmark::RightForehead => &self.right_forehead,
            KeyLandmark::LeftEyeOuter => &self.left_eye_outer,
            KeyLandmark::RightEyeOuter => &self.right_eye_outer,
            KeyLandmark::NoseTip => &self.nose_tip,
        }
    }
}

/// Project a full face-mesh landmark set onto its anchor points.
///
/// Fails with [`FaceError::InvalidLandmarks`] when fewer than 468 points are
/// supplied; no partial result is produced.
pub fn extract_key_landmarks(landmarks: &[Landmark]) -> Result<KeyLandmarks, FaceError> {
    if landmarks.len() < FACE_MESH_LANDMARKS {
        return Err(FaceError::InvalidLandmarks {
            expected: FACE_MESH_LANDMARKS,
            actual: landmarks.len(),
        });
    }

    let at = |key: KeyLandmark| landmarks[key.index()];

    Ok(KeyLandmarks {
        forehead_top: at(KeyLandmark::ForeheadTop),
        chin_bottom: at(KeyLandmark::ChinBottom),
        left_cheekbone: at(KeyLandmark::LeftCheekbone),
        right_cheekbone: at(KeyLandmark::RightCheekbone),
        left_jaw: at(KeyLandmark::LeftJaw),
        right_jaw: at(KeyLandmark::RightJaw),
        left_forehead: at(KeyLandmark::LeftForehead),
        right_forehead: at(KeyLandmark::RightForehead),
        left_eye_outer: at(KeyLandmark::LeftEyeOuter),
        right_eye_outer: at(KeyLandmark::RightEyeOuter),
        nose_tip: at(KeyLandmark::NoseTip),
    })
}

/// A single point as emitted by a detector: `{x, y, z?}` or `[x, y, z?]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Object {
        x: f64,
        y: f64,
        #[serde(default)]
        z: Option<f64>,
    },
    Tuple(Vec<f64>),
}

/// Detector output: either one mesh or a list of meshes (one per face).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMesh {
    Faces(Vec<Vec<RawPoint>>),
    Single(Vec<RawPoint>),
}

/// Convert raw detector JSON into typed landmarks.
///
/// Accepts a flat point array or a per-face array of point arrays, in which
/// case the first face is used. Point count is not checked here; that is the
/// job of [`extract_key_landmarks`].
pub fn landmarks_from_json(json: &str) -> Result<Vec<Landmark>, FaceError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| FaceError::MalformedLandmarks(e.to_string()))?;
    landmarks_from_value(value)
}

/// Convert an already-parsed detector payload into typed landmarks.
pub fn landmarks_from_value(value: serde_json::Value) -> Result<Vec<Landmark>, FaceError> {
    let mesh: RawMesh = serde_json::from_value(value).map_err(|_| {
        FaceError::MalformedLandmarks("expected an array of {x, y, z} points or [x, y, z] tuples".into())
    })?;

    let points = match mesh {
        RawMesh::Single(points) => points,
        RawMesh::Faces(faces) => {
            let face_count = faces.len();
            let first = faces
                .into_iter()
                .next()
                .ok_or_else(|| FaceError::MalformedLandmarks("no face in detector output".into()))?;
            if face_count > 1 {
                tracing::debug!(faces = face_count, "multiple faces in detector output, using the first");
            }
            first
        }
    };

    points
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let landmark = match raw {
                RawPoint::Object { x, y, z } => Landmark { x, y, z },
                RawPoint::Tuple(coords) => match coords.as_slice() {
                    [x, y] => Landmark { x: *x, y: *y, z: None },
                    [x, y, z] => Landmark { x: *x, y: *y, z: Some(*z) },
                    _ => {
                        return Err(FaceError::MalformedLandmarks(format!(
                            "point {i} has {} coordinates, expected 2 or 3",
                            coords.len()
                        )))
                    }
                },
            };
            if !landmark.x.is_finite() || !landmark.y.is_finite() {
                return Err(FaceError::MalformedLandmarks(format!("point {i} is not finite")));
            }
            Ok(landmark)
        })
        .collect()
}
