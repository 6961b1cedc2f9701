//! coiffe-core — Face-shape analysis and hairstyle placement.
//!
//! Turns a 468-point face mesh into a face-shape classification with a
//! confidence score and explanation, and into the overlay transform used to
//! composite a hairstyle template onto the source photo.

pub mod classifier;
pub mod error;
pub mod landmarks;
pub mod measurements;
pub mod overlay;
pub mod types;
pub mod validation;

pub use classifier::{ShapeClassifier, ShapeVerdict};
pub use error::FaceError;
pub use landmarks::{
    extract_key_landmarks, landmarks_from_json, KeyLandmark, KeyLandmarks, FACE_MESH_LANDMARKS,
};
pub use measurements::{calculate_measurements, distance};
pub use overlay::calculate_overlay_position;
pub use types::{FaceClassification, FaceMeasurements, FaceShape, Landmark, OverlayPosition};
pub use validation::{ClassificationValidator, NoValidation, Verdict};

/// Classify the face shape of a full landmark set from an image of the given size.
pub fn analyze_face(
    landmarks: &[Landmark],
    image_width: f64,
    image_height: f64,
) -> Result<FaceClassification, FaceError> {
    let key = extract_key_landmarks(landmarks)?;
    let measurements = calculate_measurements(&key, image_width, image_height)?;
    let verdict = ShapeClassifier::new().classify(&measurements);

    Ok(FaceClassification {
        shape: verdict.shape,
        confidence: verdict.confidence,
        reasoning: verdict.reasoning,
        measurements,
    })
}

/// Classify locally, then hand the result to `validator` for confirmation.
///
/// Validator failures propagate; the caller decides whether to fall back to
/// [`analyze_face`].
pub fn analyze_face_validated<V: ClassificationValidator>(
    landmarks: &[Landmark],
    image_width: f64,
    image_height: f64,
    validator: &V,
) -> Result<FaceClassification, FaceError> {
    let local = analyze_face(landmarks, image_width, image_height)?;

    match validator.validate(&local, landmarks.len())? {
        Verdict::Confirmed => Ok(local),
        Verdict::Override(replacement) => {
            tracing::info!(
                local = %local.shape,
                validated = %replacement.shape,
                confidence = replacement.confidence,
                "classification overridden by validator"
            );
            Ok(replacement)
        }
    }
}
