//! Hairstyle template placement relative to face landmarks.

use crate::error::FaceError;
use crate::landmarks::{extract_key_landmarks, KeyLandmarks};
use crate::types::{Landmark, OverlayPosition};

/// Template width as a multiple of cheekbone width, covering hair beyond the skull.
const OVERSCAN: f64 = 1.3;
/// Fraction of the overlay height placed above the forehead so the template's
/// crown lands on the head.
const CROWN_OFFSET: f64 = 0.35;

/// Compute where a hairstyle template goes on a canvas for the given face.
///
/// `template_aspect_ratio` is the template image's height divided by its
/// width, so the overlay keeps the template's proportions at any face size.
pub fn calculate_overlay_position(
    landmarks: &[Landmark],
    canvas_width: f64,
    canvas_height: f64,
    template_aspect_ratio: f64,
) -> Result<OverlayPosition, FaceError> {
    let key = extract_key_landmarks(landmarks)?;
    Ok(position_for_key_landmarks(&key, canvas_width, canvas_height, template_aspect_ratio))
}

/// Placement for already-extracted anchor points.
pub fn position_for_key_landmarks(
    key: &KeyLandmarks,
    canvas_width: f64,
    canvas_height: f64,
    template_aspect_ratio: f64,
) -> OverlayPosition {
    let (left_x, _) = key.left_cheekbone.to_pixels(canvas_width, canvas_height);
    let (right_x, _) = key.right_cheekbone.to_pixels(canvas_width, canvas_height);

    let face_width = (right_x - left_x).abs();
    let width = face_width * OVERSCAN;
    let height = width * template_aspect_ratio;

    let center_x = (left_x + right_x) / 2.0;
    let (_, forehead_y) = key.forehead_top.to_pixels(canvas_width, canvas_height);
    let top_y = forehead_y - CROWN_OFFSET * height;

    let (lex, ley) = key.left_eye_outer.to_pixels(canvas_width, canvas_height);
    let (rex, rey) = key.right_eye_outer.to_pixels(canvas_width, canvas_height);
    let rotation = (rey - ley).atan2(rex - lex);

    let position = OverlayPosition {
        x: center_x - width / 2.0,
        y: top_y,
        width,
        height,
        rotation,
    };

    tracing::trace!(
        x = position.x,
        y = position.y,
        width = position.width,
        height = position.height,
        rotation = position.rotation,
        "overlay positioned"
    );

    position
}
