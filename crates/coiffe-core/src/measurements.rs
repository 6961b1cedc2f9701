//! Pixel-space face measurements.

use crate::error::FaceError;
use crate::landmarks::KeyLandmarks;
use crate::types::{FaceMeasurements, Landmark};

/// Euclidean distance in pixels between two normalized landmarks.
///
/// Each coordinate is denormalized before the distance is taken so that
/// ratios reflect the true aspect of the source image.
pub fn distance(a: &Landmark, b: &Landmark, image_width: f64, image_height: f64) -> f64 {
    let (ax, ay) = a.to_pixels(image_width, image_height);
    let (bx, by) = b.to_pixels(image_width, image_height);
    ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
}

/// Measure face widths and height in pixels and derive the shape ratios.
///
/// The cheekbone line is taken as the widest point of the face, so
/// `face_width` and `cheekbone_width` are the same distance.
pub fn calculate_measurements(
    key: &KeyLandmarks,
    image_width: f64,
    image_height: f64,
) -> Result<FaceMeasurements, FaceError> {
    if !(image_width > 0.0 && image_height > 0.0 && image_width.is_finite() && image_height.is_finite()) {
        return Err(FaceError::InvalidDimensions {
            width: image_width,
            height: image_height,
        });
    }

    let d = |a: &Landmark, b: &Landmark| distance(a, b, image_width, image_height);

    let face_height = positive("face height", d(&key.forehead_top, &key.chin_bottom))?;
    let face_width = positive("face width", d(&key.left_cheekbone, &key.right_cheekbone))?;
    let jaw_width = positive("jaw width", d(&key.left_jaw, &key.right_jaw))?;
    let forehead_width = positive("forehead width", d(&key.left_forehead, &key.right_forehead))?;

    let measurements = FaceMeasurements {
        face_width,
        face_height,
        jaw_width,
        cheekbone_width: face_width,
        forehead_width,
        width_height_ratio: face_width / face_height,
        jaw_cheek_ratio: jaw_width / face_width,
        forehead_jaw_ratio: forehead_width / jaw_width,
        forehead_cheek_ratio: forehead_width / face_width,
    };

    tracing::trace!(
        width_height = measurements.width_height_ratio,
        jaw_cheek = measurements.jaw_cheek_ratio,
        forehead_jaw = measurements.forehead_jaw_ratio,
        forehead_cheek = measurements.forehead_cheek_ratio,
        "face measured"
    );

    Ok(measurements)
}

fn positive(measurement: &'static str, value: f64) -> Result<f64, FaceError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(FaceError::DegenerateFace { measurement, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Anchor points for a face drawn in pixel space, normalized against
    /// the given image size.
    fn key_from_pixels(points: [(f64, f64); 8], width: f64, height: f64) -> KeyLandmarks {
        let n = |(x, y): (f64, f64)| Landmark::new(x / width, y / height);
        let centre = Landmark::new(0.5, 0.5);
        KeyLandmarks {
            forehead_top: n(points[0]),
            chin_bottom: n(points[1]),
            left_cheekbone: n(points[2]),
            right_cheekbone: n(points[3]),
            left_jaw: n(points[4]),
            right_jaw: n(points[5]),
            left_forehead: n(points[6]),
            right_forehead: n(points[7]),
            left_eye_outer: centre,
            right_eye_outer: centre,
            nose_tip: centre,
        }
    }

    const FACE_PX: [(f64, f64); 8] = [
        (320.0, 80.0),
        (320.0, 400.0),
        (200.0, 220.0),
        (440.0, 220.0),
        (230.0, 330.0),
        (410.0, 330.0),
        (215.0, 120.0),
        (425.0, 120.0),
    ];

    fn assert_ratios_close(a: &FaceMeasurements, b: &FaceMeasurements) {
        assert!((a.width_height_ratio - b.width_height_ratio).abs() < 1e-9);
        assert!((a.jaw_cheek_ratio - b.jaw_cheek_ratio).abs() < 1e-9);
        assert!((a.forehead_jaw_ratio - b.forehead_jaw_ratio).abs() < 1e-9);
        assert!((a.forehead_cheek_ratio - b.forehead_cheek_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_distance_denormalizes_each_axis() {
        let a = Landmark::new(0.0, 0.0);
        let b = Landmark::new(0.3, 0.4);
        // (0.3 * 1000, 0.4 * 500) = (300, 200)
        let expected = (300.0f64.powi(2) + 200.0f64.powi(2)).sqrt();
        assert!((distance(&a, &b, 1000.0, 500.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Landmark::new(0.12, 0.87);
        let b = Landmark::new(0.66, 0.31);
        assert_eq!(distance(&a, &b, 1920.0, 1080.0), distance(&b, &a, 1920.0, 1080.0));
    }

    #[test]
    fn test_measurements_in_pixels() {
        let key = key_from_pixels(FACE_PX, 640.0, 480.0);
        let m = calculate_measurements(&key, 640.0, 480.0).unwrap();
        assert!((m.face_height - 320.0).abs() < 1e-9);
        assert!((m.face_width - 240.0).abs() < 1e-9);
        assert_eq!(m.face_width, m.cheekbone_width);
        assert!((m.jaw_width - 180.0).abs() < 1e-9);
        assert!((m.forehead_width - 210.0).abs() < 1e-9);
        assert!((m.width_height_ratio - 0.75).abs() < 1e-9);
        assert!((m.jaw_cheek_ratio - 0.75).abs() < 1e-9);
        assert!((m.forehead_jaw_ratio - 210.0 / 180.0).abs() < 1e-9);
        assert!((m.forehead_cheek_ratio - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_ratios_invariant_under_uniform_rescale() {
        let key = key_from_pixels(FACE_PX, 640.0, 480.0);
        let small = calculate_measurements(&key, 640.0, 480.0).unwrap();
        let large = calculate_measurements(&key, 1280.0, 960.0).unwrap();
        assert_ratios_close(&small, &large);
        assert!((large.face_width - 2.0 * small.face_width).abs() < 1e-9);
    }

    #[test]
    fn test_ratios_agree_across_resolutions() {
        // Same face, scaled 2.25x into a 1920x1080 frame.
        let scaled = FACE_PX.map(|(x, y)| (x * 2.25, y * 2.25));
        let sd = calculate_measurements(&key_from_pixels(FACE_PX, 640.0, 480.0), 640.0, 480.0).unwrap();
        let hd = calculate_measurements(&key_from_pixels(scaled, 1920.0, 1080.0), 1920.0, 1080.0).unwrap();
        assert_ratios_close(&sd, &hd);
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let key = key_from_pixels(FACE_PX, 640.0, 480.0);
        assert!(matches!(
            calculate_measurements(&key, 0.0, 480.0),
            Err(FaceError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            calculate_measurements(&key, 640.0, f64::NAN),
            Err(FaceError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_rejects_collapsed_jaw() {
        let mut px = FACE_PX;
        px[5] = px[4];
        let key = key_from_pixels(px, 640.0, 480.0);
        let err = calculate_measurements(&key, 640.0, 480.0).unwrap_err();
        assert_eq!(err, FaceError::DegenerateFace { measurement: "jaw width", value: 0.0 });
    }
}
