//! Rule-based face-shape classification.
//!
//! A fixed-priority decision tree over the measurement ratios picks the
//! shape; confidence is then scored by how closely the ratios that define
//! that shape sit to its ideal profile.

use crate::types::{FaceMeasurements, FaceShape};

const BASE_CONFIDENCE: f64 = 50.0;
const MIN_CONFIDENCE: u8 = 50;
const MAX_CONFIDENCE: u8 = 98;
/// Largest penalty applied to a value inside its ideal range, at the edges.
const OFF_CENTER_PENALTY: f64 = 0.2;

/// Which measured ratio a confidence component reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ratio {
    WidthHeight,
    JawCheek,
    ForeheadJaw,
    ForeheadCheek,
}

impl Ratio {
    fn of(self, m: &FaceMeasurements) -> f64 {
        match self {
            Ratio::WidthHeight => m.width_height_ratio,
            Ratio::JawCheek => m.jaw_cheek_ratio,
            Ratio::ForeheadJaw => m.forehead_jaw_ratio,
            Ratio::ForeheadCheek => m.forehead_cheek_ratio,
        }
    }
}

/// Ideal value(s) a ratio is scored against.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Range { min: f64, max: f64 },
    Point { ideal: f64, tolerance: f64 },
}

impl Target {
    fn score(self, value: f64) -> f64 {
        match self {
            Target::Range { min, max } => range_score(value, min, max),
            Target::Point { ideal, tolerance } => point_score(value, ideal, tolerance),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Component {
    ratio: Ratio,
    target: Target,
    weight: f64,
}

const fn range(ratio: Ratio, min: f64, max: f64, weight: f64) -> Component {
    Component { ratio, target: Target::Range { min, max }, weight }
}

const fn point(ratio: Ratio, ideal: f64, tolerance: f64, weight: f64) -> Component {
    Component { ratio, target: Target::Point { ideal, tolerance }, weight }
}

/// Confidence components per shape. Weights of each pair sum to 48.
fn profile(shape: FaceShape) -> [Component; 2] {
    match shape {
        FaceShape::Oval => [
            range(Ratio::WidthHeight, 0.70, 0.75, 24.0),
            range(Ratio::JawCheek, 0.75, 0.85, 24.0),
        ],
        FaceShape::Round => [
            point(Ratio::WidthHeight, 0.95, 0.15, 28.0),
            point(Ratio::JawCheek, 0.95, 0.15, 20.0),
        ],
        FaceShape::Square => [
            point(Ratio::WidthHeight, 0.92, 0.10, 24.0),
            point(Ratio::JawCheek, 0.95, 0.10, 24.0),
        ],
        FaceShape::Heart => [
            range(Ratio::ForeheadJaw, 1.15, 1.45, 24.0),
            range(Ratio::JawCheek, 0.60, 0.75, 24.0),
        ],
        FaceShape::Oblong => [
            range(Ratio::WidthHeight, 0.50, 0.65, 28.0),
            range(Ratio::JawCheek, 0.75, 0.90, 20.0),
        ],
        FaceShape::Diamond => [
            range(Ratio::ForeheadCheek, 0.80, 0.95, 24.0),
            range(Ratio::JawCheek, 0.70, 0.85, 24.0),
        ],
    }
}

/// Goodness of fit of `value` against the interval `[min, max]`, in [0, 1].
///
/// Inside the interval the score falls linearly from 1 at the center to 0.8
/// at either edge. Outside, it falls from 1 to 0 over one interval width.
pub fn range_score(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return point_score(value, min, 1.0);
    }
    if value >= min && value <= max {
        let center = (min + max) / 2.0;
        let half = span / 2.0;
        1.0 - OFF_CENTER_PENALTY * ((value - center).abs() / half)
    } else {
        let outside = if value < min { min - value } else { value - max };
        (1.0 - outside / span).max(0.0)
    }
}

/// Goodness of fit of `value` against a single ideal, falling linearly to 0
/// at `tolerance` away on either side.
pub fn point_score(value: f64, ideal: f64, tolerance: f64) -> f64 {
    (1.0 - (value - ideal).abs() / tolerance).max(0.0)
}

/// Output of [`ShapeClassifier::classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeVerdict {
    pub shape: FaceShape,
    pub confidence: u8,
    pub reasoning: String,
}

/// Decision-tree face-shape classifier.
///
/// Rules are evaluated in a fixed priority order and the first match wins,
/// so later rules never see inputs an earlier rule has claimed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeClassifier;

impl ShapeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify measurements into a shape with confidence and reasoning.
    ///
    /// Never fails: measurements matching no rule fall back to oval.
    pub fn classify(&self, m: &FaceMeasurements) -> ShapeVerdict {
        let (shape, matched) = match Self::decide(m) {
            Some(shape) => (shape, true),
            None => (FaceShape::Oval, false),
        };
        let confidence = Self::confidence(shape, m);
        let reasoning = Self::reasoning(shape, matched, m);

        tracing::debug!(shape = %shape, confidence, matched, "classified face shape");

        ShapeVerdict { shape, confidence, reasoning }
    }

    fn decide(m: &FaceMeasurements) -> Option<FaceShape> {
        let wh = m.width_height_ratio;
        let jc = m.jaw_cheek_ratio;
        let fj = m.forehead_jaw_ratio;
        let fc = m.forehead_cheek_ratio;

        if (0.70..=0.75).contains(&wh) && (0.75..=0.85).contains(&jc) {
            Some(FaceShape::Oval)
        } else if wh > 0.85 && jc > 0.85 {
            Some(FaceShape::Round)
        } else if (0.85..=1.00).contains(&wh) && jc >= 0.90 {
            Some(FaceShape::Square)
        } else if fj >= 1.15 && jc < 0.75 {
            Some(FaceShape::Heart)
        } else if wh < 0.65 {
            Some(FaceShape::Oblong)
        } else if fc < 0.95 && (0.70..=0.85).contains(&jc) {
            Some(FaceShape::Diamond)
        } else {
            None
        }
    }

    fn confidence(shape: FaceShape, m: &FaceMeasurements) -> u8 {
        let total: f64 = profile(shape)
            .iter()
            .map(|c| c.target.score(c.ratio.of(m)) * c.weight)
            .sum();
        let raw = BASE_CONFIDENCE + total;
        if !raw.is_finite() {
            return MIN_CONFIDENCE;
        }
        (raw.round() as u8).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    fn reasoning(shape: FaceShape, matched: bool, m: &FaceMeasurements) -> String {
        let wh = m.width_height_ratio;
        let jc = m.jaw_cheek_ratio;
        let fj = m.forehead_jaw_ratio;
        let fc = m.forehead_cheek_ratio;

        if !matched {
            return format!(
                "No distinctive profile stands out (width-to-height ratio of {wh:.2}, \
                 jaw-to-cheekbone ratio of {jc:.2}, forehead-to-jaw ratio of {fj:.2}); \
                 balanced proportions are treated as oval."
            );
        }

        match shape {
            FaceShape::Oval => format!(
                "Your face is slightly longer than it is wide, with a width-to-height ratio of {wh:.2}, \
                 and a jawline gently narrower than the cheekbones (jaw-to-cheekbone ratio of {jc:.2})."
            ),
            FaceShape::Round => format!(
                "Your face is nearly as wide as it is long, with a width-to-height ratio of {wh:.2}, \
                 and a full jawline close to cheekbone width (jaw-to-cheekbone ratio of {jc:.2})."
            ),
            FaceShape::Square => format!(
                "Your face has balanced length and width, with a width-to-height ratio of {wh:.2}, \
                 and a strong jaw almost as wide as the cheekbones (jaw-to-cheekbone ratio of {jc:.2})."
            ),
            FaceShape::Heart => format!(
                "Your forehead is noticeably wider than your jaw (forehead-to-jaw ratio of {fj:.2}), \
                 tapering to a narrower chin (jaw-to-cheekbone ratio of {jc:.2})."
            ),
            FaceShape::Oblong => format!(
                "Your face is considerably longer than it is wide, with a width-to-height ratio of {wh:.2}."
            ),
            FaceShape::Diamond => format!(
                "Your cheekbones are the widest part of your face, wider than the forehead \
                 (forehead-to-cheekbone ratio of {fc:.2}) and the jaw (jaw-to-cheekbone ratio of {jc:.2})."
            ),
        }
    }
}
