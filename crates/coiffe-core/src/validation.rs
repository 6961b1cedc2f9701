//! Seam for an external service that may confirm or override a classification.

use crate::error::FaceError;
use crate::types::FaceClassification;

/// Answer from a classification validator.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Confirmed,
    Override(FaceClassification),
}

/// Second opinion on a locally computed classification.
///
/// Implementations receive the classification and the number of raw
/// landmarks it was computed from, and may return a replacement of the
/// same shape. Rate limiting and retries belong to the implementation.
pub trait ClassificationValidator {
    fn validate(
        &self,
        classification: &FaceClassification,
        landmark_count: usize,
    ) -> Result<Verdict, FaceError>;
}

/// Validator that confirms every classification.
pub struct NoValidation;

impl ClassificationValidator for NoValidation {
    fn validate(&self, _: &FaceClassification, _: usize) -> Result<Verdict, FaceError> {
        Ok(Verdict::Confirmed)
    }
}
