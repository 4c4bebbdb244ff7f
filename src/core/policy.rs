//! Severity override applied to every assessment before it is displayed or
//! stored.
//!
//! A classification below [`REVIEW_THRESHOLD`] percent confidence is treated
//! as HIGH and flagged for doctor review, whatever the classifier said. The
//! classifier's own label stays on `classifier_severity`. The review flag is
//! only ever raised.

use tracing::warn;

use crate::models::{AssessmentResult, Severity};

pub const REVIEW_THRESHOLD: u8 = 85;

pub fn apply(mut result: AssessmentResult) -> AssessmentResult {
    if result.confidence < REVIEW_THRESHOLD {
        if result.severity != Severity::High {
            warn!(
                assessment_id = %result.id,
                confidence = result.confidence,
                reported = %result.classifier_severity,
                "low-confidence assessment forced to HIGH"
            );
        }
        result.severity = Severity::High;
        result.flag_for_review();
    }
    result
}
