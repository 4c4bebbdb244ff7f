use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patient::{PatientInfo, SymptomInput, VitalsInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Case-insensitive match on the classifier's label. Anything
    /// unrecognized, including a missing label, reads as `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        })
    }
}

/// Body of `POST /triage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub symptoms: Vec<String>,
    pub vitals: BTreeMap<String, f64>,
    #[serde(rename = "age_years", skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
}

/// Classifier response as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassifierResponse {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub force_high_priority: bool,
    #[serde(default)]
    pub safety_disclaimer: Option<String>,
}

// Absorbs binary representation error, e.g. 0.29 * 100.0 == 28.999999999999996.
const SCALE_EPSILON: f64 = 1e-9;

/// Scale a 0-1 fraction to a whole percentage. Truncates before clamping so
/// a fraction just under the review threshold never rounds up past it.
pub fn confidence_percent(fraction: f64) -> u8 {
    if fraction.is_nan() {
        return 0;
    }
    (fraction * 100.0 + SCALE_EPSILON).trunc().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub id: String,
    /// Severity to display and act on.
    pub severity: Severity,
    /// Severity exactly as the classifier reported it.
    pub classifier_severity: Severity,
    pub confidence: u8,
    pub recommended_actions: Vec<String>,
    pub disclaimers: Vec<String>,
    flagged_for_review: bool,
    pub created_at: DateTime<Utc>,
}

impl AssessmentResult {
    pub fn from_response(response: ClassifierResponse) -> Self {
        let severity = Severity::from_label(&response.severity);
        Self {
            id: new_assessment_id(),
            severity,
            classifier_severity: severity,
            confidence: confidence_percent(response.confidence),
            recommended_actions: response.recommendations,
            disclaimers: response.safety_disclaimer.into_iter().collect(),
            flagged_for_review: response.force_high_priority,
            created_at: Utc::now(),
        }
    }

    pub fn flagged_for_review(&self) -> bool {
        self.flagged_for_review
    }

    /// Raise the review flag. There is no way to lower it.
    pub fn flag_for_review(&mut self) {
        self.flagged_for_review = true;
    }
}

/// Time-ordered identifier, so ids sort by creation.
fn new_assessment_id() -> String {
    format!("tri_{}", Uuid::now_v7().simple())
}

/// A completed intake with its severity-annotated assessment, ready for
/// hospital matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageCase {
    pub patient: PatientInfo,
    pub symptoms: SymptomInput,
    pub vitals: VitalsInput,
    pub assessment: AssessmentResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("critical", Severity::Critical)]
    #[test_case("HIGH", Severity::High)]
    #[test_case(" Medium ", Severity::Medium)]
    #[test_case("low", Severity::Low)]
    #[test_case("urgent", Severity::Medium; "unknown label")]
    #[test_case("", Severity::Medium; "missing label")]
    fn severity_labels(label: &str, expected: Severity) {
        assert_eq!(Severity::from_label(label), expected);
    }

    #[test_case(-0.5, 0)]
    #[test_case(0.0, 0)]
    #[test_case(0.29, 29)]
    #[test_case(0.4, 40)]
    #[test_case(0.849, 84)]
    #[test_case(0.85, 85)]
    #[test_case(0.92, 92)]
    #[test_case(1.0, 100)]
    #[test_case(1.7, 100)]
    #[test_case(f64::NAN, 0)]
    fn confidence_scaling(fraction: f64, expected: u8) {
        assert_eq!(confidence_percent(fraction), expected);
    }

    #[test]
    fn confidence_scaling_is_monotonic() {
        let mut last = 0;
        for step in -20..=120 {
            let pct = confidence_percent(step as f64 / 100.0);
            assert!(pct >= last);
            last = pct;
        }
    }

    #[test]
    fn response_mapping_keeps_recommendation_order() {
        let result = AssessmentResult::from_response(ClassifierResponse {
            severity: "low".into(),
            confidence: 0.9,
            recommendations: vec!["Call ambulance".into(), "Keep patient warm".into()],
            force_high_priority: false,
            safety_disclaimer: Some("AI guidance only".into()),
        });
        assert_eq!(result.recommended_actions, ["Call ambulance", "Keep patient warm"]);
        assert_eq!(result.disclaimers, ["AI guidance only"]);
        assert!(result.id.starts_with("tri_"));
        assert!(!result.flagged_for_review());
    }

    #[test]
    fn assessment_ids_are_unique_and_sortable() {
        let first = AssessmentResult::from_response(ClassifierResponse::default());
        let second = AssessmentResult::from_response(ClassifierResponse::default());
        assert_ne!(first.id, second.id);
        assert!(first.id < second.id);
    }

    #[test]
    fn missing_response_fields_take_defaults() {
        let response: ClassifierResponse = serde_json::from_str(r#"{"confidence": 0.9}"#).unwrap();
        let result = AssessmentResult::from_response(response);
        assert_eq!(result.severity, Severity::Medium);
        assert!(result.disclaimers.is_empty());
        assert!(result.recommended_actions.is_empty());
    }
}
