use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::core::ai::Classifier;
use crate::core::{data, policy};
use crate::error::{Result, TriageError};
use crate::models::{AssessmentResult, PatientInfo, SymptomInput, VitalsInput};

/// Maps intake records to a classifier request and the response back to a
/// severity-annotated [`AssessmentResult`].
#[derive(Clone)]
pub struct AssessmentGateway {
    classifier: Arc<dyn Classifier>,
}

impl AssessmentGateway {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Validate, classify and map. The severity override has already been
    /// applied to the returned result.
    #[instrument(skip_all)]
    pub async fn assess(
        &self,
        patient: &PatientInfo,
        symptoms: &SymptomInput,
        vitals: &VitalsInput,
    ) -> Result<AssessmentResult> {
        let request = data::build_request(patient, symptoms, vitals)?;

        let response = match self.classifier.classify(&request).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    TriageError::Unknown(_) => error!(kind = err.kind(), "assessment failed: {err}"),
                    _ => warn!(kind = err.kind(), "assessment failed: {err}"),
                }
                return Err(err);
            }
        };

        let result = policy::apply(AssessmentResult::from_response(response));
        info!(
            assessment_id = %result.id,
            severity = %result.severity,
            confidence = result.confidence,
            flagged = result.flagged_for_review(),
            "assessment complete"
        );
        Ok(result)
    }
}
