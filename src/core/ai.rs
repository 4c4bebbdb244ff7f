use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClassifierConfig;
use crate::core::data::vital_alerts;
use crate::error::{Result, TriageError};
use crate::models::{AssessmentRequest, ClassifierResponse};

/// Anything that can turn an assessment request into a classification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &AssessmentRequest) -> Result<ClassifierResponse>;
}

/// HTTP client for the hosted triage classifier (`POST /triage`).
pub struct RemoteClassifier {
    client: Client,
    endpoint: Url,
}

impl RemoteClassifier {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TriageError::Config(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        Self::new(config.endpoint()?, Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, symptoms = request.symptoms.len()))]
    async fn classify(&self, request: &AssessmentRequest) -> Result<ClassifierResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "classifier responded");
        serde_json::from_str(&body)
            .map_err(|e| TriageError::Unknown(format!("malformed classifier response: {e}")))
    }
}

const RED_FLAG_SYMPTOMS: &[&str] = &[
    "chest pain",
    "unconscious",
    "not breathing",
    "seizure",
    "severe bleeding",
    "stroke",
    "anaphylaxis",
];

const LOCAL_DISCLAIMER: &str =
    "Offline rule-based assessment. Confirm with a clinician as soon as connectivity allows.";

/// Offline rule set used when the hosted classifier is unreachable or
/// disabled. Confidence is capped well below the review threshold, so every
/// local result ends up flagged for review.
#[derive(Debug, Default, Clone)]
pub struct LocalClassifier;

impl LocalClassifier {
    const CONFIDENCE: f64 = 0.6;
}

#[async_trait]
impl Classifier for LocalClassifier {
    async fn classify(&self, request: &AssessmentRequest) -> Result<ClassifierResponse> {
        let alerts = vital_alerts(&request.vitals);
        let red_flags: Vec<&str> = RED_FLAG_SYMPTOMS
            .iter()
            .copied()
            .filter(|flag| {
                request
                    .symptoms
                    .iter()
                    .any(|s| s.to_ascii_lowercase().contains(flag))
            })
            .collect();

        let severity = match (red_flags.len(), alerts.len()) {
            (0, 0) => "low",
            (0, 1) => "medium",
            (_, 0) | (0, _) => "high",
            _ => "critical",
        };

        let mut recommendations: Vec<String> = red_flags
            .iter()
            .map(|flag| format!("Red-flag symptom reported: {flag}"))
            .collect();
        recommendations.extend(alerts);
        recommendations.push("Reassess vitals every 5 minutes".to_string());

        debug!(severity, "local assessment");
        Ok(ClassifierResponse {
            severity: severity.to_string(),
            confidence: Self::CONFIDENCE,
            recommendations,
            force_high_priority: true,
            safety_disclaimer: Some(LOCAL_DISCLAIMER.to_string()),
        })
    }
}
