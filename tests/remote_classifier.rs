use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medtriage::config::{ClassifierConfig, ClassifierMode};
use medtriage::core::{Classifier, RemoteClassifier};
use medtriage::models::AssessmentRequest;
use medtriage::TriageError;

fn request() -> AssessmentRequest {
    AssessmentRequest {
        symptoms: vec!["chest pain".into()],
        vitals: BTreeMap::from([("heart_rate".to_string(), 110.0)]),
        age: Some(58),
        sex: Some("male".into()),
    }
}

fn classifier(server: &MockServer, timeout: Duration) -> RemoteClassifier {
    let config = ClassifierConfig {
        base_url: server.uri(),
        triage_path: "/triage".into(),
        timeout_secs: 30,
        mode: ClassifierMode::Remote,
    };
    RemoteClassifier::new(config.endpoint().unwrap(), timeout).unwrap()
}

#[tokio::test]
async fn posts_the_request_and_maps_the_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/triage"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "symptoms": ["chest pain"],
            "vitals": {"heart_rate": 110.0},
            "age_years": 58,
            "sex": "male"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "severity": "high",
            "confidence": 0.92,
            "recommendations": ["Administer aspirin", "Transport immediately"],
            "force_high_priority": false,
            "safety_disclaimer": "Decision support only."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = classifier(&server, Duration::from_secs(5))
        .classify(&request())
        .await
        .unwrap();

    assert_eq!(reply.severity, "high");
    assert_eq!(reply.confidence, 0.92);
    assert_eq!(reply.recommendations, ["Administer aspirin", "Transport immediately"]);
    assert_eq!(reply.safety_disclaimer.as_deref(), Some("Decision support only."));
}

#[tokio::test]
async fn missing_fields_fall_back_to_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"confidence": 0.5})))
        .mount(&server)
        .await;

    let reply = classifier(&server, Duration::from_secs(5))
        .classify(&request())
        .await
        .unwrap();
    assert!(reply.severity.is_empty());
    assert!(reply.recommendations.is_empty());
    assert!(!reply.force_high_priority);
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/triage"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model unavailable"))
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_secs(5))
        .classify(&request())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TriageError::Api {
            status: 500,
            body: "model unavailable".into()
        }
    );
}

#[tokio::test]
async fn slow_reply_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_millis(50))
        .classify(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let endpoint = Url::parse("http://127.0.0.1:1/triage").unwrap();
    let err = RemoteClassifier::new(endpoint, Duration::from_secs(2))
        .unwrap()
        .classify(&request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "NetworkError");
}

#[tokio::test]
async fn malformed_body_is_an_unknown_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_secs(5))
        .classify(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::Unknown(_)));
}
