#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use medtriage::core::{AssessmentGateway, Classifier};
use medtriage::models::{
    AssessmentRequest, ClassifierResponse, GeoPoint, HospitalCandidate, PatientInfo, RouteStep, SymptomInput,
    TriageCase, VitalsInput,
};
use medtriage::providers::{HandoffConfirmation, HandoffEmitter, HospitalSearch, LedgerHandoffEmitter, RouteProvider};
use medtriage::workflow::WizardOrchestrator;
use medtriage::{Result, TriageError};

pub fn response(severity: &str, confidence: f64) -> ClassifierResponse {
    ClassifierResponse {
        severity: severity.to_string(),
        confidence,
        recommendations: vec!["Administer oxygen".into(), "Prepare for transport".into()],
        force_high_priority: false,
        safety_disclaimer: Some("AI-generated guidance; confirm clinically.".into()),
    }
}

/// Classifier that answers from a script and records every request.
pub struct ScriptedClassifier {
    replies: Mutex<VecDeque<Result<ClassifierResponse>>>,
    pub requests: Mutex<Vec<AssessmentRequest>>,
}

impl ScriptedClassifier {
    pub fn new(replies: Vec<Result<ClassifierResponse>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, request: &AssessmentRequest) -> Result<ClassifierResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TriageError::Unknown("no scripted reply".into())))
    }
}

/// Classifier whose replies are released by the test, one oneshot per call.
pub struct GatedClassifier {
    gates: Mutex<VecDeque<oneshot::Receiver<Result<ClassifierResponse>>>>,
    calls: AtomicUsize,
}

impl GatedClassifier {
    pub fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Result<ClassifierResponse>>>) {
        let mut senders = Vec::new();
        let mut gates = VecDeque::new();
        for _ in 0..count {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            gates.push_back(rx);
        }
        let classifier = Arc::new(Self {
            gates: Mutex::new(gates),
            calls: AtomicUsize::new(0),
        });
        (classifier, senders)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for GatedClassifier {
    async fn classify(&self, _request: &AssessmentRequest) -> Result<ClassifierResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(TriageError::Unknown("gate dropped".into()))),
            None => Err(TriageError::Unknown("no gate".into())),
        }
    }
}

pub fn wizard_with(classifier: Arc<dyn Classifier>) -> WizardOrchestrator {
    WizardOrchestrator::new(AssessmentGateway::new(classifier))
}

/// Walk a fresh wizard to the vitals step with the given intake.
pub fn wizard_on_vitals(classifier: Arc<dyn Classifier>, symptoms: SymptomInput, vitals: VitalsInput) -> WizardOrchestrator {
    let wizard = wizard_with(classifier);
    wizard.start().unwrap();
    wizard.update_patient(PatientInfo {
        age: Some(58),
        gender: Some("male".into()),
        location: Some(GeoPoint::new(12.9716, 77.5946)),
        ..PatientInfo::default()
    })
    .unwrap();
    wizard.next().unwrap();
    wizard.update_symptoms(symptoms).unwrap();
    wizard.next().unwrap();
    wizard.update_vitals(vitals).unwrap();
    wizard
}

pub fn candidate(id: &str, match_score: u8, distance_km: f64) -> HospitalCandidate {
    HospitalCandidate {
        id: id.to_string(),
        name: format!("Hospital {id}"),
        distance_km,
        eta_minutes: (distance_km * 3.0) as u32,
        beds_available: 4,
        beds_total: 10,
        specialist_on_call: match_score > 80,
        match_score,
    }
}

pub fn triage_case(location: Option<GeoPoint>) -> TriageCase {
    TriageCase {
        patient: PatientInfo {
            age: Some(40),
            location,
            ..PatientInfo::default()
        },
        symptoms: SymptomInput::new(["shortness of breath"], ""),
        vitals: VitalsInput {
            spo2_percent: Some(89),
            ..VitalsInput::default()
        },
        assessment: medtriage::core::policy::apply(medtriage::models::AssessmentResult::from_response(response(
            "high", 0.91,
        ))),
    }
}

pub struct ScriptedSearch {
    replies: Mutex<VecDeque<Result<Vec<HospitalCandidate>>>>,
    pub locations: Mutex<Vec<GeoPoint>>,
}

impl ScriptedSearch {
    pub fn new(replies: Vec<Result<Vec<HospitalCandidate>>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            locations: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.locations.lock().unwrap().len()
    }
}

#[async_trait]
impl HospitalSearch for ScriptedSearch {
    async fn search(&self, location: GeoPoint) -> Result<Vec<HospitalCandidate>> {
        self.locations.lock().unwrap().push(location);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TriageError::Network("no scripted reply".into())))
    }
}

/// Route provider whose replies are released per hospital id by the test.
#[derive(Default)]
pub struct GatedRoutes {
    gates: Mutex<Vec<(String, oneshot::Receiver<Result<Vec<RouteStep>>>)>>,
    pub requested: Mutex<Vec<String>>,
}

impl GatedRoutes {
    pub fn gate(&self, hospital_id: &str) -> oneshot::Sender<Result<Vec<RouteStep>>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push((hospital_id.to_string(), rx));
        tx
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait]
impl RouteProvider for GatedRoutes {
    async fn route_steps(&self, hospital_id: &str) -> Result<Vec<RouteStep>> {
        self.requested.lock().unwrap().push(hospital_id.to_string());
        let gate = {
            let mut gates = self.gates.lock().unwrap();
            gates
                .iter()
                .position(|(id, _)| id == hospital_id)
                .map(|i| gates.remove(i).1)
        };
        match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(TriageError::Unknown("gate dropped".into()))),
            None => Ok(vec![RouteStep::new(format!("Drive to {hospital_id}"), None)]),
        }
    }
}

pub struct FailingHandoff;

#[async_trait]
impl HandoffEmitter for FailingHandoff {
    async fn generate(&self, _case: &TriageCase, _hospital: &HospitalCandidate) -> Result<HandoffConfirmation> {
        Err(TriageError::Network("handoff service unreachable".into()))
    }
}

/// Ledger-backed emitter that waits for the test to release it.
pub struct GatedHandoff {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub ledger: LedgerHandoffEmitter,
}

impl GatedHandoff {
    pub fn new() -> (Arc<Self>, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let handoff = Arc::new(Self {
            gate: Mutex::new(Some(rx)),
            ledger: LedgerHandoffEmitter::new(),
        });
        (handoff, tx)
    }
}

#[async_trait]
impl HandoffEmitter for GatedHandoff {
    async fn generate(&self, case: &TriageCase, hospital: &HospitalCandidate) -> Result<HandoffConfirmation> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(rx) = gate {
            rx.await.map_err(|_| TriageError::Unknown("gate dropped".into()))?;
        }
        self.ledger.generate(case, hospital).await
    }
}
