//! Intake, assessment and disposition data types.

pub mod hospital;
pub mod patient;
pub mod triage;

pub use hospital::{rank_candidates, HospitalCandidate, RouteStep};
pub use patient::{Avpu, GeoPoint, PatientForm, PatientInfo, SymptomInput, VitalsForm, VitalsInput};
pub use triage::{AssessmentRequest, AssessmentResult, ClassifierResponse, Severity, TriageCase};
