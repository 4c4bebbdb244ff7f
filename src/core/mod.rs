//! Assessment pipeline: request building, classification, severity policy.

pub mod ai;
pub mod data;
pub mod gateway;
pub mod policy;

pub use ai::{Classifier, LocalClassifier, RemoteClassifier};
pub use gateway::AssessmentGateway;
