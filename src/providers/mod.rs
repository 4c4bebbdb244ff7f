//! Collaborator seams the workflow depends on: hospital search, routing,
//! handoff emission and the operator session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{GeoPoint, HospitalCandidate, RouteStep, TriageCase};

pub mod directory;
pub mod ledger;
pub mod session;

pub use directory::{StaticHospitalDirectory, StaticRouteProvider};
pub use ledger::LedgerHandoffEmitter;
pub use session::StaticSession;

#[async_trait]
pub trait HospitalSearch: Send + Sync {
    async fn search(&self, location: GeoPoint) -> Result<Vec<HospitalCandidate>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route_steps(&self, hospital_id: &str) -> Result<Vec<RouteStep>>;
}

#[async_trait]
pub trait HandoffEmitter: Send + Sync {
    async fn generate(&self, case: &TriageCase, hospital: &HospitalCandidate) -> Result<HandoffConfirmation>;
}

/// Read by presentation only; the workflow itself never consults it.
pub trait SessionProvider: Send + Sync {
    fn is_active(&self) -> bool;
    fn role_label(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffConfirmation {
    pub reference: String,
    pub hospital_id: String,
    pub assessment_id: String,
    pub hash: String,
    pub previous_hash: Option<String>,
    pub issued_at: DateTime<Utc>,
}
