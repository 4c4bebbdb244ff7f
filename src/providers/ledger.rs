use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use super::{HandoffConfirmation, HandoffEmitter};
use crate::error::{Result, TriageError};
use crate::models::{HospitalCandidate, TriageCase};
use crate::report;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub reference: String,
    pub issued_at: DateTime<Utc>,
    pub hospital_id: String,
    pub assessment_id: String,
    pub report: String,
    pub hash: String,
    pub previous_hash: Option<String>,
}

fn entry_hash(
    issued_at: &DateTime<Utc>,
    hospital_id: &str,
    assessment_id: &str,
    report: &str,
    previous_hash: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}:{}:{}:{}",
        issued_at.to_rfc3339(),
        hospital_id,
        assessment_id,
        report
    ));
    if let Some(prev) = previous_hash {
        hasher.update(prev);
    }
    format!("{:x}", hasher.finalize())
}

/// Handoff emitter that renders the handoff report and appends it to a
/// hash-chained, append-only ledger.
#[derive(Debug, Default)]
pub struct LedgerHandoffEmitter {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl LedgerHandoffEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<LedgerEntry>>> {
        self.entries
            .lock()
            .map_err(|_| TriageError::Unknown("handoff ledger lock poisoned".into()))
    }

    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.lock()?.clone())
    }

    /// Recompute every hash and check each entry links to its predecessor.
    pub fn verify(&self) -> Result<bool> {
        let entries = self.lock()?;
        let mut previous: Option<&str> = None;
        for entry in entries.iter() {
            if entry.previous_hash.as_deref() != previous {
                return Ok(false);
            }
            let expected = entry_hash(
                &entry.issued_at,
                &entry.hospital_id,
                &entry.assessment_id,
                &entry.report,
                previous,
            );
            if expected != entry.hash {
                return Ok(false);
            }
            previous = Some(&entry.hash);
        }
        Ok(true)
    }
}

#[async_trait]
impl HandoffEmitter for LedgerHandoffEmitter {
    async fn generate(&self, case: &TriageCase, hospital: &HospitalCandidate) -> Result<HandoffConfirmation> {
        let report = report::handoff_report(case, hospital);
        let issued_at = Utc::now();
        let reference = format!("hof_{}", Uuid::new_v4().simple());

        let mut entries = self.lock()?;
        let previous_hash = entries.last().map(|e| e.hash.clone());
        let hash = entry_hash(
            &issued_at,
            &hospital.id,
            &case.assessment.id,
            &report,
            previous_hash.as_deref(),
        );

        let entry = LedgerEntry {
            reference: reference.clone(),
            issued_at,
            hospital_id: hospital.id.clone(),
            assessment_id: case.assessment.id.clone(),
            report,
            hash: hash.clone(),
            previous_hash: previous_hash.clone(),
        };
        debug!(reference = %entry.reference, "ledger entry appended");
        entries.push(entry);

        info!(
            reference = %reference,
            hospital = %hospital.id,
            assessment = %case.assessment.id,
            hash = %hash,
            "handoff report issued"
        );

        Ok(HandoffConfirmation {
            reference,
            hospital_id: hospital.id.clone(),
            assessment_id: case.assessment.id.clone(),
            hash,
            previous_hash,
            issued_at,
        })
    }
}
