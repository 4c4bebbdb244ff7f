use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalCandidate {
    pub id: String,
    pub name: String,
    pub distance_km: f64,
    pub eta_minutes: u32,
    pub beds_available: u32,
    pub beds_total: u32,
    pub specialist_on_call: bool,
    pub match_score: u8,
}

impl HospitalCandidate {
    pub fn validate(&self) -> Result<()> {
        if self.beds_available > self.beds_total {
            return Err(TriageError::validation(format!(
                "hospital {} reports {} beds available out of {}",
                self.id, self.beds_available, self.beds_total
            )));
        }
        if self.match_score > 100 {
            return Err(TriageError::validation(format!(
                "hospital {} match score {} out of range",
                self.id, self.match_score
            )));
        }
        Ok(())
    }
}

/// Match score descending, then distance ascending.
pub fn rank_candidates(candidates: &mut [HospitalCandidate]) {
    candidates.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.distance_km.total_cmp(&b.distance_km))
    });
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    /// Distance to the next step. Absent on the final step.
    pub distance_meters: Option<u32>,
}

impl RouteStep {
    pub fn new(instruction: impl Into<String>, distance_meters: Option<u32>) -> Self {
        Self {
            instruction: instruction.into(),
            distance_meters,
        }
    }
}

pub fn route_length_meters(steps: &[RouteStep]) -> u32 {
    steps.iter().filter_map(|s| s.distance_meters).sum()
}
