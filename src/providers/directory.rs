use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{HospitalSearch, RouteProvider};
use crate::error::{Result, TriageError};
use crate::models::{GeoPoint, HospitalCandidate, RouteStep};

/// Fixed hospital list for demos and field drills without connectivity.
#[derive(Debug, Clone)]
pub struct StaticHospitalDirectory {
    hospitals: Vec<HospitalCandidate>,
    latency: Duration,
}

impl StaticHospitalDirectory {
    pub fn new(hospitals: Vec<HospitalCandidate>) -> Self {
        Self {
            hospitals,
            latency: Duration::ZERO,
        }
    }

    /// Simulate a slow lookup.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

fn hospital(
    id: &str,
    name: &str,
    distance_km: f64,
    eta_minutes: u32,
    beds: (u32, u32),
    specialist_on_call: bool,
    match_score: u8,
) -> HospitalCandidate {
    HospitalCandidate {
        id: id.to_string(),
        name: name.to_string(),
        distance_km,
        eta_minutes,
        beds_available: beds.0,
        beds_total: beds.1,
        specialist_on_call,
        match_score,
    }
}

impl Default for StaticHospitalDirectory {
    fn default() -> Self {
        Self::new(vec![
            hospital("h1", "City General Hospital", 2.5, 8, (12, 50), true, 92),
            hospital("h2", "Rural Care Center", 5.0, 15, (5, 20), false, 78),
            hospital("h3", "District Medical College", 7.2, 22, (8, 30), true, 85),
        ])
    }
}

#[async_trait]
impl HospitalSearch for StaticHospitalDirectory {
    async fn search(&self, location: GeoPoint) -> Result<Vec<HospitalCandidate>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(lat = location.lat, lng = location.lng, count = self.hospitals.len(), "hospital search");
        Ok(self.hospitals.clone())
    }
}

#[derive(Debug, Clone)]
pub struct StaticRouteProvider {
    steps: Vec<RouteStep>,
    latency: Duration,
}

impl StaticRouteProvider {
    pub fn new(steps: Vec<RouteStep>) -> Self {
        Self {
            steps,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl Default for StaticRouteProvider {
    fn default() -> Self {
        Self::new(vec![
            RouteStep::new("Head north on Main Rd", Some(500)),
            RouteStep::new("Turn right at Health St", Some(1200)),
            RouteStep::new("Destination on the left", None),
        ])
    }
}

#[async_trait]
impl RouteProvider for StaticRouteProvider {
    async fn route_steps(&self, hospital_id: &str) -> Result<Vec<RouteStep>> {
        if hospital_id.is_empty() {
            return Err(TriageError::validation("hospital id required for routing"));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.steps.clone())
    }
}
