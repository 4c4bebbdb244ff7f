use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Outcome, RequestSeq};
use crate::error::{Result, TriageError};
use crate::models::{rank_candidates, GeoPoint, HospitalCandidate, RouteStep, TriageCase};
use crate::providers::{HandoffConfirmation, HandoffEmitter, HospitalSearch, RouteProvider};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispositionPhase {
    #[default]
    Searching,
    Matched,
    Navigating,
    Handoff,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionEvent {
    CandidatesFound,
    Select,
    ChangeHospital,
    BeginHandoff,
    FinishHandoff,
}

impl DispositionEvent {
    fn action(self) -> &'static str {
        match self {
            Self::CandidatesFound => "record search results",
            Self::Select => "select a hospital",
            Self::ChangeHospital => "change hospital",
            Self::BeginHandoff => "begin handoff",
            Self::FinishHandoff => "finish handoff",
        }
    }
}

impl DispositionPhase {
    pub fn on(self, event: DispositionEvent) -> Result<Self> {
        use DispositionEvent as E;
        match (self, event) {
            (Self::Searching, E::CandidatesFound) => Ok(Self::Matched),
            (Self::Matched | Self::Navigating | Self::Done, E::Select) => Ok(Self::Navigating),
            (Self::Navigating, E::ChangeHospital) => Ok(Self::Matched),
            (Self::Navigating, E::BeginHandoff) => Ok(Self::Handoff),
            (Self::Handoff, E::FinishHandoff) => Ok(Self::Done),
            (from, event) => Err(TriageError::invalid_transition(event.action(), from)),
        }
    }
}

impl fmt::Display for DispositionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Searching => "searching",
            Self::Matched => "matched",
            Self::Navigating => "navigating",
            Self::Handoff => "in handoff",
            Self::Done => "done",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispositionState {
    pub phase: DispositionPhase,
    /// Ranked: match score descending, distance ascending.
    pub candidates: Vec<HospitalCandidate>,
    pub loading: bool,
    pub route_loading: bool,
    pub error: Option<TriageError>,
    pub selected: Option<HospitalCandidate>,
    pub route_steps: Vec<RouteStep>,
    pub handoff_in_progress: bool,
    pub emitting: bool,
    pub confirmation: Option<HandoffConfirmation>,
}

#[derive(Clone)]
pub struct DispositionProviders {
    pub search: Arc<dyn HospitalSearch>,
    pub routes: Arc<dyn RouteProvider>,
    pub handoff: Arc<dyn HandoffEmitter>,
}

/// Hospital matching, navigation and handoff for one triaged case.
pub struct DispositionOrchestrator {
    case: TriageCase,
    providers: DispositionProviders,
    last_known: Option<GeoPoint>,
    state: watch::Sender<DispositionState>,
    search_seq: RequestSeq,
    route_seq: RequestSeq,
}

impl DispositionOrchestrator {
    pub fn new(case: TriageCase, providers: DispositionProviders) -> Self {
        let (state, _) = watch::channel(DispositionState::default());
        Self {
            case,
            providers,
            last_known: None,
            state,
            search_seq: RequestSeq::default(),
            route_seq: RequestSeq::default(),
        }
    }

    /// Location to search from when the patient record has none.
    pub fn with_last_known(mut self, location: Option<GeoPoint>) -> Self {
        self.last_known = location;
        self
    }

    pub fn case(&self) -> &TriageCase {
        &self.case
    }

    pub fn snapshot(&self) -> DispositionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DispositionState> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> DispositionPhase {
        self.state.borrow().phase
    }

    fn search_location(&self) -> Option<GeoPoint> {
        self.case.patient.location.or(self.last_known)
    }

    fn record_error(&self, err: &TriageError) {
        self.state.send_modify(|s| s.error = Some(err.clone()));
    }

    /// Look up hospitals near the patient. Retryable while still searching.
    pub async fn search(&self) -> Result<Outcome<usize>> {
        let phase = self.phase();
        if phase != DispositionPhase::Searching {
            return Err(TriageError::invalid_transition("search for hospitals", phase));
        }

        let Some(location) = self.search_location() else {
            let err = TriageError::validation("patient location unavailable");
            self.record_error(&err);
            return Ok(Outcome::Failed(err));
        };

        let token = self.search_seq.issue();
        self.state.send_modify(|s| s.loading = true);

        let found = self.providers.search.search(location).await;
        if !self.search_seq.is_latest(token) {
            debug!(token, "discarding superseded hospital search");
            return Ok(Outcome::Superseded);
        }

        match found {
            Ok(mut candidates) => {
                candidates.retain(|c| match c.validate() {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(hospital = %c.id, "dropping candidate: {err}");
                        false
                    }
                });
                rank_candidates(&mut candidates);
                let count = candidates.len();
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = None;
                    s.candidates = candidates;
                    if let Ok(next) = s.phase.on(DispositionEvent::CandidatesFound) {
                        s.phase = next;
                    }
                });
                info!(count, "hospital candidates ranked");
                Ok(Outcome::Applied(count))
            }
            Err(err) => {
                warn!(kind = err.kind(), "hospital search failed: {err}");
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(err.clone());
                });
                Ok(Outcome::Failed(err))
            }
        }
    }

    /// Select a candidate and fetch its route. Selecting again before the
    /// fetch returns supersedes it.
    pub async fn select(&self, hospital_id: &str) -> Result<Outcome<usize>> {
        let mut rejected = None;
        let mut token = 0;
        self.state.send_if_modified(|s| {
            let next = match s.phase.on(DispositionEvent::Select) {
                Ok(next) => next,
                Err(err) => {
                    rejected = Some(err);
                    return false;
                }
            };
            let Some(candidate) = s.candidates.iter().find(|c| c.id == hospital_id).cloned() else {
                rejected = Some(TriageError::validation(format!("unknown hospital {hospital_id}")));
                return false;
            };
            token = self.route_seq.issue();
            s.phase = next;
            s.selected = Some(candidate);
            s.route_steps.clear();
            s.route_loading = true;
            true
        });
        if let Some(err) = rejected {
            return Err(err);
        }
        debug!(hospital = hospital_id, token, "fetching route");

        let fetched = self.providers.routes.route_steps(hospital_id).await;

        let selected_id = self.state.borrow().selected.as_ref().map(|c| c.id.clone());
        if !self.route_seq.is_latest(token) || selected_id.as_deref() != Some(hospital_id) {
            debug!(hospital = hospital_id, "discarding route for a superseded selection");
            return Ok(Outcome::Superseded);
        }

        match fetched {
            Ok(steps) => {
                let count = steps.len();
                self.state.send_modify(|s| {
                    s.route_loading = false;
                    s.error = None;
                    s.route_steps = steps;
                });
                Ok(Outcome::Applied(count))
            }
            Err(err) => {
                warn!(kind = err.kind(), hospital = hospital_id, "route fetch failed: {err}");
                self.state.send_modify(|s| {
                    s.route_loading = false;
                    s.error = Some(err.clone());
                });
                Ok(Outcome::Failed(err))
            }
        }
    }

    /// Drop the current selection and return to the ranked list. The list
    /// is not fetched again.
    pub fn change_hospital(&self) -> Result<()> {
        self.transition(DispositionEvent::ChangeHospital, |s| {
            s.selected = None;
            s.route_steps.clear();
            s.route_loading = false;
        })?;
        self.route_seq.cancel();
        Ok(())
    }

    pub fn begin_handoff(&self) -> Result<()> {
        self.transition(DispositionEvent::BeginHandoff, |s| {
            s.handoff_in_progress = true;
            s.confirmation = None;
        })
    }

    /// Generate the handoff report for the selected hospital. May be retried
    /// from the handoff phase after a failure.
    pub async fn emit_handoff(&self) -> Result<Outcome<HandoffConfirmation>> {
        let mut target = None;
        let mut rejected = None;
        self.state.send_if_modified(|s| {
            if s.phase != DispositionPhase::Handoff {
                rejected = Some(TriageError::invalid_transition("emit a handoff report", s.phase));
                return false;
            }
            if s.emitting {
                return false;
            }
            match s.selected.clone() {
                Some(hospital) => {
                    s.emitting = true;
                    target = Some(hospital);
                    true
                }
                None => {
                    rejected = Some(TriageError::validation("no hospital selected"));
                    false
                }
            }
        });
        if let Some(err) = rejected {
            return Err(err);
        }
        let Some(hospital) = target else {
            return Ok(Outcome::Ignored);
        };

        let emitted = self.providers.handoff.generate(&self.case, &hospital).await;
        let still_current = {
            let s = self.state.borrow();
            s.phase == DispositionPhase::Handoff && s.selected.as_ref().map(|c| &c.id) == Some(&hospital.id)
        };
        self.state.send_modify(|s| s.emitting = false);
        if !still_current {
            return Ok(Outcome::Superseded);
        }

        match emitted {
            Ok(confirmation) => {
                self.state.send_modify(|s| {
                    s.error = None;
                    s.confirmation = Some(confirmation.clone());
                });
                Ok(Outcome::Applied(confirmation))
            }
            Err(err) => {
                warn!(kind = err.kind(), hospital = %hospital.id, "handoff failed: {err}");
                self.record_error(&err);
                Ok(Outcome::Failed(err))
            }
        }
    }

    /// Close the handoff. Selection and route are cleared so a fresh
    /// selection can start from the ranked list. Rejected while a handoff
    /// report is still being generated.
    pub fn finish_handoff(&self) -> Result<()> {
        if self.state.borrow().emitting {
            return Err(TriageError::invalid_transition(
                "finish handoff",
                "a handoff report is being generated",
            ));
        }
        self.transition(DispositionEvent::FinishHandoff, |s| {
            s.handoff_in_progress = false;
            s.selected = None;
            s.route_steps.clear();
            s.route_loading = false;
        })?;
        self.route_seq.cancel();
        Ok(())
    }

    fn transition(&self, event: DispositionEvent, effect: impl FnOnce(&mut DispositionState)) -> Result<()> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|s| match s.phase.on(event) {
            Ok(next) => {
                s.phase = next;
                effect(s);
                true
            }
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        if outcome.is_ok() {
            debug!(?event, "disposition transition");
        }
        outcome
    }
}
