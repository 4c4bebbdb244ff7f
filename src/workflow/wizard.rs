use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Outcome, RequestSeq};
use crate::core::AssessmentGateway;
use crate::error::{Result, TriageError};
use crate::models::{AssessmentResult, PatientInfo, SymptomInput, TriageCase, VitalsInput};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    #[default]
    Idle,
    PatientInfo,
    Symptoms,
    Vitals,
    Result,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    Start,
    Next,
    Back,
    AssessmentSucceeded,
    ProceedToReport,
    Reset,
}

impl WizardEvent {
    fn action(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Next => "advance",
            Self::Back => "go back",
            Self::AssessmentSucceeded => "record an assessment",
            Self::ProceedToReport => "proceed to report",
            Self::Reset => "reset",
        }
    }
}

impl WizardStep {
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::PatientInfo => 1,
            Self::Symptoms => 2,
            Self::Vitals => 3,
            Self::Result => 4,
            Self::Report => 5,
        }
    }

    pub fn is_intake(self) -> bool {
        matches!(self, Self::PatientInfo | Self::Symptoms | Self::Vitals)
    }

    /// The wizard's single transition function.
    pub fn on(self, event: WizardEvent, has_result: bool) -> Result<Self> {
        use WizardEvent as E;
        match (self, event) {
            (_, E::Reset) => Ok(Self::Idle),
            (Self::Idle, E::Start) => Ok(Self::PatientInfo),
            (Self::PatientInfo, E::Next) => Ok(Self::Symptoms),
            (Self::Symptoms, E::Next) => Ok(Self::Vitals),
            (Self::Symptoms, E::Back) => Ok(Self::PatientInfo),
            (Self::Vitals, E::Back) => Ok(Self::Symptoms),
            (Self::Vitals, E::AssessmentSucceeded) => Ok(Self::Result),
            (Self::Result, E::ProceedToReport) if has_result => Ok(Self::Report),
            (from, event) => Err(TriageError::invalid_transition(event.action(), from)),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PatientInfo => "on patient info",
            Self::Symptoms => "on symptoms",
            Self::Vitals => "on vitals",
            Self::Result => "showing the result",
            Self::Report => "showing the report",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub patient: PatientInfo,
    pub symptoms: SymptomInput,
    pub vitals: VitalsInput,
    pub result: Option<AssessmentResult>,
    #[serde(skip)]
    pub assessing: bool,
    #[serde(skip)]
    pub last_error: Option<TriageError>,
}

impl WizardState {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| TriageError::Unknown(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TriageError::validation(format!("unreadable wizard state: {e}")))
    }
}

/// Drives intake through assessment to the triage report.
pub struct WizardOrchestrator {
    gateway: AssessmentGateway,
    state: watch::Sender<WizardState>,
    assessment_seq: RequestSeq,
}

impl WizardOrchestrator {
    pub fn new(gateway: AssessmentGateway) -> Self {
        Self::resume(gateway, WizardState::default())
    }

    /// Continue from a saved snapshot. Nothing is in flight after a resume.
    pub fn resume(gateway: AssessmentGateway, mut state: WizardState) -> Self {
        state.assessing = false;
        if state.step >= WizardStep::Result && state.result.is_none() {
            warn!(step = %state.step, "saved state has no result; resuming on vitals");
            state.step = WizardStep::Vitals;
        }
        let (state, _) = watch::channel(state);
        Self {
            gateway,
            state,
            assessment_seq: RequestSeq::default(),
        }
    }

    pub fn snapshot(&self) -> WizardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardState> {
        self.state.subscribe()
    }

    pub fn step(&self) -> WizardStep {
        self.state.borrow().step
    }

    fn apply(&self, event: WizardEvent) -> Result<WizardStep> {
        let mut outcome = Ok(WizardStep::Idle);
        self.state.send_if_modified(|s| match s.step.on(event, s.result.is_some()) {
            Ok(next) => {
                let changed = next != s.step;
                if changed && s.assessing {
                    // Leaving the vitals step abandons the pending assessment.
                    self.assessment_seq.cancel();
                    s.assessing = false;
                }
                s.step = next;
                outcome = Ok(next);
                changed
            }
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        if let Ok(step) = &outcome {
            debug!(?event, step = step.ordinal(), "wizard transition");
        }
        outcome
    }

    pub fn start(&self) -> Result<WizardStep> {
        self.apply(WizardEvent::Start)
    }

    pub fn next(&self) -> Result<WizardStep> {
        self.apply(WizardEvent::Next)
    }

    pub fn back(&self) -> Result<WizardStep> {
        self.apply(WizardEvent::Back)
    }

    pub fn proceed_to_report(&self) -> Result<WizardStep> {
        self.apply(WizardEvent::ProceedToReport)
    }

    /// Replace one intake record. Intake is frozen once a result exists, so
    /// the result always describes the intake it was computed from.
    fn edit_intake(&self, edit: impl FnOnce(&mut WizardState)) -> Result<()> {
        let mut rejected = None;
        self.state.send_if_modified(|s| {
            if s.result.is_some() {
                rejected = Some(TriageError::invalid_transition("edit intake", s.step));
                return false;
            }
            edit(s);
            true
        });
        rejected.map_or(Ok(()), Err)
    }

    pub fn update_patient(&self, patient: PatientInfo) -> Result<()> {
        self.edit_intake(|s| s.patient = patient)
    }

    pub fn update_symptoms(&self, symptoms: SymptomInput) -> Result<()> {
        self.edit_intake(|s| s.symptoms = symptoms)
    }

    pub fn update_vitals(&self, vitals: VitalsInput) -> Result<()> {
        self.edit_intake(|s| s.vitals = vitals)
    }

    /// Explicit human override: mark the current result for doctor review.
    pub fn flag_for_review(&self) -> Result<()> {
        let mut flagged = false;
        self.state.send_if_modified(|s| match s.result.as_mut() {
            Some(result) => {
                flagged = true;
                let was_flagged = result.flagged_for_review();
                result.flag_for_review();
                !was_flagged
            }
            None => false,
        });
        if flagged {
            Ok(())
        } else {
            Err(TriageError::invalid_transition("flag for review", "no result exists"))
        }
    }

    /// Discard everything and return to idle. A late response from an
    /// abandoned assessment is dropped.
    pub fn reset(&self) {
        self.assessment_seq.cancel();
        self.state.send_modify(|s| {
            let step = s.step.on(WizardEvent::Reset, false).unwrap_or_default();
            *s = WizardState {
                step,
                ..WizardState::default()
            };
        });
        info!("wizard reset");
    }

    /// The completed case, once a result exists.
    pub fn case(&self) -> Option<TriageCase> {
        let s = self.state.borrow();
        s.result.as_ref().map(|assessment| TriageCase {
            patient: s.patient.clone(),
            symptoms: s.symptoms.clone(),
            vitals: s.vitals.clone(),
            assessment: assessment.clone(),
        })
    }

    /// Submit the intake for assessment. Only valid on the vitals step. A
    /// second call while one is in flight does nothing.
    pub async fn assess(&self) -> Result<Outcome<AssessmentResult>> {
        let mut issued = None;
        let mut rejected = None;
        self.state.send_if_modified(|s| {
            if s.step != WizardStep::Vitals {
                rejected = Some(TriageError::invalid_transition("assess", s.step));
                return false;
            }
            if s.assessing {
                return false;
            }
            s.assessing = true;
            let token = self.assessment_seq.issue();
            issued = Some((token, s.patient.clone(), s.symptoms.clone(), s.vitals.clone()));
            true
        });

        if let Some(err) = rejected {
            return Err(err);
        }
        let Some((token, patient, symptoms, vitals)) = issued else {
            debug!("assessment already in flight");
            return Ok(Outcome::Ignored);
        };

        let mut guard = InFlight {
            orchestrator: self,
            token,
            armed: true,
        };
        let outcome = self.gateway.assess(&patient, &symptoms, &vitals).await;
        guard.armed = false;

        if !self.assessment_seq.is_latest(token) {
            debug!(token, "discarding superseded assessment");
            return Ok(Outcome::Superseded);
        }

        self.state.send_modify(|s| {
            s.assessing = false;
            match &outcome {
                Ok(result) => {
                    s.result = Some(result.clone());
                    s.last_error = None;
                    if let Ok(next) = s.step.on(WizardEvent::AssessmentSucceeded, true) {
                        s.step = next;
                    }
                }
                Err(err) => s.last_error = Some(err.clone()),
            }
        });

        Ok(match outcome {
            Ok(result) => Outcome::Applied(result),
            Err(err) => Outcome::Failed(err),
        })
    }
}

/// Clears the in-flight flag if the caller drops `assess` mid-request.
struct InFlight<'a> {
    orchestrator: &'a WizardOrchestrator,
    token: u64,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed && self.orchestrator.assessment_seq.is_latest(self.token) {
            self.orchestrator.assessment_seq.cancel();
            self.orchestrator.state.send_modify(|s| s.assessing = false);
        }
    }
}
