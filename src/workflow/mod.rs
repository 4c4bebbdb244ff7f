//! The two chained state machines: intake wizard, then disposition.
//!
//! Each orchestrator owns its state exclusively. Presentation reads cloned
//! snapshots or subscribes to a watch channel; it never mutates state
//! directly. Requests that may suspend carry a sequence token and their
//! result is applied only while that token is still the latest issued for
//! its slot.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::TriageError;

pub mod disposition;
pub mod wizard;

pub use disposition::{DispositionEvent, DispositionOrchestrator, DispositionPhase, DispositionProviders, DispositionState};
pub use wizard::{WizardEvent, WizardOrchestrator, WizardState, WizardStep};

/// What happened to a request that may suspend.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The result was applied to state.
    Applied(T),
    /// The request failed; the error is now the state's last error.
    Failed(TriageError),
    /// A request for the same slot was already in flight; nothing was issued.
    Ignored,
    /// A newer request, a step change or a reset overtook this one. Its
    /// result was discarded.
    Superseded,
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Monotonic request sequence for one slot.
#[derive(Debug, Default)]
pub(crate) struct RequestSeq(AtomicU64);

impl RequestSeq {
    /// Issue a new token, invalidating every earlier one.
    pub(crate) fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Invalidate outstanding tokens without issuing a request.
    pub(crate) fn cancel(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn is_latest(&self, token: u64) -> bool {
        self.0.load(Ordering::SeqCst) == token
    }
}
