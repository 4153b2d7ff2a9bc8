//! Step sequencing for the podcast creation wizard.
//!
//! Each wizard session flows through: METADATA → PARTICIPANTS → TRANSCRIPT
//! → GENERATE. Forward movement is gated on the current step being valid
//! and the draft store reconciling successfully; backward movement never
//! persists anything.

use std::fmt;

use tracing::debug;

use crate::api::ApiClient;
use crate::draft::{DraftStore, ReconcileReport};

/// The four steps of the creation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Metadata,
    Participants,
    Transcript,
    Generate,
}

impl WizardStep {
    fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Metadata => Some(WizardStep::Participants),
            WizardStep::Participants => Some(WizardStep::Transcript),
            WizardStep::Transcript => Some(WizardStep::Generate),
            WizardStep::Generate => None,
        }
    }

    fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::Metadata => None,
            WizardStep::Participants => Some(WizardStep::Metadata),
            WizardStep::Transcript => Some(WizardStep::Participants),
            WizardStep::Generate => Some(WizardStep::Transcript),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStep::Metadata => write!(f, "METADATA"),
            WizardStep::Participants => write!(f, "PARTICIPANTS"),
            WizardStep::Transcript => write!(f, "TRANSCRIPT"),
            WizardStep::Generate => write!(f, "GENERATE"),
        }
    }
}

/// The result of attempting a forward transition.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step was saved and the wizard moved forward.
    Advanced(WizardStep),
    /// The current step's inputs are incomplete; nothing was persisted.
    Invalid(Vec<String>),
    /// Validation passed but reconciliation failed for at least one entity.
    /// The wizard stays on the current step.
    SaveFailed(ReconcileReport),
    /// The wizard is already on the final step.
    AtEnd,
}

/// Drives a [`DraftStore`] through the wizard steps.
pub struct WizardSequencer {
    step: WizardStep,
}

impl WizardSequencer {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Metadata,
        }
    }

    /// Resume a sequencer at a given step (edit mode re-entry).
    pub fn at(step: WizardStep) -> Self {
        Self { step }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Attempt a forward transition: validate the current step, reconcile
    /// the store, and advance only when both succeed. A failed save leaves
    /// the wizard on the current step with the drafts still unsynced.
    pub async fn advance(&mut self, store: &mut DraftStore, api: &ApiClient) -> StepOutcome {
        let Some(next) = self.step.next() else {
            return StepOutcome::AtEnd;
        };

        let issues = match self.step {
            WizardStep::Metadata => store.metadata_issues(),
            WizardStep::Participants => store.participant_issues(),
            // Transcript content is validated on edit; the step itself only
            // requires the roster minimum to still hold.
            WizardStep::Transcript if store.participants.len() < 2 => {
                vec!["at least 2 participants are required".to_string()]
            }
            WizardStep::Transcript | WizardStep::Generate => Vec::new(),
        };
        if !issues.is_empty() {
            debug!(step = %self.step, issues = issues.len(), "step invalid");
            return StepOutcome::Invalid(issues);
        }

        let report = store.reconcile(api).await;
        if !report.is_success() {
            debug!(step = %self.step, failures = report.failures.len(), "save failed");
            return StepOutcome::SaveFailed(report);
        }

        debug!(from = %self.step, to = %next, "advancing");
        self.step = next;
        StepOutcome::Advanced(next)
    }

    /// Move backward without validating or persisting. Already on the first
    /// step is a no-op.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }
}

impl Default for WizardSequencer {
    fn default() -> Self {
        Self::new()
    }
}
