//! Registration coordinator.
//!
//! Owns the submission state machine:
//!
//! ```text
//! Idle ──submit──▶ Submitting ──┬─▶ DuplicateShown   (terminal)
//!   ▲                           ├─▶ AssignedShown    (terminal)
//!   └──────submit───────────────┴─▶ ErrorShown
//! ```
//!
//! The coordinator never talks to a terminal. Front-ends subscribe to
//! `RegistrationEvent`s and render from them.

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use tracing::{error, info};

use crate::domain::{Confirmation, PieType, Registrant, RegistrationRecord};
use crate::error::{CollaboratorError, NotifyError, OrchestrationError, SubmitError};
use crate::remote::{MembershipStore, Notifier};

pub mod assign;
pub mod delivery;
pub mod guard;

#[cfg(test)]
pub(crate) mod fakes;

pub use assign::{assign_category, balance};
pub use delivery::{Delivery, DeliveryReport, EventBus, PendingDelivery, Spawn, ThreadSpawner};
pub use guard::{DuplicateCheck, check_duplicate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    DuplicateShown { prior: String },
    AssignedShown { pie: PieType },
    ErrorShown,
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting => "submitting",
            SubmissionState::DuplicateShown { .. } => "already submitted",
            SubmissionState::AssignedShown { .. } => "submitted",
            SubmissionState::ErrorShown => "failed",
        }
    }

    /// Whether the submit control is enabled.
    pub fn accepts_submit(&self) -> bool {
        matches!(self, SubmissionState::Idle | SubmissionState::ErrorShown)
    }

    /// Terminal states hide the form inputs for good.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::DuplicateShown { .. } | SubmissionState::AssignedShown { .. }
        )
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            SubmissionState::Submitting => "Processing...",
            _ => "Submit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    StateChanged(SubmissionState),
    SubmitLocked,
    SubmitUnlocked,
    Notified(Result<(), NotifyError>),
    Persisted(Result<(), CollaboratorError>),
}

/// Result of a submit that the state machine accepted.
#[derive(Debug)]
pub struct Submission {
    pub state: SubmissionState,
    /// Present only on the new-registration path.
    pub delivery: Option<Delivery>,
}

pub struct Coordinator {
    store: Arc<dyn MembershipStore>,
    notifier: Arc<dyn Notifier>,
    spawner: Box<dyn Spawn>,
    event_label: String,
    state: SubmissionState,
    events: EventBus,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        notifier: Arc<dyn Notifier>,
        event_label: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            spawner: Box::new(ThreadSpawner),
            event_label: event_label.into(),
            state: SubmissionState::Idle,
            events: EventBus::default(),
        }
    }

    pub fn with_spawner(mut self, spawner: impl Spawn + 'static) -> Self {
        self.spawner = Box::new(spawner);
        self
    }

    pub fn subscribe(&self) -> Receiver<RegistrationEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn event_label(&self) -> &str {
        &self.event_label
    }

    /// Run one submission to completion of its visible part.
    ///
    /// Blocks on the duplicate check and the tally fetch. The confirmation
    /// and the store append continue in the background; their outcomes
    /// arrive as events and through the returned `Delivery`.
    pub fn submit(&mut self, registrant: &Registrant) -> Result<Submission, SubmitError> {
        if !self.state.accepts_submit() {
            return Err(SubmitError::Locked(self.state.name()));
        }

        self.transition(SubmissionState::Submitting);
        self.events.publish(RegistrationEvent::SubmitLocked);
        info!(email = %registrant.email, "registration submitted");

        if let DuplicateCheck::Found(prior) = check_duplicate(self.store.as_ref(), &registrant.email) {
            self.transition(SubmissionState::DuplicateShown { prior });
            return Ok(self.settled(None));
        }

        let pie = assign_category(self.store.as_ref());

        match self.start_delivery(registrant, pie) {
            Ok(pending) => {
                // Announce the assignment before any delivery outcome.
                self.transition(SubmissionState::AssignedShown { pie });
                Ok(self.settled(Some(pending.release())))
            }
            Err(err) => {
                error!(error = %err, "registration could not be completed");
                self.transition(SubmissionState::ErrorShown);
                self.events.publish(RegistrationEvent::SubmitUnlocked);
                Ok(self.settled(None))
            }
        }
    }

    fn start_delivery(&self, registrant: &Registrant, pie: PieType) -> Result<PendingDelivery, OrchestrationError> {
        let record = RegistrationRecord::new(registrant, pie, &self.event_label);
        let confirmation = Confirmation::new(registrant, pie, &self.event_label);
        delivery::dispatch(
            self.spawner.as_ref(),
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            &self.events,
            record,
            confirmation,
        )
        .map_err(|(task, e)| OrchestrationError::Dispatch {
            task,
            reason: e.to_string(),
        })
    }

    fn transition(&mut self, next: SubmissionState) {
        info!(from = self.state.name(), to = next.name(), "submission state");
        self.state = next.clone();
        self.events.publish(RegistrationEvent::StateChanged(next));
    }

    fn settled(&self, delivery: Option<Delivery>) -> Submission {
        Submission {
            state: self.state.clone(),
            delivery,
        }
    }
}
