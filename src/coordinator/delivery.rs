//! Background delivery of a new registration: the confirmation email and
//! the store append. Neither blocks the coordinator and neither can undo
//! the assignment already shown.
//!
//! Both jobs are spawned parked. They only run once `PendingDelivery::release`
//! is called, so a failed spawn leaves nothing half-delivered and the caller
//! can announce the assignment before any outcome is published.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use crate::coordinator::RegistrationEvent;
use crate::domain::{Confirmation, RegistrationRecord};
use crate::error::{CollaboratorError, NotifyError};
use crate::remote::{MembershipStore, Notifier};

/// What a finished delivery job reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Notified(Result<(), NotifyError>),
    Persisted(Result<(), CollaboratorError>),
    /// Never released; the job returned without touching a collaborator.
    Cancelled,
}

pub type Job = Box<dyn FnOnce() -> DeliveryOutcome + Send + 'static>;

/// Starts delivery jobs off the caller's thread.
pub trait Spawn: Send + Sync {
    fn spawn(&self, name: &str, job: Job) -> io::Result<JoinHandle<DeliveryOutcome>>;
}

/// One named OS thread per job.
pub struct ThreadSpawner;

impl Spawn for ThreadSpawner {
    fn spawn(&self, name: &str, job: Job) -> io::Result<JoinHandle<DeliveryOutcome>> {
        thread::Builder::new().name(name.to_string()).spawn(job)
    }
}

/// Fan-out of coordinator events to every subscriber.
///
/// Cloned into delivery jobs so their outcomes reach subscribers that
/// registered before or after the submit.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<RegistrationEvent>>>>,
}

impl EventBus {
    pub fn subscribe(&self) -> Receiver<RegistrationEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    pub fn publish(&self, event: RegistrationEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        // Receivers that were dropped are forgotten.
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Handle on the in-flight deliveries of one registration.
#[derive(Debug)]
pub struct Delivery {
    handles: Vec<JoinHandle<DeliveryOutcome>>,
}

/// Results of both deliveries. `None` means the job died without reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub notified: Option<Result<(), NotifyError>>,
    pub persisted: Option<Result<(), CollaboratorError>>,
}

impl Delivery {
    /// Block until both jobs are done.
    pub fn wait(self) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for handle in self.handles {
            match handle.join() {
                Ok(DeliveryOutcome::Notified(result)) => report.notified = Some(result),
                Ok(DeliveryOutcome::Persisted(result)) => report.persisted = Some(result),
                Ok(DeliveryOutcome::Cancelled) => {}
                Err(_) => error!("delivery thread panicked"),
            }
        }
        report
    }
}

/// Spawned jobs waiting for their start signal.
///
/// Dropping this without calling `release` cancels both jobs.
#[derive(Debug)]
pub struct PendingDelivery {
    handles: Vec<JoinHandle<DeliveryOutcome>>,
    start: Vec<Sender<()>>,
}

impl PendingDelivery {
    pub fn release(self) -> Delivery {
        for signal in &self.start {
            // A job that already exited has nothing left to start.
            let _ = signal.send(());
        }
        Delivery { handles: self.handles }
    }
}

/// Wrap `job` so it waits for the start signal. A dropped signal cancels it.
fn parked(job: impl FnOnce() -> DeliveryOutcome + Send + 'static) -> (Sender<()>, Job) {
    let (tx, rx) = mpsc::channel::<()>();
    let job: Job = Box::new(move || match rx.recv() {
        Ok(()) => job(),
        Err(_) => DeliveryOutcome::Cancelled,
    });
    (tx, job)
}

/// Spawn the store append and the confirmation send, both parked.
///
/// If either spawn fails, the already spawned job is cancelled and nothing
/// reaches a collaborator.
pub fn dispatch(
    spawner: &dyn Spawn,
    store: Arc<dyn MembershipStore>,
    notifier: Arc<dyn Notifier>,
    events: &EventBus,
    record: RegistrationRecord,
    confirmation: Confirmation,
) -> Result<PendingDelivery, (&'static str, io::Error)> {
    let mut pending = PendingDelivery {
        handles: Vec::with_capacity(2),
        start: Vec::with_capacity(2),
    };

    let bus = events.clone();
    let (start, persist) = parked(move || {
        let result = store.persist(&record);
        match &result {
            Ok(()) => info!(email = %record.email, "registration saved"),
            Err(err) => warn!(email = %record.email, error = %err, "failed to save registration"),
        }
        bus.publish(RegistrationEvent::Persisted(result.clone()));
        DeliveryOutcome::Persisted(result)
    });
    pending.handles.push(spawner.spawn("pies-persist", persist).map_err(|e| ("persist", e))?);
    pending.start.push(start);

    let bus = events.clone();
    let (start, notify) = parked(move || {
        let result = notifier.send(&confirmation);
        match &result {
            Ok(()) => info!(to = %confirmation.to_email, "confirmation sent"),
            Err(err) => warn!(to = %confirmation.to_email, error = %err, "confirmation failed"),
        }
        bus.publish(RegistrationEvent::Notified(result.clone()));
        DeliveryOutcome::Notified(result)
    });
    pending.handles.push(spawner.spawn("pies-notify", notify).map_err(|e| ("notify", e))?);
    pending.start.push(start);

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parked_job_runs_only_when_released() {
        let (start, job) = parked(|| DeliveryOutcome::Notified(Ok(())));
        let handle = ThreadSpawner.spawn("parked-test", job).unwrap();
        start.send(()).unwrap();
        assert_eq!(handle.join().unwrap(), DeliveryOutcome::Notified(Ok(())));
    }

    #[test]
    fn dropped_signal_cancels_the_job() {
        let (start, job) = parked(|| panic!("cancelled job must not run"));
        let handle = ThreadSpawner.spawn("parked-test", job).unwrap();
        drop(start);
        assert_eq!(handle.join().unwrap(), DeliveryOutcome::Cancelled);
    }
}
