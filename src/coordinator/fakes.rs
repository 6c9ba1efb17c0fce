//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::coordinator::delivery::{DeliveryOutcome, Job, Spawn, ThreadSpawner};
use crate::domain::{CategoryTally, Confirmation, EmailLookup, RegistrationRecord};
use crate::error::{CollaboratorError, NotifyError};
use crate::remote::{MembershipStore, Notifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub check: usize,
    pub tally: usize,
    pub persist: usize,
}

/// Store backed by a map. Persisted records become visible to later
/// `check_email` calls, like the real sheet.
#[derive(Default)]
pub struct FakeStore {
    registered: Mutex<HashMap<String, Option<String>>>,
    tally: Mutex<CategoryTally>,
    check_error: Option<CollaboratorError>,
    tally_error: Option<CollaboratorError>,
    persist_error: Option<CollaboratorError>,
    persist_delay: Option<Duration>,
    records: Mutex<Vec<RegistrationRecord>>,
    calls: Mutex<StoreCalls>,
}

impl FakeStore {
    pub fn with_registered(self, email: &str, pie_type: Option<&str>) -> Self {
        self.registered
            .lock()
            .unwrap()
            .insert(email.to_string(), pie_type.map(str::to_string));
        self
    }

    pub fn with_tally(self, tally: CategoryTally) -> Self {
        *self.tally.lock().unwrap() = tally;
        self
    }

    pub fn with_check_error(mut self, err: CollaboratorError) -> Self {
        self.check_error = Some(err);
        self
    }

    pub fn with_tally_error(mut self, err: CollaboratorError) -> Self {
        self.tally_error = Some(err);
        self
    }

    pub fn with_persist_error(mut self, err: CollaboratorError) -> Self {
        self.persist_error = Some(err);
        self
    }

    pub fn with_persist_delay(mut self, delay: Duration) -> Self {
        self.persist_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> StoreCalls {
        *self.calls.lock().unwrap()
    }

    pub fn records(&self) -> Vec<RegistrationRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl MembershipStore for FakeStore {
    fn check_email(&self, email: &str) -> Result<EmailLookup, CollaboratorError> {
        self.calls.lock().unwrap().check += 1;
        if let Some(err) = &self.check_error {
            return Err(err.clone());
        }
        let registered = self.registered.lock().unwrap();
        Ok(match registered.get(email) {
            Some(pie_type) => EmailLookup {
                exists: true,
                pie_type: pie_type.clone(),
            },
            None => EmailLookup {
                exists: false,
                pie_type: None,
            },
        })
    }

    fn fetch_tally(&self) -> Result<CategoryTally, CollaboratorError> {
        self.calls.lock().unwrap().tally += 1;
        if let Some(err) = &self.tally_error {
            return Err(err.clone());
        }
        Ok(*self.tally.lock().unwrap())
    }

    fn persist(&self, record: &RegistrationRecord) -> Result<(), CollaboratorError> {
        self.calls.lock().unwrap().persist += 1;
        if let Some(delay) = self.persist_delay {
            thread::sleep(delay);
        }
        if let Some(err) = &self.persist_error {
            return Err(err.clone());
        }
        self.registered
            .lock()
            .unwrap()
            .insert(record.email.clone(), Some(record.pie_type.as_str().to_string()));
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

pub struct FakeNotifier {
    result: Result<(), NotifyError>,
    sent: Mutex<Vec<Confirmation>>,
}

impl Default for FakeNotifier {
    fn default() -> Self {
        Self {
            result: Ok(()),
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl FakeNotifier {
    pub fn failing(err: NotifyError) -> Self {
        Self {
            result: Err(err),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Confirmation> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for FakeNotifier {
    fn send(&self, confirmation: &Confirmation) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(confirmation.clone());
        self.result.clone()
    }
}

/// Lets `allowed` spawns through, refuses the next `refusals`, then spawns
/// real threads again.
pub struct FlakySpawner {
    allowed: AtomicUsize,
    refusals: AtomicUsize,
}

impl FlakySpawner {
    pub fn refusing(refusals: usize) -> Self {
        Self::refusing_after(0, refusals)
    }

    pub fn refusing_after(allowed: usize, refusals: usize) -> Self {
        Self {
            allowed: AtomicUsize::new(allowed),
            refusals: AtomicUsize::new(refusals),
        }
    }
}

impl Spawn for FlakySpawner {
    fn spawn(&self, name: &str, job: Job) -> io::Result<JoinHandle<DeliveryOutcome>> {
        let allowed = self
            .allowed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if allowed {
            return ThreadSpawner.spawn(name, job);
        }
        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(io::Error::other("thread limit reached"));
        }
        ThreadSpawner.spawn(name, job)
    }
}
