//! Wiring shared by the CLI commands and the TUI.
//!
//! Builds the store and notifier from config and hands out a fresh
//! coordinator per signup session:
//! config -> store/notifier -> coordinator

use std::sync::Arc;

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::error::AppError;
use crate::gate::PasswordGate;
use crate::remote::{EmailJsNotifier, MembershipStore, Notifier, SheetClient};

/// Everything a front-end needs to run signups.
#[derive(Clone)]
pub struct Session {
    pub store: Arc<dyn MembershipStore>,
    pub notifier: Arc<dyn Notifier>,
    pub event_label: String,
    pub gate_password: String,
}

impl Session {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let store = SheetClient::new(config.store_url.clone(), config.http_timeout)?;
        let notifier = EmailJsNotifier::new(config.emailjs.clone(), config.http_timeout);
        Ok(Self {
            store: Arc::new(store),
            notifier: Arc::new(notifier),
            event_label: config.event_label(),
            gate_password: config.gate_password.clone(),
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::from_config(&Config::from_env()?)
    }

    pub fn gate(&self) -> PasswordGate {
        PasswordGate::new(self.gate_password.clone())
    }

    pub fn coordinator(&self) -> Coordinator {
        Coordinator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            self.event_label.clone(),
        )
    }
}
