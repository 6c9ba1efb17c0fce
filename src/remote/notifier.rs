//! Confirmation emails via the EmailJS REST API.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EmailJsConfig;
use crate::domain::Confirmation;
use crate::error::NotifyError;

const SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Sends a confirmation to a freshly registered person.
pub trait Notifier: Send + Sync {
    fn send(&self, confirmation: &Confirmation) -> Result<(), NotifyError>;
}

/// Lifecycle of the EmailJS handle. Callers only ever see `send`.
enum Readiness {
    Uninitialized,
    Ready(Ready),
    Failed(String),
}

#[derive(Clone)]
struct Ready {
    client: Client,
    service_id: String,
    template_id: String,
    public_key: String,
}

pub struct EmailJsNotifier {
    config: EmailJsConfig,
    timeout: Option<Duration>,
    send_url: String,
    state: Mutex<Readiness>,
}

impl EmailJsNotifier {
    pub fn new(config: EmailJsConfig, timeout: Option<Duration>) -> Self {
        Self {
            config,
            timeout,
            send_url: SEND_URL.to_string(),
            state: Mutex::new(Readiness::Uninitialized),
        }
    }

    /// Resolve the readiness state on first use and keep it from then on.
    ///
    /// Hands out a copy of the ready handle so the lock is released before
    /// any request goes out.
    fn ready(&self) -> Result<Ready, NotifyError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| NotifyError::Unavailable("notifier state poisoned".to_string()))?;

        if matches!(*state, Readiness::Uninitialized) {
            *state = match initialize(&self.config, self.timeout) {
                Ok(ready) => {
                    info!("EmailJS notifier ready");
                    Readiness::Ready(ready)
                }
                Err(reason) => {
                    warn!(%reason, "EmailJS notifier unavailable");
                    Readiness::Failed(reason)
                }
            };
        }

        match &*state {
            Readiness::Ready(ready) => Ok(ready.clone()),
            Readiness::Failed(reason) => Err(NotifyError::Unavailable(reason.clone())),
            Readiness::Uninitialized => Err(NotifyError::Unavailable("not initialized".to_string())),
        }
    }
}

fn initialize(config: &EmailJsConfig, timeout: Option<Duration>) -> Result<Ready, String> {
    let service_id = config.service_id.clone().ok_or("missing EMAILJS_SERVICE_ID")?;
    let template_id = config.template_id.clone().ok_or("missing EMAILJS_TEMPLATE_ID")?;
    let public_key = config.public_key.clone().ok_or("missing EMAILJS_PUBLIC_KEY")?;
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("failed to build HTTP client: {e}"))?;
    Ok(Ready {
        client,
        service_id,
        template_id,
        public_key,
    })
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a Confirmation,
}

impl Notifier for EmailJsNotifier {
    fn send(&self, confirmation: &Confirmation) -> Result<(), NotifyError> {
        let ready = self.ready()?;
        debug!(to = %confirmation.to_email, "sending confirmation email");
        let body = SendRequest {
            service_id: &ready.service_id,
            template_id: &ready.template_id,
            user_id: &ready.public_key,
            template_params: confirmation,
        };
        let resp = ready
            .client
            .post(&self.send_url)
            .json(&body)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "EmailJS rejected the send");
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PieType;

    fn confirmation() -> Confirmation {
        Confirmation {
            to_email: "ada@example.com".to_string(),
            to_name: "Ada Lovelace".to_string(),
            pie_type: PieType::Sweet,
            event_date: "Sunday October 5th 2025".to_string(),
        }
    }

    #[test]
    fn missing_credentials_leave_the_notifier_failed() {
        let notifier = EmailJsNotifier::new(
            EmailJsConfig {
                service_id: Some("service".to_string()),
                template_id: None,
                public_key: Some("key".to_string()),
            },
            None,
        );

        let err = notifier.send(&confirmation()).unwrap_err();
        assert_eq!(err, NotifyError::Unavailable("missing EMAILJS_TEMPLATE_ID".to_string()));
        // Stays failed on later sends without re-reading config.
        assert!(matches!(notifier.send(&confirmation()), Err(NotifyError::Unavailable(_))));
        assert!(matches!(*notifier.state.lock().unwrap(), Readiness::Failed(_)));
    }

    #[test]
    fn readiness_lock_is_free_after_resolving() {
        let notifier = EmailJsNotifier::new(
            EmailJsConfig {
                service_id: Some("service".to_string()),
                template_id: Some("template".to_string()),
                public_key: Some("key".to_string()),
            },
            None,
        );

        let ready = notifier.ready().unwrap();
        assert_eq!(ready.template_id, "template");
        // The handle is a copy; the state is not held while it is in use.
        assert!(notifier.state.try_lock().is_ok());
        assert!(matches!(*notifier.state.lock().unwrap(), Readiness::Ready(_)));
    }

    #[test]
    fn send_request_matches_emailjs_shape() {
        let c = confirmation();
        let body = SendRequest {
            service_id: "service_x",
            template_id: "template_y",
            user_id: "public_z",
            template_params: &c,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["user_id"], "public_z");
        assert_eq!(json["template_params"]["to_name"], "Ada Lovelace");
        assert_eq!(json["template_params"]["pie_type"], "sweet");
        assert_eq!(json["template_params"]["event_date"], "Sunday October 5th 2025");
    }
}
