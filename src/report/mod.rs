//! User-facing text: the result line that replaces the form, and the alerts
//! raised by background deliveries.

use crate::coordinator::{RegistrationEvent, SubmissionState};
use crate::error::NotifyError;

pub const RETRY_PROMPT: &str = "Something went wrong. Please try again.";
pub const NOTIFY_OK: &str = "Registration complete! Check your email for confirmation.";

/// The single line shown in place of the form, if any.
pub fn result_line(state: &SubmissionState) -> Option<String> {
    match state {
        SubmissionState::DuplicateShown { prior } => Some(format!("Already Submitted. Your Pie is {prior}.")),
        SubmissionState::AssignedShown { pie } => Some(format!("You are bringing a {pie} pie")),
        SubmissionState::ErrorShown => Some(RETRY_PROMPT.to_string()),
        SubmissionState::Idle | SubmissionState::Submitting => None,
    }
}

/// Alert text for a finished confirmation send.
pub fn notify_alert(result: &Result<(), NotifyError>) -> String {
    match result {
        Ok(()) => NOTIFY_OK.to_string(),
        Err(NotifyError::Unavailable(_)) => "Registration saved! Email service unavailable.".to_string(),
        Err(NotifyError::Status(422)) => {
            "Registration saved! Email template error (422). Check your EmailJS template variables.".to_string()
        }
        Err(NotifyError::Status(400)) => {
            "Registration saved! Bad request (400). Check your service/template IDs.".to_string()
        }
        Err(NotifyError::Status(401)) => {
            "Registration saved! Unauthorized (401). Check your EmailJS public key.".to_string()
        }
        Err(NotifyError::Status(code)) => format!("Registration saved! Email failed to send. Error: {code}"),
        Err(NotifyError::Transport(_)) => "Registration saved! Email failed to send. Error: network".to_string(),
    }
}

/// Alert for an event, if it warrants one.
///
/// Store appends are silent on success; a failed append is surfaced because
/// the registration then only exists on screen and in the email.
pub fn event_alert(event: &RegistrationEvent) -> Option<String> {
    match event {
        RegistrationEvent::Notified(result) => Some(notify_alert(result)),
        RegistrationEvent::Persisted(Err(err)) => Some(format!("Your registration could not be saved: {err}")),
        _ => None,
    }
}
