//! Membership Store: the spreadsheet-backed web app that holds registrations.

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{CategoryTally, EmailLookup, RegistrationRecord};
use crate::error::{AppError, CollaboratorError};

/// How many characters of a raw body end up in debug logs.
const BODY_PREVIEW: usize = 100;

/// Remote store of registrations, keyed by email.
pub trait MembershipStore: Send + Sync {
    fn check_email(&self, email: &str) -> Result<EmailLookup, CollaboratorError>;

    fn fetch_tally(&self) -> Result<CategoryTally, CollaboratorError>;

    /// Append a record. The store's reply is not interpreted: a completed
    /// round trip is success.
    fn persist(&self, record: &RegistrationRecord) -> Result<(), CollaboratorError>;
}

/// HTTP client for the store's web app endpoint.
pub struct SheetClient {
    client: Client,
    base_url: String,
}

impl SheetClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<std::time::Duration>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build store HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn get_text(&self, query: &[(&str, &str)]) -> Result<String, CollaboratorError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(query)
            .send()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;
        read_body(resp)
    }
}

fn read_body(resp: Response) -> Result<String, CollaboratorError> {
    let status = resp.status();
    debug!(status = status.as_u16(), url = %resp.url(), "store responded");
    if !status.is_success() {
        return Err(CollaboratorError::Status(status.as_u16()));
    }
    resp.text()
        .map_err(|e| CollaboratorError::Transport(format!("failed to read body: {e}")))
}

impl MembershipStore for SheetClient {
    fn check_email(&self, email: &str) -> Result<EmailLookup, CollaboratorError> {
        debug!(email, "checking whether email is registered");
        let body = self.get_text(&[("action", "checkEmail"), ("email", email)])?;
        parse_json_body(&body)
    }

    fn fetch_tally(&self) -> Result<CategoryTally, CollaboratorError> {
        let body = self.get_text(&[("action", "getPieCounts")])?;
        parse_json_body(&body)
    }

    fn persist(&self, record: &RegistrationRecord) -> Result<(), CollaboratorError> {
        debug!(email = %record.email, pie = %record.pie_type, "saving registration");
        let resp = self
            .client
            .post(&self.base_url)
            .json(record)
            .send()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;
        debug!(status = resp.status().as_u16(), "registration sent");
        Ok(())
    }
}

/// Decode a store reply.
///
/// The web app answers with an HTML page (sign-in, redirect, error page)
/// when something is off on its side; that is reported separately from JSON
/// that does not match the expected shape.
pub fn parse_json_body<T: DeserializeOwned>(body: &str) -> Result<T, CollaboratorError> {
    let trimmed = body.trim();
    debug!(len = body.len(), preview = %preview(trimmed), "store body");

    if trimmed.starts_with('<') {
        return Err(CollaboratorError::UnexpectedContent(
            "got an HTML page instead of JSON".to_string(),
        ));
    }

    serde_json::from_str(trimmed).map_err(|e| CollaboratorError::Malformed(e.to_string()))
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
