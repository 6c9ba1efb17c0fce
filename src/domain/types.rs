//! Shared domain types.
//!
//! Wire-facing types use camelCase field names so they match the Membership
//! Store's JSON without per-call mapping.

use serde::{Deserialize, Serialize};

use crate::error::FormError;

/// Category a registrant is asked to bring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieType {
    Sweet,
    /// Older sheet rows carry the British spelling.
    #[serde(alias = "savoury")]
    Savory,
}

impl PieType {
    pub fn as_str(self) -> &'static str {
        match self {
            PieType::Sweet => "sweet",
            PieType::Savory => "savory",
        }
    }
}

impl std::fmt::Display for PieType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Someone filling in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registrant {
    pub first_name: String,
    pub last_name: String,
    /// Natural key; compared as an exact string.
    pub email: String,
}

impl Registrant {
    /// Build a registrant from raw form input.
    ///
    /// Surrounding whitespace is trimmed. All three fields are required and
    /// the email must at least look like one.
    pub fn from_form(first_name: &str, last_name: &str, email: &str) -> Result<Self, FormError> {
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        let email = email.trim();

        if first_name.is_empty() {
            return Err(FormError::Missing("first name"));
        }
        if last_name.is_empty() {
            return Err(FormError::Missing("last name"));
        }
        if email.is_empty() {
            return Err(FormError::Missing("email"));
        }
        if !looks_like_email(email) {
            return Err(FormError::InvalidEmail(email.to_string()));
        }

        Ok(Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace),
        None => false,
    }
}

/// Snapshot of how many registrants hold each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTally {
    pub sweet_count: u64,
    pub savory_count: u64,
}

/// Decoded `checkEmail` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLookup {
    pub exists: bool,
    /// Kept as the raw stored string so it can be shown back verbatim.
    #[serde(default)]
    pub pie_type: Option<String>,
}

/// Row appended to the Membership Store for a new registrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pie_type: PieType,
    pub event_date: String,
}

impl RegistrationRecord {
    pub fn new(registrant: &Registrant, pie_type: PieType, event_date: &str) -> Self {
        Self {
            first_name: registrant.first_name.clone(),
            last_name: registrant.last_name.clone(),
            email: registrant.email.clone(),
            pie_type,
            event_date: event_date.to_string(),
        }
    }
}

/// Payload handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub to_email: String,
    pub to_name: String,
    pub pie_type: PieType,
    pub event_date: String,
}

impl Confirmation {
    pub fn new(registrant: &Registrant, pie_type: PieType, event_date: &str) -> Self {
        Self {
            to_email: registrant.email.clone(),
            to_name: registrant.full_name(),
            pie_type,
            event_date: event_date.to_string(),
        }
    }
}
