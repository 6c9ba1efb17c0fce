//! Duplicate-registration guard.

use tracing::{info, warn};

use crate::remote::MembershipStore;

/// Shown when the store says an email exists but does not say with what.
pub const UNKNOWN_PRIOR: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateCheck {
    /// Already registered; carries the stored category exactly as stored.
    Found(String),
    NotFound,
    /// The store could not answer. Handled exactly like `NotFound`.
    Indeterminate(String),
}

impl DuplicateCheck {
    pub fn prior(&self) -> Option<&str> {
        match self {
            DuplicateCheck::Found(prior) => Some(prior.as_str()),
            DuplicateCheck::NotFound | DuplicateCheck::Indeterminate(_) => None,
        }
    }
}

/// Ask the store whether `email` is already registered.
///
/// Store failures never block a registration: they come back as
/// `Indeterminate`, at the cost of a possible duplicate row.
pub fn check_duplicate(store: &dyn MembershipStore, email: &str) -> DuplicateCheck {
    match store.check_email(email) {
        Ok(lookup) if lookup.exists => {
            let prior = lookup.pie_type.unwrap_or_else(|| UNKNOWN_PRIOR.to_string());
            info!(email, prior = %prior, "email already registered");
            DuplicateCheck::Found(prior)
        }
        Ok(_) => DuplicateCheck::NotFound,
        Err(err) => {
            warn!(email, error = %err, "email check failed, proceeding as a new registration");
            DuplicateCheck::Indeterminate(err.to_string())
        }
    }
}
