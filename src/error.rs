use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Rejected form input, shown to the person filling in the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill in your {0}.")]
    Missing(&'static str),

    #[error("'{0}' is not a valid email address.")]
    InvalidEmail(String),
}

/// Failure of a call to the Membership Store.
///
/// These never reach the user: every use site converts them into a safe
/// default (see `coordinator::guard` and `coordinator::assign`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    /// The body was not JSON at all, e.g. an HTML sign-in or redirect page.
    #[error("unexpected content: {0}")]
    UnexpectedContent(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Failure of a confirmation send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("email service unavailable: {0}")]
    Unavailable(String),

    #[error("email provider returned status {0}")]
    Status(u16),

    #[error("email request failed: {0}")]
    Transport(String),
}

/// Failure of the coordinator's own control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    #[error("failed to start {task} delivery: {reason}")]
    Dispatch { task: &'static str, reason: String },
}

/// A submit the state machine refused without touching any collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("submit is locked while the form is {0}")]
    Locked(&'static str),
}
