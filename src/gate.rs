//! Shared-password gate in front of the form.
//!
//! A plain equality check against one configured secret. It keeps casual
//! visitors out and nothing more.

use tracing::info;

pub const WRONG_PASSWORD: &str = "Incorrect password. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Open,
}

#[derive(Debug, Clone)]
pub struct PasswordGate {
    secret: String,
    state: GateState,
}

impl PasswordGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            state: GateState::Locked,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == GateState::Open
    }

    /// Try a password. Once open the gate stays open.
    pub fn attempt(&mut self, password: &str) -> Result<(), &'static str> {
        if self.is_open() {
            return Ok(());
        }
        if password == self.secret {
            info!("password accepted");
            self.state = GateState::Open;
            Ok(())
        } else {
            Err(WRONG_PASSWORD)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_on_exact_match_only() {
        let mut gate = PasswordGate::new("pieisgreat");
        assert_eq!(gate.attempt("PieIsGreat"), Err(WRONG_PASSWORD));
        assert_eq!(gate.attempt("pieisgreat "), Err(WRONG_PASSWORD));
        assert_eq!(gate.state(), GateState::Locked);

        assert_eq!(gate.attempt("pieisgreat"), Ok(()));
        assert!(gate.is_open());
        assert_eq!(gate.attempt("anything"), Ok(()));
    }
}
