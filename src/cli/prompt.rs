//! Line-oriented prompts for the non-TUI commands.

use std::io::{self, BufRead, Write};

use crate::error::AppError;
use crate::gate::PasswordGate;

/// How many wrong passwords `register` tolerates before giving up.
const MAX_ATTEMPTS: usize = 3;

/// Open `gate`, either with the password given on the command line or by
/// prompting on stdin.
pub fn open_gate(gate: &mut PasswordGate, given: Option<&str>) -> Result<(), AppError> {
    if let Some(password) = given {
        return gate
            .attempt(password)
            .map_err(|msg| AppError::new(3, msg));
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    open_gate_from(gate, &mut input, &mut out)
}

fn open_gate_from(gate: &mut PasswordGate, input: &mut impl BufRead, out: &mut impl Write) -> Result<(), AppError> {
    for _ in 0..MAX_ATTEMPTS {
        write!(out, "Password: ")
            .and_then(|_| out.flush())
            .map_err(|e| AppError::new(4, format!("Failed to write prompt: {e}")))?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(4, format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::new(2, "No password received. Pass one with --password."));
        }

        match gate.attempt(line.trim_end_matches(['\r', '\n'])) {
            Ok(()) => return Ok(()),
            Err(msg) => {
                writeln!(out, "{msg}").map_err(|e| AppError::new(4, format!("Failed to write prompt: {e}")))?;
            }
        }
    }
    Err(AppError::new(3, "Too many incorrect passwords."))
}
