//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - builds the session from the environment
//! - runs the chosen front-end

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{CheckArgs, Command, RegisterArgs};
use crate::coordinator::{DuplicateCheck, SubmissionState, check_duplicate};
use crate::domain::Registrant;
use crate::error::AppError;

pub mod session;

use session::Session;

/// Entry point for the `pies` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();

    // `pies` on its own opens the form, like `pies tui`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let session = Session::from_env()?;
    match cli.command {
        Command::Tui => crate::tui::run(&session),
        Command::Register(args) => handle_register(&session, args),
        Command::Check(args) => handle_check(&session, args),
        Command::Counts => handle_counts(&session),
    }
}

/// Logs go to stderr so they never interleave with the TUI's screen.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_register(session: &Session, args: RegisterArgs) -> Result<(), AppError> {
    let mut gate = session.gate();
    crate::cli::prompt::open_gate(&mut gate, args.password.as_deref())?;

    let registrant = Registrant::from_form(&args.first_name, &args.last_name, &args.email)
        .map_err(|e| AppError::new(2, e.to_string()))?;

    let mut coordinator = session.coordinator();
    let events = coordinator.subscribe();
    let submission = coordinator
        .submit(&registrant)
        .map_err(|e| AppError::new(4, e.to_string()))?;

    if let Some(line) = crate::report::result_line(&submission.state) {
        println!("{line}");
    }

    // Keep the process alive until the background deliveries are done.
    if let Some(delivery) = submission.delivery {
        delivery.wait();
    }
    for event in events.try_iter() {
        if let Some(alert) = crate::report::event_alert(&event) {
            println!("{alert}");
        }
    }

    match submission.state {
        SubmissionState::ErrorShown => Err(AppError::new(4, crate::report::RETRY_PROMPT)),
        _ => Ok(()),
    }
}

fn handle_check(session: &Session, args: CheckArgs) -> Result<(), AppError> {
    match check_duplicate(session.store.as_ref(), args.email.trim()) {
        DuplicateCheck::Found(prior) => println!("{}: registered ({prior})", args.email.trim()),
        DuplicateCheck::NotFound => println!("{}: not registered", args.email.trim()),
        DuplicateCheck::Indeterminate(reason) => {
            println!("{}: unknown, store did not answer ({reason})", args.email.trim())
        }
    }
    Ok(())
}

fn handle_counts(session: &Session) -> Result<(), AppError> {
    let tally = session
        .store
        .fetch_tally()
        .map_err(|e| AppError::new(4, format!("Failed to read pie counts: {e}")))?;
    println!("sweet:  {}", tally.sweet_count);
    println!("savory: {}", tally.savory_count);
    println!("next:   {}", crate::coordinator::balance(tally));
    Ok(())
}

/// Rewrite argv so a bare `pies` becomes `pies tui`. Anything else is
/// passed through unchanged.
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    if argv.len() <= 1 {
        argv.push("tui".to_string());
    }
    argv
}
