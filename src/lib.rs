//! `pie-signup` library crate.
//!
//! The binary (`pies`) is a thin wrapper around this library so that:
//!
//! - the registration flow is testable without a terminal or a network
//! - the coordinator can sit behind other front-ends
//! - collaborators are swappable behind their traits

pub mod app;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod gate;
pub mod remote;
pub mod report;
pub mod tui;
