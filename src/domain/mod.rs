//! Domain types used throughout the registration flow.
//!
//! This module defines:
//!
//! - form input (`Registrant`; rejections are `crate::error::FormError`)
//! - the category being balanced (`PieType`) and its running count (`CategoryTally`)
//! - wire payloads for the store and the notifier (`EmailLookup`, `RegistrationRecord`, `Confirmation`)

pub mod types;

pub use types::*;
