//! Runtime configuration from the environment (and an optional `.env`).

use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::error::AppError;

const DEFAULT_GATE_PASSWORD: &str = "pieisgreat";
const DEFAULT_EVENT_DATE: &str = "2025-10-05";

/// EmailJS credentials. Any of them may be missing; the notifier then
/// reports itself as unavailable instead of failing startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailJsConfig {
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store_url: String,
    pub gate_password: String,
    pub event_date: NaiveDate,
    pub http_timeout: Option<Duration>,
    pub emailjs: EmailJsConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store_url = var("PIES_STORE_URL")
            .ok_or_else(|| AppError::new(2, "Missing PIES_STORE_URL in environment (.env)."))?;

        let gate_password = var("PIES_GATE_PASSWORD").unwrap_or_else(|| {
            info!("PIES_GATE_PASSWORD not set, using the built-in password");
            DEFAULT_GATE_PASSWORD.to_string()
        });

        let raw_date = var("PIES_EVENT_DATE").unwrap_or_else(|| DEFAULT_EVENT_DATE.to_string());
        let event_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|e| {
            AppError::new(2, format!("Invalid PIES_EVENT_DATE '{raw_date}' (expected YYYY-MM-DD): {e}"))
        })?;

        let http_timeout = match var("PIES_HTTP_TIMEOUT_SECS") {
            None => None,
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    AppError::new(2, format!("Invalid PIES_HTTP_TIMEOUT_SECS '{raw}': {e}"))
                })?;
                Some(Duration::from_secs(secs))
            }
        };

        let emailjs = EmailJsConfig {
            service_id: var("EMAILJS_SERVICE_ID"),
            template_id: var("EMAILJS_TEMPLATE_ID"),
            public_key: var("EMAILJS_PUBLIC_KEY"),
        };
        if emailjs.service_id.is_none() || emailjs.template_id.is_none() || emailjs.public_key.is_none() {
            warn!("EmailJS is not fully configured; confirmation emails will be unavailable");
        }

        Ok(Self {
            store_url,
            gate_password,
            event_date,
            http_timeout,
            emailjs,
        })
    }

    /// Human-readable event date, e.g. `Sunday October 5th 2025`.
    pub fn event_label(&self) -> String {
        event_label(self.event_date)
    }
}

pub fn event_label(date: NaiveDate) -> String {
    let day = date.day();
    format!(
        "{} {} {}{} {}",
        date.format("%A"),
        date.format("%B"),
        day,
        ordinal_suffix(day),
        date.year()
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
