use std::env;
use std::time::Duration;

use crate::web::render::ButtonLabels;

/// Where the roster is loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSource {
    /// `GET /activities`, name -> details mapping.
    Activities,
    /// `GET /activities.json`, loose array shape.
    LooseJson,
}

impl RosterSource {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "activities" => Some(RosterSource::Activities),
            "activities.json" | "json" => Some(RosterSource::LooseJson),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignupSettings {
    pub source: RosterSource,
    pub signup_url: String,
    pub labels: ButtonLabels,
    pub message_timeout: Duration,
}

impl Default for SignupSettings {
    fn default() -> Self {
        Self {
            source: RosterSource::Activities,
            signup_url: "/signup".to_string(),
            labels: ButtonLabels::default(),
            message_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_url: String,
    pub signup: SignupSettings,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SignupSettings::default();
        let text = |key: &str, fallback: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback)
        };

        let labels = ButtonLabels {
            signup_text: text("SIGNUP_TEXT", defaults.labels.signup_text.clone()),
            full_text: text("FULL_TEXT", defaults.labels.full_text.clone()),
            processing_text: text("PROCESSING_TEXT", defaults.labels.processing_text.clone()),
            signed_text: text("SIGNED_TEXT", defaults.labels.signed_text.clone()),
            error_text: text("SIGNUP_ERROR_TEXT", defaults.labels.error_text.clone()),
        };

        let message_timeout = lookup("MESSAGE_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.message_timeout);

        Self {
            host: text("HOST", "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(3000),
            api_url: text("ROSTER_API_URL", "http://127.0.0.1:8000".to_string()),
            signup: SignupSettings {
                source: lookup("ROSTER_SOURCE")
                    .and_then(|v| RosterSource::parse(&v))
                    .unwrap_or(defaults.source),
                signup_url: text("SIGNUP_URL", defaults.signup_url.clone()),
                labels,
                message_timeout,
            },
        }
    }
}
