pub mod config;
pub mod models;
pub mod services;
pub mod web;

pub use config::{Config, RosterSource, SignupSettings};
pub use services::backend_service::{BackendError, HttpBackend, RosterBackend};
pub use services::roster_service::{Roster, RosterEntry};
pub use services::signup_service::{ClickOutcome, FormOutcome, SignupController};
