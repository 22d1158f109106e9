use std::sync::Arc;

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::services::backend_service::RosterBackend;
use crate::services::signup_service::SignupController;

pub mod activities;
pub mod signup;

/// Page and signup routes; static files and layers are added by the binary.
pub fn router<B: RosterBackend>(controller: Arc<SignupController<B>>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/activities") }))
        .route("/activities", get(activities::activities_handler::<B>))
        .route("/cards/:activity_id", get(activities::card_handler::<B>))
        .route(
            "/cards/:activity_id/signup",
            post(signup::card_signup_handler::<B>),
        )
        .route("/signup-form", post(signup::signup_form_handler::<B>))
        .route("/unregister", post(signup::unregister_handler::<B>))
        .with_state(controller)
}
