use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};

use super::activities::render_page;
use crate::models::SignupForm;
use crate::services::backend_service::RosterBackend;
use crate::services::signup_service::{ClickOutcome, SignupController};

pub async fn card_signup_handler<B: RosterBackend>(
    State(controller): State<Arc<SignupController<B>>>,
    Path(activity_id): Path<String>,
) -> Response {
    if controller.click(&activity_id).await == ClickOutcome::UnknownActivity {
        return StatusCode::NOT_FOUND.into_response();
    }
    render_page(&controller).await
}

pub async fn signup_form_handler<B: RosterBackend>(
    State(controller): State<Arc<SignupController<B>>>,
    Form(form): Form<SignupForm>,
) -> Response {
    controller.submit_form(form).await;
    render_page(&controller).await
}

pub async fn unregister_handler<B: RosterBackend>(
    State(controller): State<Arc<SignupController<B>>>,
    Form(form): Form<SignupForm>,
) -> Response {
    controller.unregister(form).await;
    render_page(&controller).await
}
