use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::services::backend_service::RosterBackend;
use crate::services::signup_service::SignupController;

/// A page load is a full reload: the roster is fetched again and every
/// signup control starts over.
pub async fn activities_handler<B: RosterBackend>(
    State(controller): State<Arc<SignupController<B>>>,
) -> Response {
    if let Err(e) = controller.load().await {
        error!("Error fetching activities: {}", e);
    }
    render_page(&controller).await
}

pub async fn card_handler<B: RosterBackend>(
    State(controller): State<Arc<SignupController<B>>>,
    Path(activity_id): Path<String>,
) -> Response {
    match controller.render_card(&activity_id).await {
        Some(Ok(html)) => Html(html).into_response(),
        Some(Err(e)) => {
            error!("Card render failed for {}: {}", activity_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub(crate) async fn render_page<B: RosterBackend>(controller: &SignupController<B>) -> Response {
    match controller.render_page().await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Page render failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong while rendering the page.",
            )
                .into_response()
        }
    }
}
