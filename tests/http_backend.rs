use std::collections::HashMap;
use std::net::SocketAddr;

use activity_roster::{BackendError, HttpBackend, RosterBackend};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock upstream");
    });
    addr
}

async fn signup(
    Path(activity): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let email = query.get("email").cloned().unwrap_or_default();
    if activity != "Chess Club" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Activity not found" })),
        );
    }
    if email == "michael@mergington.edu" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Student already signed up" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "message": format!("Signed up {} for {}", email, activity) })),
    )
}

async fn remove(
    Path(activity): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let email = query.get("email").cloned().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({ "message": format!("Removed {} from {}", email, activity) })),
    )
}

async fn json_signup(Json(body): Json<Value>) -> StatusCode {
    if body.get("activityId") == Some(&json!("chess")) {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

fn upstream() -> Router {
    Router::new()
        .route(
            "/activities",
            get(|| async {
                Json(json!({
                    "Chess Club": { "max_participants": 12, "participants": ["a@x.com"] }
                }))
            }),
        )
        .route(
            "/activities.json",
            get(|| async { Json(json!([{ "id": "chess", "capacity": "3" }])) }),
        )
        .route("/activities/:activity/signup", post(signup))
        .route("/activities/:activity/participants", delete(remove))
        .route("/signup", post(json_signup))
        .route(
            "/signup-broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database is down") }),
        )
        .route(
            "/signup-silent",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        )
}

fn backend(addr: SocketAddr) -> HttpBackend {
    HttpBackend::new(format!("http://{}", addr))
}

#[tokio::test]
async fn fetches_both_roster_shapes() {
    let addr = spawn_upstream(upstream()).await;
    let backend = backend(addr);

    let activities = backend.fetch_activities().await.expect("activities");
    assert_eq!(activities["Chess Club"]["max_participants"], json!(12));

    let loose = backend.fetch_loose_activities().await.expect("loose");
    assert_eq!(loose, json!([{ "id": "chess", "capacity": "3" }]));
}

#[tokio::test]
async fn non_object_activities_body_becomes_empty_roster() {
    let app = Router::new().route("/activities", get(|| async { Json(json!([1, 2, 3])) }));
    let addr = spawn_upstream(app).await;

    let activities = backend(addr).fetch_activities().await.expect("activities");
    assert!(activities.is_empty());
}

#[tokio::test]
async fn form_signup_encodes_name_and_email() {
    let addr = spawn_upstream(upstream()).await;

    let message = backend(addr)
        .signup_by_email("Chess Club", "new+kid@mergington.edu")
        .await
        .expect("signup");
    assert_eq!(message, "Signed up new+kid@mergington.edu for Chess Club");
}

#[tokio::test]
async fn form_signup_rejection_carries_detail() {
    let addr = spawn_upstream(upstream()).await;

    let err = backend(addr)
        .signup_by_email("Chess Club", "michael@mergington.edu")
        .await
        .expect_err("already signed up");
    match err {
        BackendError::Rejected { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "Student already signed up");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn card_signup_posts_activity_id() {
    let addr = spawn_upstream(upstream()).await;
    let backend = backend(addr);

    backend.signup_by_id("/signup", "chess").await.expect("signup");
    let err = backend
        .signup_by_id("/signup", "drama")
        .await
        .expect_err("unknown id");
    assert!(err.is_rejection());
}

#[tokio::test]
async fn card_signup_failure_uses_body_then_status_text() {
    let addr = spawn_upstream(upstream()).await;
    let backend = backend(addr);

    let err = backend
        .signup_by_id("/signup-broken", "chess")
        .await
        .expect_err("500");
    assert!(matches!(
        err,
        BackendError::Rejected { status: 500, ref detail } if detail == "database is down"
    ));

    let err = backend
        .signup_by_id("/signup-silent", "chess")
        .await
        .expect_err("503");
    assert!(matches!(
        err,
        BackendError::Rejected { status: 503, ref detail } if detail == "Service Unavailable"
    ));
}

#[tokio::test]
async fn remove_participant_returns_message() {
    let addr = spawn_upstream(upstream()).await;

    let message = backend(addr)
        .remove_participant("Chess Club", "a@x.com")
        .await
        .expect("remove");
    assert_eq!(message, "Removed a@x.com from Chess Club");
}

#[tokio::test]
async fn closed_port_is_a_network_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = backend(addr)
        .fetch_activities()
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, BackendError::Network(_)));
}
