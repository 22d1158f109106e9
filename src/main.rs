use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get_service;
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

use activity_roster::web::routes;
use activity_roster::{Config, HttpBackend, SignupController};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // 1. Logging
    tracing_subscriber::fmt::init();

    // 2. Upstream roster backend
    let config = Config::from_env();
    info!("Using roster backend at {}", config.api_url);
    let backend = HttpBackend::new(config.api_url.clone());
    let controller = Arc::new(SignupController::new(backend, config.signup.clone()));

    // 3. Application
    let app = routes::router(controller)
        .nest_service(
            "/assets",
            get_service(ServeDir::new("assets")).layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new());

    // 4. Serve, falling back to the next port when the configured one is taken
    let addr = bind_addr(&config.host, config.port)?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback = bind_addr(&config.host, config.port.saturating_add(1))?;
            warn!("Could not bind {}: {}. Trying {}", addr, e, fallback);
            tokio::net::TcpListener::bind(fallback).await?
        }
    };

    info!("Serving activities on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

fn bind_addr(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    format!("{}:{}", host, port).parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid bind address {}:{}: {}", host, port, e),
        )
    })
}
