use std::time::Duration;

use axum::http::{header, Request, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::handlers::{
    delete_link_handler, get_link_handler, health_handler, list_links_handler, not_found_handler,
    redirect_handler, shorten_handler,
};
use crate::model::ErrorResponse;
use crate::state::AppState;

pub struct App {}

impl App {
    /// The bare routes, without middleware.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .nest(
                "/api",
                Router::new()
                    .route("/shorten", post(shorten_handler))
                    .route("/links", get(list_links_handler))
                    .route(
                        "/links/{slug}",
                        get(get_link_handler).delete(delete_link_handler),
                    ),
            )
            .route("/{slug}", get(redirect_handler))
            .fallback(not_found_handler)
            .with_state(state)
    }

    /// The routes with request tracing and a per-request timeout.
    ///
    /// Error responses produced outside the handlers (timeouts, wrong
    /// methods) get the same JSON body as handler errors.
    pub fn service(state: AppState, request_timeout: Duration) -> Router {
        Self::router(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            ))
            .layer(map_response(json_error_body))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
            )
    }
}

/// Gives a bodiless 4xx/5xx response a JSON `{ "error": .. }` body.
async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let error = status.canonical_reason().unwrap_or("Error").to_string();
    let mut rendered = (status, Json(ErrorResponse { error })).into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        rendered.headers_mut().insert(header::ALLOW, allow.clone());
    }
    rendered
}
