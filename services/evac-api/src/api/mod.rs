//! HTTP API handlers and routing.

pub mod error;
mod evacuations;
mod health;
pub mod request_context;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;

use crate::state::AppState;
use request_context::{MakeRequestUlid, REQUEST_ID_HEADER};

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id,
        )
    });

    Router::new()
        .merge(health::routes())
        .nest("/api", evacuations::routes())
        // Layers run bottom-up: the id is set before tracing sees the request.
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(trace)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUlid))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repositories;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn router() -> Router {
        create_router(AppState::new(Repositories::in_memory()))
    }

    #[tokio::test]
    async fn test_routes_are_mounted_under_api() {
        let response = router()
            .oneshot(
                Request::get("/api/evacuations/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router()
            .oneshot(Request::get("/evacuations/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let response = router()
            .oneshot(Request::get("/api/evacuations/clear").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let response = router()
            .oneshot(Request::get("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(id.to_str().unwrap().starts_with("req_"));
    }
}
