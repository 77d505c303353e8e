// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{health, quiz},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Quiz routes require a student session (auth first, then role check).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (attempt store, draft cache, config).
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// peer address is available as a fallback for client identification.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start_quiz))
        .route("/submit", post(quiz::submit_quiz))
        .route("/draft", post(quiz::save_draft).get(quiz::get_draft))
        // Layers run outside in: auth_middleware, then student_middleware
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/quiz", quiz_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
