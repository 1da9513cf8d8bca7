use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crewopt_api::config::ServerConfig;
use crewopt_api::engine::dispatcher::CommandDispatcher;
use crewopt_api::engine::registry::JobRegistry;
use crewopt_api::routes;
use crewopt_api::state::AppState;
use crewopt_solver::{SimulatedSolver, Solver};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses a two-base list so `run all` assertions stay small, and the same
/// CORS origin as the dev default.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        crew_bases: vec!["BUR".to_string(), "DAL".to_string()],
        job_history_limit: 8,
        solver_cmd: None,
    }
}

/// App with a fast simulated solver; jobs finish in tens of milliseconds.
pub fn build_test_app() -> Router {
    build_test_app_with_solver(Arc::new(SimulatedSolver::new(3, Duration::from_millis(10))))
}

/// App with a slow simulated solver; jobs stay Running long enough for
/// duplicate-run and `running: true` assertions.
pub fn build_slow_test_app() -> Router {
    build_test_app_with_solver(Arc::new(SimulatedSolver::new(4, Duration::from_millis(250))))
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app_with_solver(solver: Arc<dyn Solver>) -> Router {
    let config = test_config();
    let registry = Arc::new(JobRegistry::new(config.job_history_limit));
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::clone(&registry),
        solver,
        config.crew_bases.clone(),
    ));

    let state = AppState {
        config: Arc::new(config),
        registry,
        dispatcher,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .merge(routes::command::router())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Issue a GET request against the app.
pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// POST a JSON body against the app.
pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Submit one command line and return (status, parsed JSON body).
pub async fn post_command(app: &Router, command: &str) -> (StatusCode, Value) {
    let response = post_json(app, "/command", serde_json::json!({ "command": command })).await;
    let status = response.status();
    let json = body_json(response).await;
    (status, json)
}

/// Collect and parse a JSON response body.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll the status of one key until its job reaches a terminal phase.
pub async fn wait_until_finished(app: &Router, base: &str, seat: &str) -> Value {
    for _ in 0..150 {
        let (_, json) = post_command(app, &format!("status base {base} seat {seat}")).await;
        if json["status"] == "Succeeded" || json["status"] == "Failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job for {base}-{seat} did not finish in time");
}
