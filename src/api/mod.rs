//! Asset Safe REST API
//!
//! HTTP API layer for Asset Safe, built with Axum.
//!
//! # Endpoints
//!
//! ## Assistant
//! - `POST /api/v1/assistant/respond` - Stateless reply
//! - `POST /api/v1/assistant/sessions` - Create a chat session
//! - `GET /api/v1/assistant/sessions/:id` - Session snapshot
//! - `POST /api/v1/assistant/sessions/:id/messages` - Send a message
//! - `POST /api/v1/assistant/sessions/:id/state` - Panel transition
//! - `DELETE /api/v1/assistant/sessions/:id` - End a session
//! - `GET /api/v1/assistant/sessions/:id/ws` - WebSocket stream of the session
//!
//! ## Legal
//! - `POST /api/v1/legal/export` - Render an agreement
//!
//! ## Features
//! - `GET /api/v1/features` - Feature catalog
//! - `POST /api/v1/features/check` - Access decision
//!
//! ## Uploads
//! - `POST /api/v1/uploads` - Upload a file
//! - `POST /api/v1/recordings` - Upload recording chunks
//! - `GET /api/v1/uploads/status/:key` - Request lifecycle state
//! - `GET /api/v1/owners/:owner/attachments` - List attachments
//! - `GET /api/v1/owners/:owner/attachments/:id/signed-url` - Signed URL
//! - `DELETE /api/v1/owners/:owner/attachments/:id` - Delete an attachment
//! - `GET /api/v1/owners/:owner/usage` - Usage report
//! - `GET /api/v1/signed/:token` - Download through a signed URL
//! - `GET /objects/*path` - Download through an attachment's public URL
//!
//! ## Contributors
//! - `POST /api/v1/owners/:owner/contributors` - Invite
//! - `GET /api/v1/owners/:owner/contributors` - List
//! - `DELETE /api/v1/owners/:owner/contributors/:id` - Remove
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,no_run
//! use assetsafe::api::{serve, AppState};
//! use assetsafe::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let state = AppState::from_config(&config)?;
//!     let api_config = state.config.as_ref().clone();
//!
//!     serve(state, &api_config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::websocket::chat_socket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let api_routes = Router::new()
        // Assistant routes
        .route("/assistant/respond", post(routes::assistant::respond))
        .route("/assistant/sessions", post(routes::assistant::create_session))
        .route(
            "/assistant/sessions/:id",
            get(routes::assistant::get_session).delete(routes::assistant::end_session),
        )
        .route(
            "/assistant/sessions/:id/messages",
            post(routes::assistant::send_message),
        )
        .route(
            "/assistant/sessions/:id/state",
            post(routes::assistant::change_state),
        )
        // Legal routes
        .route("/legal/export", post(routes::legal::export_agreement))
        // Feature routes
        .route("/features", get(routes::features::list_features))
        .route("/features/check", post(routes::features::check_feature))
        // Upload routes
        .route("/uploads", post(routes::uploads::upload_file))
        .route("/recordings", post(routes::uploads::upload_recording))
        .route("/uploads/status/:key", get(routes::uploads::request_status))
        .route(
            "/owners/:owner/attachments",
            get(routes::uploads::list_attachments),
        )
        .route(
            "/owners/:owner/attachments/:id",
            axum::routing::delete(routes::uploads::delete_attachment),
        )
        .route(
            "/owners/:owner/attachments/:id/signed-url",
            get(routes::uploads::signed_url),
        )
        .route("/owners/:owner/usage", get(routes::usage::owner_usage))
        .route("/signed/:token", get(routes::uploads::download_signed))
        // Contributor routes
        .route(
            "/owners/:owner/contributors",
            get(routes::contributors::list_contributors)
                .post(routes::contributors::invite_contributor),
        )
        .route(
            "/owners/:owner/contributors/:id",
            axum::routing::delete(routes::contributors::remove_contributor),
        )
        // Uploads arrive base64-encoded, so the limit sits above the file limit
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        // WebSocket route, outside the request timeout
        .route(
            "/assistant/sessions/:id/ws",
            get(chat_socket_handler),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .route("/objects/*path", get(routes::uploads::download_public))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(shared_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Asset Safe API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Asset Safe API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_string_lossy().to_string();

        let state = AppState::from_config(&config).unwrap();
        let router = build_router(state);

        (router, dir)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _dir) = create_test_app();

        let response = app.oneshot(get("/health/live")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _dir) = create_test_app();

        let response = app.oneshot(get("/health/ready")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _dir) = create_test_app();

        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["chat_sessions"], 0);
    }

    #[tokio::test]
    async fn test_respond() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/assistant/respond",
                json!({"text": "Which plan is right for me?"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["text"]
            .as_str()
            .unwrap()
            .contains("Standard (Homeowner) - $12.99/month"));
    }

    #[tokio::test]
    async fn test_respond_empty_text() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json("/api/v1/assistant/respond", json!({"text": "  "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_session_flow() {
        let (app, _dir) = create_test_app();

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/assistant/sessions", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        // Sending while closed is rejected
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/assistant/sessions/{}/messages", id),
                json!({"text": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/assistant/sessions/{}/state", id),
                json!({"action": "open"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["state"], "open");

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/assistant/sessions/{}/messages", id),
                json!({"text": "Which plan is right for me?", "path": "/"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["sender"], "user");
        assert_eq!(body["reply"]["sender"], "bot");

        let response = app
            .clone()
            .oneshot(get(&format!("/api/v1/assistant/sessions/{}", id)))
            .await
            .unwrap();
        let body = body_json(response).await;
        // Greeting, user message, reply
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);

        let response = app
            .clone()
            .oneshot(delete(&format!("/api/v1/assistant/sessions/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(get(&format!("/api/v1/assistant/sessions/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_legal_export_text() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/legal/export",
                json!({
                    "agreement": "nda",
                    "format": "text",
                    "signers": {"discloser": {"name": "Jane Owner"}}
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"asset-safe-nda.txt\""
        );
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("Name: Jane Owner"));
        assert!(text.contains(crate::legal::PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_legal_export_pdf() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/legal/export",
                json!({"agreement": "equity_grant"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert!(body_bytes(response).await.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_legal_export_unknown_role() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/legal/export",
                json!({"agreement": "nda", "signers": {"grantee": {"name": "X"}}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_feature_check() {
        let (app, _dir) = create_test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/features/check",
                json!({"feature": "video_upload", "tier": "basic"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["has_access"], false);
        assert_eq!(body["upgrade_path"], "/pricing");

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/features/check",
                json!({"feature": "video_upload", "is_in_trial": true}),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["has_access"], true);

        let response = app
            .oneshot(post_json(
                "/api/v1/features/check",
                json!({"feature": "teleportation"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_feature_list() {
        let (app, _dir) = create_test_app();

        let response = app.oneshot(get("/api/v1/features")).await.unwrap();

        let body = body_json(response).await;
        assert_eq!(body["features"].as_array().unwrap().len(), 12);
        assert_eq!(body["tiers"][1]["monthly_price_cents"], 1299);
    }

    #[tokio::test]
    async fn test_upload_list_sign_delete() {
        let (app, _dir) = create_test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/uploads",
                json!({
                    "owner_id": "owner-1",
                    "control_key": "kitchen-photo",
                    "file_name": "kitchen.jpg",
                    "content_type": "image/jpeg",
                    "data_base64": "aGVsbG8gd29ybGQ="
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["category"], "photo");
        assert_eq!(body["size_bytes"], 11);
        let id = body["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(get("/api/v1/uploads/status/kitchen-photo"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"]["state"], "success");

        let response = app
            .clone()
            .oneshot(get("/api/v1/owners/owner-1/attachments?category=photo"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["total"], 1);

        let response = app
            .clone()
            .oneshot(get(&format!(
                "/api/v1/owners/owner-1/attachments/{}/signed-url",
                id
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(get(&format!("/api/v1/signed/{}", token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(body_bytes(response).await, b"hello world");

        let response = app
            .clone()
            .oneshot(delete(&format!("/api/v1/owners/owner-1/attachments/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(get("/api/v1/owners/owner-1/attachments"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["total"], 0);
    }

    #[tokio::test]
    async fn test_public_url_serves_the_upload() {
        let (app, _dir) = create_test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/uploads",
                json!({
                    "owner_id": "alice",
                    "control_key": "receipt",
                    "file_name": "tv receipt.pdf",
                    "content_type": "application/pdf",
                    "data_base64": "JVBERg=="
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let public_url = body_json(response).await["public_url"]
            .as_str()
            .unwrap()
            .to_string();
        let start = public_url.find("/objects/").unwrap();

        let response = app
            .clone()
            .oneshot(get(&public_url[start..]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(body_bytes(response).await, b"%PDF");

        let response = app
            .oneshot(get("/objects/alice/photo/missing.jpg"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_owner_with_separator() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/uploads",
                json!({
                    "owner_id": "org/alice",
                    "control_key": "c",
                    "file_name": "a.jpg",
                    "content_type": "image/jpeg",
                    "data_base64": "aGVsbG8="
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_invalid_base64() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/uploads",
                json!({
                    "owner_id": "owner-1",
                    "control_key": "c",
                    "file_name": "a.jpg",
                    "content_type": "image/jpeg",
                    "data_base64": "%%%"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recording_upload() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/recordings",
                json!({
                    "owner_id": "owner-1",
                    "control_key": "voice-note",
                    "file_name": "note.webm",
                    "content_type": "audio/webm",
                    "chunks_base64": ["aGVs", "", "bG8="]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["category"], "audio");
        assert_eq!(body["size_bytes"], 5);
    }

    #[tokio::test]
    async fn test_usage() {
        let (app, _dir) = create_test_app();

        let response = app
            .clone()
            .oneshot(get("/api/v1/owners/owner-1/usage?tier=premium"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["used_bytes"], 0);
        assert_eq!(body["categories"].as_array().unwrap().len(), 5);

        let response = app
            .oneshot(get("/api/v1/owners/owner-1/usage?tier=gold"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_contributor_invite_twice() {
        let (app, _dir) = create_test_app();
        let invite = json!({"email": "Sam@Example.com", "role": "contributor"});

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/owners/owner-1/contributors", invite.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/owners/owner-1/contributors",
                json!({"email": "sam@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "DUPLICATE");
        assert_eq!(
            body["error"]["message"],
            "This person has already been invited"
        );

        let response = app
            .clone()
            .oneshot(get("/api/v1/owners/owner-1/contributors"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["total"], 1);

        let response = app
            .clone()
            .oneshot(delete(&format!("/api/v1/owners/owner-1/contributors/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(delete(&format!("/api/v1/owners/owner-1/contributors/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_contributor_invalid_email() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/owners/owner-1/contributors",
                json!({"email": "not-an-email"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ws_unknown_session() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(get("/api/v1/assistant/sessions/missing/ws"))
            .await
            .unwrap();

        // Not an upgrade request, so the extractor rejects it before the lookup
        assert!(response.status().is_client_error());
    }
}
