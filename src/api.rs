//! Read-only JSON API over the notification store.
//!
//! # Routes
//!
//! | Path | Serves |
//! |------|--------|
//! | `/fetch-notifications` | JKPSC partition |
//! | `/fetch-jkssb-notifications` | JKSSB partition |
//! | `/fetch-jkbopee-notifications` | JKBOPEE partition |
//! | `/` | pre-built front-end entry page |
//!
//! Handlers only ever read the store. Scraping happens exclusively in the
//! scheduler, so a failing source shows up here as stale data, never as an
//! error. Storage failures are reported as `500` and never masked as an
//! empty list.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::StorageError;
use crate::models::NotificationsResponse;
use crate::sources::Source;
use crate::store::Store;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub index_page: Arc<PathBuf>,
}

impl AppState {
    pub fn new(store: Arc<Store>, index_page: PathBuf) -> Self {
        Self {
            store,
            index_page: Arc::new(index_page),
        }
    }
}

/// Storage failure surfaced to an API caller.
#[derive(Debug)]
pub struct ApiError(StorageError);

impl From<StorageError> for ApiError {
    fn from(value: StorageError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Failed to read notifications");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "notification storage is unavailable" })),
        )
            .into_response()
    }
}

/// Build the router: one route per source plus the entry page.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new().route("/", get(index));
    for source in Source::ALL {
        router = router.route(
            source.route(),
            get(move |State(state): State<AppState>| list_notifications(state, source)),
        );
    }
    router.with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> io::Result<()> {
    info!(addr = %listener.local_addr()?, "API server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[instrument(level = "info", skip(state))]
async fn list_notifications(
    state: AppState,
    source: Source,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let store = Arc::clone(&state.store);
    let notifications = tokio::task::spawn_blocking(move || store.read_all(source))
        .await
        .map_err(|e| StorageError::Task(e.to_string()))??;
    debug!(count = notifications.len(), "Serving notifications");
    Ok(Json(NotificationsResponse { notifications }))
}

async fn index(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(state.index_page.as_path()).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            warn!(path = %state.index_page.display(), error = %e, "Entry page unavailable");
            (StatusCode::NOT_FOUND, "front-end entry page is not installed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationRecord;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use rusqlite::Connection;
    use tower::ServiceExt;

    fn state_with(store: Store) -> AppState {
        AppState::new(Arc::new(store), PathBuf::from("does/not/exist.html"))
    }

    async fn get_json(app: Router, path: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_empty_partition_returns_empty_list() {
        let app = router(state_with(Store::open_in_memory().unwrap()));
        for source in Source::ALL {
            let (status, body) = get_json(app.clone(), source.route()).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "notifications": [] }));
        }
    }

    #[tokio::test]
    async fn test_each_route_serves_its_own_partition() {
        let store = Store::open_in_memory().unwrap();
        store
            .append(
                Source::Jkssb,
                &[
                    NotificationRecord::new("Advertisement Notice No. 03 of 2026", "https://jkssb.nic.in/advt-03.pdf"),
                    NotificationRecord::new("How to apply online", "https://jkssb.nic.in/apply.html"),
                ],
            )
            .unwrap();
        let app = router(state_with(store));

        let (status, body) = get_json(app.clone(), "/fetch-jkssb-notifications").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "notifications": [
                    {"title": "Advertisement Notice No. 03 of 2026", "url": "https://jkssb.nic.in/advt-03.pdf"},
                    {"title": "How to apply online", "url": "https://jkssb.nic.in/apply.html"}
                ]
            })
        );

        let (_, jkpsc) = get_json(app, "/fetch-notifications").await;
        assert_eq!(jkpsc, json!({ "notifications": [] }));
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        Connection::open(dir.path().join("jkbopee_data.db"))
            .unwrap()
            .execute_batch("DROP TABLE notifications;")
            .unwrap();
        let app = router(state_with(store));

        let (status, body) = get_json(app.clone(), "/fetch-jkbopee-notifications").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("error").is_some());

        let (status, _) = get_json(app, "/fetch-jkssb-notifications").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_page() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.html");
        std::fs::write(&page, "<h1>J&amp;K Recruitment</h1>").unwrap();
        let store = Arc::new(Store::open_in_memory().unwrap());

        let app = router(AppState::new(Arc::clone(&store), page));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>J&amp;K Recruitment</h1>");

        let missing = router(AppState::new(store, dir.path().join("absent.html")));
        let response = missing
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = router(state_with(Store::open_in_memory().unwrap()));
        let response = app
            .oneshot(Request::builder().uri("/fetch-upsc-notifications").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
