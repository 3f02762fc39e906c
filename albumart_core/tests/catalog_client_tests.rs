//! CatalogClient tests against a local fake catalog server

use albumart_core::error::CatalogError;
use albumart_core::{CatalogApi, CatalogClient, ClientConfig, Error};
use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// base64("testclient:testsecret")
const EXPECTED_BASIC: &str = "Basic dGVzdGNsaWVudDp0ZXN0c2VjcmV0";

#[derive(Clone, Copy)]
enum TokenMode {
    Issue,
    NoAccessToken,
    Reject,
}

#[derive(Clone)]
struct FakeCatalog {
    token_mode: TokenMode,
    token_hits: Arc<AtomicUsize>,
    search_hits: Arc<AtomicUsize>,
    last_search: Arc<Mutex<Option<(String, HashMap<String, String>)>>>,
}

impl FakeCatalog {
    fn new(token_mode: TokenMode) -> Self {
        Self {
            token_mode,
            token_hits: Arc::new(AtomicUsize::new(0)),
            search_hits: Arc::new(AtomicUsize::new(0)),
            last_search: Arc::new(Mutex::new(None)),
        }
    }
}

async fn token_handler(
    State(fake): State<FakeCatalog>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    fake.token_hits.fetch_add(1, Ordering::SeqCst);

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(EXPECTED_BASIC);
    let grant_ok = form.get("grant_type").map(String::as_str) == Some("client_credentials");
    if !authorized || !grant_ok {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_client"}))).into_response();
    }

    match fake.token_mode {
        TokenMode::Issue => Json(json!({
            "access_token": "fake-token",
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response(),
        TokenMode::NoAccessToken => Json(json!({"token_type": "Bearer"})).into_response(),
        TokenMode::Reject => {
            (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"}))).into_response()
        }
    }
}

async fn search_handler(
    State(fake): State<FakeCatalog>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    fake.search_hits.fetch_add(1, Ordering::SeqCst);

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *fake.last_search.lock().unwrap() = Some((bearer.clone(), params.clone()));

    if bearer != "Bearer fake-token" {
        return (StatusCode::UNAUTHORIZED, "bad token").into_response();
    }

    let q = params.get("q").cloned().unwrap_or_default();
    if q.starts_with("track:Nude ") {
        Json(json!({"tracks": {"items": [
            {"name": "Nude", "album": {"images": [
                {"url": "https://i.scdn.co/image/nude640", "height": 640, "width": 640},
                {"url": "https://i.scdn.co/image/nude300", "height": 300, "width": 300}
            ]}}
        ]}}))
        .into_response()
    } else if q.starts_with("track:Boom ") {
        (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
    } else if q.starts_with("track:Garbage ") {
        (StatusCode::OK, "<html>not json</html>").into_response()
    } else if q.starts_with("track:Bare ") {
        Json(json!({})).into_response()
    } else {
        Json(json!({"tracks": {"items": [], "total": 0}})).into_response()
    }
}

async fn spawn_fake(fake: FakeCatalog) -> String {
    let app = Router::new()
        .route("/api/token", post(token_handler))
        .route("/v1/search", get(search_handler))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client_for(fake: &FakeCatalog) -> CatalogClient {
    let base_url = spawn_fake(fake.clone()).await;
    CatalogClient::from_config(&ClientConfig::test(&base_url)).unwrap()
}

#[tokio::test]
async fn test_obtain_token() {
    let fake = FakeCatalog::new(TokenMode::Issue);
    let client = client_for(&fake).await;

    assert_eq!(client.obtain_token().await.unwrap(), "fake-token");
    assert_eq!(client.obtain_token().await.unwrap(), "fake-token");
    assert_eq!(fake.token_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_access_token_is_auth_error() {
    let fake = FakeCatalog::new(TokenMode::NoAccessToken);
    let client = client_for(&fake).await;

    let err = client.obtain_token().await.unwrap_err();
    assert!(matches!(err, Error::Catalog(CatalogError::Auth { .. })));
}

#[tokio::test]
async fn test_rejected_credentials_is_auth_error() {
    let fake = FakeCatalog::new(TokenMode::Reject);
    let client = client_for(&fake).await;

    let err = client.search_track("Nude", "Radiohead").await.unwrap_err();
    assert!(matches!(err, Error::Catalog(CatalogError::Auth { .. })));
    assert_eq!(fake.search_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_found() {
    let fake = FakeCatalog::new(TokenMode::Issue);
    let client = client_for(&fake).await;

    let url = client.search_track("Nude", "Radiohead").await.unwrap();
    assert_eq!(url.as_deref(), Some("https://i.scdn.co/image/nude640"));

    let (bearer, params) = fake.last_search.lock().unwrap().clone().unwrap();
    assert_eq!(bearer, "Bearer fake-token");
    assert_eq!(params.get("q").map(String::as_str), Some("track:Nude artist:Radiohead"));
    assert_eq!(params.get("type").map(String::as_str), Some("track"));
}

#[tokio::test]
async fn test_search_empty_items_is_none() {
    let fake = FakeCatalog::new(TokenMode::Issue);
    let client = client_for(&fake).await;

    assert_eq!(client.search_track("Unknown", "Nobody").await.unwrap(), None);
    assert_eq!(client.search_track("Bare", "Nobody").await.unwrap(), None);
}

#[tokio::test]
async fn test_search_server_error_carries_status_and_body() {
    let fake = FakeCatalog::new(TokenMode::Issue);
    let client = client_for(&fake).await;

    let err = client.search_track("Boom", "Anyone").await.unwrap_err();
    match err {
        Error::Catalog(CatalogError::Search { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_search_non_json_is_malformed() {
    let fake = FakeCatalog::new(TokenMode::Issue);
    let client = client_for(&fake).await;

    let err = client.search_track("Garbage", "Anyone").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Catalog(CatalogError::MalformedResponse { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_token_fetch_under_concurrency() {
    let fake = FakeCatalog::new(TokenMode::Issue);
    let client = Arc::new(client_for(&fake).await);

    let searches = (0..20).map(|_| {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.search_track("Nude", "Radiohead").await })
    });
    let results = futures::future::join_all(searches).await;

    for result in results {
        assert!(result.unwrap().unwrap().is_some());
    }
    assert_eq!(fake.token_hits.load(Ordering::SeqCst), 1);
    assert_eq!(fake.search_hits.load(Ordering::SeqCst), 20);
}
