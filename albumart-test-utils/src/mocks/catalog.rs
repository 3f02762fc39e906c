//! Mock implementation of CatalogApi for testing

use albumart_core::catalog::CatalogApi;
use albumart_core::error::{CatalogError, Result};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted reply for a `(track, artist)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Every search returns this image URL
    Found(String),
    /// Every search succeeds without an image
    NotFound,
    /// The first search has no image, later ones return the URL
    NotFoundThenFound(String),
    /// Every search fails with this HTTP status
    HttpError(u16),
    /// Every search fails because the response body is not JSON
    Malformed,
}

/// Mock catalog for testing the enricher and batch processor
///
/// # Examples
///
/// ```rust,no_run
/// use albumart_test_utils::{MockCatalog, MockResponse};
/// use albumart_core::catalog::CatalogApi;
///
/// # async fn example() -> albumart_core::Result<()> {
/// let mock = MockCatalog::new();
/// mock.expect_track("Nude", "Radiohead", MockResponse::Found("https://img/x.jpg".into()));
///
/// let url = mock.search_track("Nude", "Radiohead").await?;
/// assert_eq!(url.as_deref(), Some("https://img/x.jpg"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MockCatalog {
    behavior: Arc<Mutex<MockBehavior>>,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct MockBehavior {
    responses: HashMap<(String, String), MockResponse>,
    default_response: Option<MockResponse>,
    attempts: HashMap<(String, String), usize>,
    delay: Option<(u64, u64)>,
    fail_auth: bool,
}

#[derive(Debug, Default)]
struct Counters {
    token_calls: AtomicUsize,
    search_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockCatalog {
    /// Create a mock where every unknown track is not found
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for a specific track and artist
    pub fn expect_track(&self, track_name: &str, artist_name: &str, response: MockResponse) {
        self.with_behavior(|behavior| {
            behavior
                .responses
                .insert((track_name.to_string(), artist_name.to_string()), response);
        });
    }

    /// Reply used for tracks without a scripted response
    pub fn expect_default(&self, response: MockResponse) {
        self.with_behavior(|behavior| behavior.default_response = Some(response));
    }

    /// Make every token request fail
    pub fn expect_auth_failure(&self) {
        self.with_behavior(|behavior| behavior.fail_auth = true);
    }

    /// Sleep a random number of milliseconds in `min..=max` on every search
    pub fn with_random_delay(&self, min_ms: u64, max_ms: u64) {
        self.with_behavior(|behavior| behavior.delay = Some((min_ms, max_ms.max(min_ms))));
    }

    pub fn token_calls(&self) -> usize {
        self.counters.token_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.counters.search_calls.load(Ordering::SeqCst)
    }

    /// Highest number of searches observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    /// Searches made so far for one track and artist
    pub fn attempts_for(&self, track_name: &str, artist_name: &str) -> usize {
        self.behavior
            .lock()
            .ok()
            .and_then(|behavior| {
                behavior
                    .attempts
                    .get(&(track_name.to_string(), artist_name.to_string()))
                    .copied()
            })
            .unwrap_or(0)
    }

    fn with_behavior(&self, update: impl FnOnce(&mut MockBehavior)) {
        if let Ok(mut behavior) = self.behavior.lock() {
            update(&mut behavior);
        }
    }

    /// Resolve the scripted reply and bump the attempt counter
    fn next_reply(&self, track_name: &str, artist_name: &str) -> (Result<Option<String>>, Option<Duration>) {
        let Ok(mut behavior) = self.behavior.lock() else {
            return (Err(CatalogError::network("mock poisoned").into()), None);
        };

        let key = (track_name.to_string(), artist_name.to_string());
        let attempt = {
            let counter = behavior.attempts.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };

        let response = behavior
            .responses
            .get(&key)
            .or(behavior.default_response.as_ref())
            .cloned()
            .unwrap_or(MockResponse::NotFound);

        let reply = match response {
            MockResponse::Found(url) => Ok(Some(url)),
            MockResponse::NotFound => Ok(None),
            MockResponse::NotFoundThenFound(url) if attempt > 1 => Ok(Some(url)),
            MockResponse::NotFoundThenFound(_) => Ok(None),
            MockResponse::HttpError(status) => {
                Err(CatalogError::search(status, "mock error").into())
            }
            MockResponse::Malformed => {
                Err(CatalogError::malformed("expected value at line 1 column 1").into())
            }
        };

        let delay = behavior
            .delay
            .map(|(min, max)| Duration::from_millis(rand::rng().random_range(min..=max)));

        (reply, delay)
    }
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn obtain_token(&self) -> Result<String> {
        self.counters.token_calls.fetch_add(1, Ordering::SeqCst);
        let fail_auth = self
            .behavior
            .lock()
            .map(|behavior| behavior.fail_auth)
            .unwrap_or(false);
        if fail_auth {
            return Err(CatalogError::auth("token response has no access_token").into());
        }
        Ok("mock-token".to_string())
    }

    async fn search_track(&self, track_name: &str, artist_name: &str) -> Result<Option<String>> {
        self.obtain_token().await?;
        self.counters.search_calls.fetch_add(1, Ordering::SeqCst);

        let current = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let (reply, delay) = self.next_reply(track_name, artist_name);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}
