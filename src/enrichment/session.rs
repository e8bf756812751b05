//! Debounced search session
//!
//! Every keystroke bumps a generation counter. A request is issued only if
//! its generation is still current once the debounce window elapses, and its
//! response is published only if the generation is still current when it
//! arrives. Older responses are discarded, never aborted, so the displayed
//! results always belong to the last query issued.

use super::SearchClient;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// What a search interface currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState<R> {
    Idle,
    Loading { query: String },
    Results { query: String, items: Vec<R> },
    Empty { query: String },
    Failed { query: String, message: String },
}

impl<R> SearchState<R> {
    /// Query this state belongs to, if any
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Loading { query }
            | Self::Results { query, .. }
            | Self::Empty { query }
            | Self::Failed { query, .. } => Some(query),
        }
    }
}

pub struct SearchSession<C: SearchClient> {
    client: Arc<C>,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    state_tx: Arc<watch::Sender<SearchState<C::Record>>>,
}

impl<C: SearchClient> SearchSession<C> {
    pub fn new(client: Arc<C>, debounce: Duration) -> Self {
        let (state_tx, _) = watch::channel(SearchState::Idle);
        Self {
            client,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            state_tx: Arc::new(state_tx),
        }
    }

    /// Record a keystroke. Returns the generation assigned to `query`.
    ///
    /// A blank query resets the session to `Idle` without scheduling a
    /// request.
    pub fn input(&self, query: &str) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if query.trim().is_empty() {
            self.state_tx.send_replace(SearchState::Idle);
            return generation;
        }

        let client = self.client.clone();
        let current = self.generation.clone();
        let state_tx = self.state_tx.clone();
        let debounce = self.debounce;
        let query = query.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // Generation checks run inside the watch lock, so a newer
            // keystroke either sees this publish or overwrites it.
            let issued = publish_if_current(&state_tx, &current, generation, || {
                SearchState::Loading {
                    query: query.clone(),
                }
            });
            if !issued {
                return;
            }

            let result = client.search(&query).await;
            let failure = result.as_ref().err().map(|e| e.to_string());
            let published = publish_if_current(&state_tx, &current, generation, || match result {
                Ok(items) if items.is_empty() => SearchState::Empty {
                    query: query.clone(),
                },
                Ok(items) => SearchState::Results {
                    query: query.clone(),
                    items,
                },
                Err(e) => SearchState::Failed {
                    query: query.clone(),
                    message: e.to_string(),
                },
            });

            if !published {
                tracing::debug!(
                    "Discarding stale {} response for {:?} (generation {})",
                    client.name(),
                    query,
                    generation
                );
            } else if let Some(message) = failure {
                tracing::warn!("{} search for {:?} failed: {}", client.name(), query, message);
            }
        });

        generation
    }

    /// Invalidate any pending request and return to `Idle`
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state_tx.send_replace(SearchState::Idle);
    }

    pub fn state(&self) -> SearchState<C::Record> {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState<C::Record>> {
        self.state_tx.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Replace the state with `next()` only while `generation` is current
fn publish_if_current<R>(
    state_tx: &watch::Sender<SearchState<R>>,
    current: &AtomicU64,
    generation: u64,
    next: impl FnOnce() -> SearchState<R>,
) -> bool {
    state_tx.send_if_modified(|state| {
        if current.load(Ordering::SeqCst) != generation {
            return false;
        }
        *state = next();
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Client whose latency and outcome are scripted per query
    #[derive(Default)]
    struct FakeClient {
        delays: HashMap<String, Duration>,
        failing: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn with_delays(delays: &[(&str, u64)]) -> Self {
            Self {
                delays: delays
                    .iter()
                    .map(|(q, ms)| (q.to_string(), Duration::from_millis(*ms)))
                    .collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchClient for FakeClient {
        type Record = String;

        async fn search(&self, query: &str) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push(query.to_string());
            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.iter().any(|q| q == query) {
                return Err(Error::Enrichment("provider down".to_string()));
            }
            if query == "nothing" {
                return Ok(Vec::new());
            }
            Ok(vec![format!("{} result", query)])
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    const DEBOUNCE: Duration = Duration::from_millis(500);

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_is_discarded() {
        let client = Arc::new(FakeClient::with_delays(&[("sp", 300), ("spi", 10)]));
        let session = SearchSession::new(client.clone(), DEBOUNCE);

        session.input("sp");
        // "sp" is issued at t=500 and answers at t=800
        advance(600).await;
        assert_eq!(
            session.state(),
            SearchState::Loading {
                query: "sp".to_string()
            }
        );

        session.input("spi");
        // "sp" answers while "spi" is still debouncing
        advance(350).await;
        assert_eq!(
            session.state(),
            SearchState::Loading {
                query: "sp".to_string()
            }
        );

        advance(300).await;
        assert_eq!(
            session.state(),
            SearchState::Results {
                query: "spi".to_string(),
                items: vec!["spi result".to_string()],
            }
        );
        assert_eq!(client.calls(), vec!["sp", "spi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_responses() {
        // "sp" is slower than "spi" and answers after it
        let client = Arc::new(FakeClient::with_delays(&[("sp", 2000), ("spi", 10)]));
        let session = SearchSession::new(client.clone(), DEBOUNCE);
        let mut rx = session.subscribe();

        session.input("sp");
        advance(600).await;
        session.input("spi");
        advance(3000).await;

        assert_eq!(
            session.state(),
            SearchState::Results {
                query: "spi".to_string(),
                items: vec!["spi result".to_string()],
            }
        );
        assert_eq!(rx.borrow_and_update().query(), Some("spi"));
        assert_eq!(client.calls(), vec!["sp", "spi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_typing_issues_one_request() {
        let client = Arc::new(FakeClient::default());
        let session = SearchSession::new(client.clone(), DEBOUNCE);

        for query in ["i", "in", "inc", "ince", "incep"] {
            session.input(query);
            advance(100).await;
        }
        advance(1000).await;

        assert_eq!(client.calls(), vec!["incep"]);
        assert_eq!(session.generation(), 5);
        assert!(matches!(session.state(), SearchState::Results { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_resets_without_request() {
        let client = Arc::new(FakeClient::default());
        let session = SearchSession::new(client.clone(), DEBOUNCE);

        session.input("dune");
        advance(100).await;
        session.input("   ");
        advance(1000).await;

        assert!(client.calls().is_empty());
        assert_eq!(session.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_and_failed_are_distinct() {
        let client = Arc::new(FakeClient {
            failing: vec!["broken".to_string()],
            ..Default::default()
        });
        let session = SearchSession::new(client.clone(), DEBOUNCE);

        session.input("nothing");
        advance(600).await;
        assert_eq!(
            session.state(),
            SearchState::Empty {
                query: "nothing".to_string()
            }
        );

        session.input("broken");
        advance(600).await;
        match session.state() {
            SearchState::Failed { query, message } => {
                assert_eq!(query, "broken");
                assert!(message.contains("provider down"));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending() {
        let client = Arc::new(FakeClient::with_delays(&[("dune", 200)]));
        let session = SearchSession::new(client.clone(), DEBOUNCE);

        session.input("dune");
        advance(600).await;
        session.cancel();
        advance(500).await;

        assert_eq!(client.calls(), vec!["dune"]);
        assert_eq!(session.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_during_request_stays_idle() {
        let client = Arc::new(FakeClient::with_delays(&[("dune", 200)]));
        let session = SearchSession::new(client.clone(), DEBOUNCE);
        let mut rx = session.subscribe();

        session.input("dune");
        advance(600).await;
        assert!(matches!(session.state(), SearchState::Loading { .. }));

        session.input("");
        assert_eq!(session.state(), SearchState::Idle);
        let _ = rx.borrow_and_update();

        advance(1000).await;
        assert_eq!(session.state(), SearchState::Idle);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(client.calls(), vec!["dune"]);
    }

    #[test]
    fn test_publish_if_current() {
        let (tx, rx) = watch::channel(SearchState::<String>::Idle);
        let current = AtomicU64::new(3);

        let published = publish_if_current(&tx, &current, 2, || SearchState::Loading {
            query: "old".to_string(),
        });
        assert!(!published);
        assert_eq!(*rx.borrow(), SearchState::Idle);
        assert!(!rx.has_changed().unwrap());

        let published = publish_if_current(&tx, &current, 3, || SearchState::Loading {
            query: "new".to_string(),
        });
        assert!(published);
        assert_eq!(rx.borrow().query(), Some("new"));
    }
}
