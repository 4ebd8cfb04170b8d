//! Cross-surface cache revalidation.
//!
//! Mutation resolvers record which web cards and posts they touched into a
//! per-request [`RevalidationCollector`]; after the response for that request
//! has been produced, the collected keys are drained exactly once and posted
//! to the external revalidation endpoint in the background. The response
//! never waits on the outbound call, and delivery is at-most-once,
//! best-effort: a failed call is logged, never retried, and never surfaced
//! to the original caller.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use serde::Serialize;

/// Reference to a post page, `/{userName}/{id}` on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRef {
    pub user_name: String,
    pub id: String,
}

/// One drained batch of cache-invalidation keys, the outbound wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevalidationBatch {
    pub cards: Vec<String>,
    pub posts: Vec<PostRef>,
}

#[derive(Debug, Default)]
struct CollectorInner {
    cards: BTreeSet<String>,
    /// Post id to username. Deduped by id alone; the first write wins on a
    /// conflicting username for the same id.
    posts: BTreeMap<String, String>,
    consumed: bool,
}

/// Per-request collector of entities whose cached pages must be regenerated.
///
/// Resolvers within one request may run from concurrent tasks, so the inner
/// state sits behind a mutex; `add_*` never blocks beyond that lock. A
/// collector moves EMPTY -> POPULATED -> CONSUMED; adds after the drain are
/// a programming error and are rejected with an error log.
#[derive(Debug, Default)]
pub struct RevalidationCollector {
    inner: Mutex<CollectorInner>,
}

impl RevalidationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a web card page for revalidation. Idempotent within a request.
    pub fn add_card(&self, user_name: impl Into<String>) {
        let mut inner = self.inner.lock().expect("collector mutex poisoned");
        if inner.consumed {
            tracing::error!("revalidation add_card after drain, key dropped");
            return;
        }
        inner.cards.insert(user_name.into());
    }

    /// Queue a post page for revalidation. Deduped by post id within a
    /// request.
    pub fn add_post(&self, id: impl Into<String>, user_name: impl Into<String>) {
        let mut inner = self.inner.lock().expect("collector mutex poisoned");
        if inner.consumed {
            tracing::error!("revalidation add_post after drain, key dropped");
            return;
        }
        inner.posts.entry(id.into()).or_insert_with(|| user_name.into());
    }

    /// Consume the collected keys. Returns `None` when nothing was collected
    /// (no outbound call should be made) or when the collector was already
    /// drained.
    pub fn drain(&self) -> Option<RevalidationBatch> {
        let mut inner = self.inner.lock().expect("collector mutex poisoned");
        if inner.consumed {
            tracing::error!("revalidation collector drained twice");
            return None;
        }
        inner.consumed = true;
        if inner.cards.is_empty() && inner.posts.is_empty() {
            return None;
        }
        let cards = std::mem::take(&mut inner.cards).into_iter().collect();
        let posts = std::mem::take(&mut inner.posts)
            .into_iter()
            .map(|(id, user_name)| PostRef { user_name, id })
            .collect();
        Some(RevalidationBatch { cards, posts })
    }
}

/// Client for the external revalidation endpoint.
#[derive(Debug, Clone)]
pub struct RevalidationClient {
    http: reqwest::Client,
    endpoint: Option<String>,
    token: Option<String>,
}

impl RevalidationClient {
    pub fn new(endpoint: Option<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            token,
        }
    }

    /// Drain the collector and, when it holds anything, post the batch from a
    /// background task. Returns immediately; the caller's response must not
    /// wait on cache invalidation.
    pub fn flush_in_background(&self, collector: &RevalidationCollector) {
        let Some(batch) = collector.drain() else {
            return;
        };
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::warn!(
                cards = batch.cards.len(),
                posts = batch.posts.len(),
                "no revalidation endpoint configured, dropping batch"
            );
            return;
        };

        let http = self.http.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            let mut request = http.post(&endpoint).json(&batch);
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(
                        cards = batch.cards.len(),
                        posts = batch.posts.len(),
                        "revalidation batch delivered"
                    );
                }
                Ok(response) => {
                    tracing::error!(
                        status = %response.status(),
                        "revalidation endpoint rejected batch"
                    );
                }
                Err(err) => {
                    tracing::error!(error = %err, "revalidation call failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_adds_are_deduplicated() {
        let collector = RevalidationCollector::new();
        collector.add_card("alice");
        collector.add_card("alice");
        collector.add_card("alice");

        let batch = collector.drain().unwrap();
        assert_eq!(batch.cards, vec!["alice".to_string()]);
        assert!(batch.posts.is_empty());
    }

    #[test]
    fn test_posts_dedupe_by_id_first_write_wins() {
        let collector = RevalidationCollector::new();
        collector.add_post("p1", "bob");
        collector.add_post("p1", "carol");

        let batch = collector.drain().unwrap();
        assert_eq!(
            batch.posts,
            vec![PostRef {
                user_name: "bob".to_string(),
                id: "p1".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_drain_yields_no_batch() {
        let collector = RevalidationCollector::new();
        assert!(collector.drain().is_none());
    }

    #[test]
    fn test_second_drain_yields_nothing() {
        let collector = RevalidationCollector::new();
        collector.add_card("alice");
        assert!(collector.drain().is_some());
        assert!(collector.drain().is_none());
    }

    #[test]
    fn test_adds_after_drain_are_rejected() {
        let collector = RevalidationCollector::new();
        collector.add_card("alice");
        collector.drain();

        collector.add_card("bob");
        collector.add_post("p1", "bob");
        // already consumed; late adds must not resurrect the collector
        assert!(collector.drain().is_none());
    }

    #[test]
    fn test_batch_wire_shape() {
        let collector = RevalidationCollector::new();
        collector.add_card("acme");
        collector.add_post("p1", "acme");

        let batch = collector.drain().unwrap();
        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "cards": ["acme"],
                "posts": [{"userName": "acme", "id": "p1"}]
            })
        );
    }
}
