//! Per-session results
//!
//! Each session keeps the outcome of its latest submission: either the
//! analysis to show on the results page, or a one-shot message explaining why
//! the last submission failed. Entries live in a bounded moka cache and expire
//! after the configured TTL.

use moka::future::Cache;
use safelens_core::{AnalysisRecord, FlowState, SessionConfig};
use safelens_infra::SessionId;

/// What a session remembers between requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    pub flow: FlowState,
    pub record: Option<AnalysisRecord>,
    pub flash: Option<String>,
}

#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<SessionId, SessionData>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, session: &SessionId) -> SessionData {
        self.cache.get(session).await.unwrap_or_default()
    }

    pub async fn flow_state(&self, session: &SessionId) -> FlowState {
        self.get(session).await.flow
    }

    /// The analysis shown on the results page, if any
    pub async fn result(&self, session: &SessionId) -> Option<AnalysisRecord> {
        self.get(session).await.record
    }

    /// Store a fresh analysis, replacing whatever the session held
    pub async fn record_result(&self, session: SessionId, record: AnalysisRecord) {
        self.cache
            .insert(
                session,
                SessionData {
                    flow: FlowState::DisplayingResult,
                    record: Some(record),
                    flash: None,
                },
            )
            .await;
    }

    /// Drop any previous analysis and leave a message for the upload form
    pub async fn record_failure(&self, session: SessionId, message: String) {
        self.cache
            .insert(
                session,
                SessionData {
                    flow: FlowState::AwaitingUpload,
                    record: None,
                    flash: Some(message),
                },
            )
            .await;
    }

    /// Return the pending message once; later calls see nothing
    pub async fn take_flash(&self, session: &SessionId) -> Option<String> {
        let mut data = self.cache.get(session).await?;
        let flash = data.flash.take()?;

        if data == SessionData::default() {
            self.cache.invalidate(session).await;
        } else {
            self.cache.insert(*session, data).await;
        }

        Some(flash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use safelens_core::{Likelihood, SafeSearchResult};
    use std::time::Duration;

    fn store() -> SessionStore {
        SessionStore::new(&SessionConfig {
            secret: "secret".to_string(),
            ttl: Duration::from_secs(60),
            max_entries: 100,
        })
    }

    fn record(filename: &str) -> AnalysisRecord {
        AnalysisRecord {
            result: SafeSearchResult {
                adult: Likelihood::Unlikely,
                ..Default::default()
            },
            instructions: "Summarize the JPG.".to_string(),
            original_filename: filename.to_string(),
            analyzed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let store = store();
        let session = SessionId::new();
        assert_eq!(store.get(&session).await, SessionData::default());
        assert_eq!(store.flow_state(&session).await, FlowState::AwaitingUpload);
        assert!(store.result(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_results_are_per_session() {
        let store = store();
        let alice = SessionId::new();
        let bob = SessionId::new();

        store.record_result(alice, record("alice.jpg")).await;

        assert_eq!(
            store.result(&alice).await.unwrap().original_filename,
            "alice.jpg"
        );
        assert!(store.result(&bob).await.is_none());
        assert_eq!(store.flow_state(&alice).await, FlowState::DisplayingResult);
    }

    #[tokio::test]
    async fn test_failure_clears_previous_result() {
        let store = store();
        let session = SessionId::new();

        store.record_result(session, record("cat.jpg")).await;
        store
            .record_failure(session, "Service unavailable".to_string())
            .await;

        assert!(store.result(&session).await.is_none());
        assert_eq!(store.flow_state(&session).await, FlowState::AwaitingUpload);
    }

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let store = store();
        let session = SessionId::new();

        store
            .record_failure(session, "Service unavailable".to_string())
            .await;

        assert_eq!(
            store.take_flash(&session).await.as_deref(),
            Some("Service unavailable")
        );
        assert!(store.take_flash(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_new_result_replaces_old() {
        let store = store();
        let session = SessionId::new();

        store.record_result(session, record("first.jpg")).await;
        store.record_result(session, record("second.jpg")).await;

        assert_eq!(
            store.result(&session).await.unwrap().original_filename,
            "second.jpg"
        );
    }
}
