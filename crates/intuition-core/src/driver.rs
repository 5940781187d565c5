//! One poll invocation: load state, detect, commit.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::TriggerConfig;
use crate::detect::{self, Outcome};
use crate::entity::Record;
use crate::error::TriggerResult;
use crate::search::SearchPort;
use crate::state::PollState;
use crate::store::StateStore;

/// Runs polls for named nodes against a search backend and a state store.
pub struct PollDriver<P, S> {
    port: P,
    store: S,
}

impl<P: SearchPort, S: StateStore> PollDriver<P, S> {
    pub fn new(port: P, store: S) -> Self {
        Self { port, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Poll once at the current time.
    ///
    /// Returns the new records, or `None` when the poll seeded state or found
    /// nothing. State is saved only when the search succeeded.
    pub async fn poll(&self, node: &str, config: &TriggerConfig) -> TriggerResult<Option<Vec<Record>>> {
        self.poll_at(node, config, Utc::now()).await
    }

    /// [`poll`](Self::poll) with an explicit clock.
    pub async fn poll_at(
        &self,
        node: &str,
        config: &TriggerConfig,
        now: DateTime<Utc>,
    ) -> TriggerResult<Option<Vec<Record>>> {
        config.validate()?;
        let kind = config.resource;

        let mut data = self.store.load(node).await?;
        let state: PollState = data.poll_state(kind);
        debug!(node, resource = %kind, initialized = state.initialized, "Loaded poll state");

        let detection = match detect::detect(&self.port, state, config, now).await {
            Ok(detection) => detection,
            Err(e) => {
                warn!(node, resource = %kind, error = %e, "Poll failed; state left unchanged");
                return Err(e.into());
            }
        };

        data.set_poll_state(kind, &detection.state);
        self.store.save(node, &data).await?;

        match &detection.outcome {
            Outcome::Seeded => info!(node, resource = %kind, "Seeded poll state; existing records skipped"),
            Outcome::Nothing => debug!(node, resource = %kind, "No new records"),
            Outcome::Emitted(records) => info!(node, resource = %kind, count = records.len(), "New records"),
        }
        Ok(detection.outcome.into_records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::testing::ScriptedPort;
    use crate::entity::EntityKind;
    use crate::error::{SearchError, TriggerError};
    use crate::search::Page;
    use crate::state::StaticData;
    use crate::store::MemoryStateStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_seed_then_emit_commits_state() {
        let port = ScriptedPort::new(vec![
            Ok(Page::new(vec![json!({"term_id": "t1"})])),
            Ok(Page::new(vec![json!({"term_id": "t1"}), json!({"term_id": "t2"})])),
        ]);
        let driver = PollDriver::new(port, MemoryStateStore::new());
        let config = TriggerConfig::for_resource(EntityKind::Triples);

        assert_eq!(driver.poll_at("n", &config, now()).await.unwrap(), None);
        let emitted = driver.poll_at("n", &config, now()).await.unwrap().unwrap();
        assert_eq!(emitted, vec![json!({"term_id": "t2"})]);

        let data = driver.store().load("n").await.unwrap();
        let state = data.poll_state(EntityKind::Triples);
        assert!(state.initialized);
        assert!(state.seen.contains("t1") && state.seen.contains("t2"));
    }

    #[tokio::test]
    async fn test_search_error_leaves_store_untouched() {
        let store = MemoryStateStore::new();
        let before: StaticData = serde_json::from_value(json!({
            "lastAtomCreatedAt": "2024-05-01T08:00:00Z"
        }))
        .unwrap();
        store.save("n", &before).await.unwrap();

        let port = ScriptedPort::new(vec![Err(SearchError::Http {
            status: 502,
            body: "bad gateway".into(),
        })]);
        let driver = PollDriver::new(port, store);
        let err = driver
            .poll_at("n", &TriggerConfig::default(), now())
            .await
            .unwrap_err();

        assert!(matches!(err, TriggerError::Search(SearchError::Http { status: 502, .. })));
        assert_eq!(driver.store().load("n").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_failed_seen_set_search_keeps_stored_ids() {
        let store = MemoryStateStore::new();
        let before: StaticData = serde_json::from_value(json!({
            "seenTripleIds": {"t1": 1714550000000u64, "t2": 1714550000001u64},
            "seenTriplesInitialized": true
        }))
        .unwrap();
        store.save("n", &before).await.unwrap();

        let port = ScriptedPort::new(vec![Err(SearchError::Transport("connection reset".into()))]);
        let driver = PollDriver::new(port, store);
        let config = TriggerConfig::for_resource(EntityKind::Triples);
        let err = driver.poll_at("n", &config, now()).await.unwrap_err();
        assert!(matches!(err, TriggerError::Search(SearchError::Transport(_))));

        let after = driver.store().load("n").await.unwrap();
        assert_eq!(
            serde_json::to_string(&after.get("seenTripleIds")).unwrap(),
            serde_json::to_string(&before.get("seenTripleIds")).unwrap()
        );
        assert_eq!(after.get("seenTriplesInitialized"), Some(&json!(true)));
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_atom_cursor_persisted_and_foreign_keys_kept() {
        let store = MemoryStateStore::new();
        let before: StaticData = serde_json::from_value(json!({
            "lastAtomCreatedAt": "2024-05-01T08:00:00Z",
            "seenVaultTx": {"0xabc": 1}
        }))
        .unwrap();
        store.save("n", &before).await.unwrap();

        let port = ScriptedPort::new(vec![Ok(Page::new(vec![
            json!({"term_id": "a", "created_at": "2024-05-01T08:30:00Z"}),
        ]))]);
        let driver = PollDriver::new(port, store);
        let emitted = driver
            .poll_at("n", &TriggerConfig::default(), now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(emitted.len(), 1);

        let data = driver.store().load("n").await.unwrap();
        assert_eq!(data.get("lastAtomCreatedAt"), Some(&json!("2024-05-01T08:30:00Z")));
        assert_eq!(data.get("seenVaultTx"), Some(&json!({"0xabc": 1})));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_search() {
        let driver = PollDriver::new(ScriptedPort::new(vec![]), MemoryStateStore::new());
        let config = TriggerConfig {
            page_size: 0,
            ..TriggerConfig::default()
        };
        let err = driver.poll_at("n", &config, now()).await.unwrap_err();
        assert!(matches!(err, TriggerError::Config(_)));
        assert!(driver.store().nodes().await.unwrap().is_empty());
    }
}
