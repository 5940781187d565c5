//! Persisted per-node data in the host's key/value layout.
//!
//! A node's static data is one JSON object. Each detector owns a fixed set
//! of keys in it; keys it does not own are carried through untouched, so a
//! node that switches resource keeps the other detector's state.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::{PollState, SeenSet};
use crate::entity::keys::parse_timestamp;
use crate::entity::EntityKind;

/// Key holding the atom cursor (RFC 3339 string).
pub const LAST_ATOM_CREATED_AT: &str = "lastAtomCreatedAt";

/// Keys owned by a seen-set detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenKeys {
    pub ids: &'static str,
    pub initialized: &'static str,
}

/// Seen-set keys for `kind`, or `None` for cursor-based entities.
pub fn seen_keys(kind: EntityKind) -> Option<SeenKeys> {
    let (ids, initialized) = match kind {
        EntityKind::Atoms => return None,
        EntityKind::Triples => ("seenTripleIds", "seenTriplesInitialized"),
        EntityKind::Accounts => ("seenAccountIds", "seenAccountsInitialized"),
        EntityKind::Positions => ("seenPositionIds", "seenPositionsInitialized"),
        EntityKind::Vaults => ("seenVaultTx", "seenVaultsInitialized"),
    };
    Some(SeenKeys { ids, initialized })
}

/// Opaque persisted object for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticData(Map<String, Value>);

impl StaticData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Decode the detector state for `kind`. Malformed entries read as absent.
    pub fn poll_state(&self, kind: EntityKind) -> PollState {
        match seen_keys(kind) {
            None => {
                let cursor = match self.0.get(LAST_ATOM_CREATED_AT) {
                    Some(Value::String(raw)) if !raw.is_empty() => {
                        let parsed = parse_timestamp(raw);
                        if parsed.is_none() {
                            warn!(key = LAST_ATOM_CREATED_AT, value = %raw, "Ignoring unparseable cursor");
                        }
                        parsed
                    }
                    _ => None,
                };
                PollState {
                    cursor,
                    seen: SeenSet::new(),
                    initialized: cursor.is_some(),
                }
            }
            Some(keys) => {
                let seen = match self.0.get(keys.ids) {
                    Some(Value::Object(ids)) => SeenSet::from_entries(
                        ids.iter()
                            .filter(|(id, _)| !id.is_empty())
                            .filter_map(|(id, stamp)| stamp_millis(stamp).map(|ms| (id.clone(), ms))),
                    ),
                    _ => SeenSet::new(),
                };
                let initialized = matches!(self.0.get(keys.initialized), Some(Value::Bool(true)));
                PollState {
                    cursor: None,
                    seen,
                    initialized,
                }
            }
        }
    }

    /// Write the detector state for `kind` under its keys.
    pub fn set_poll_state(&mut self, kind: EntityKind, state: &PollState) {
        match seen_keys(kind) {
            None => {
                if let Some(cursor) = state.cursor {
                    self.0.insert(
                        LAST_ATOM_CREATED_AT.to_string(),
                        Value::String(cursor.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                    );
                }
            }
            Some(keys) => {
                let ids: Map<String, Value> = state
                    .seen
                    .iter()
                    .map(|(id, stamp)| (id.to_string(), Value::from(stamp)))
                    .collect();
                self.0.insert(keys.ids.to_string(), Value::Object(ids));
                self.0
                    .insert(keys.initialized.to_string(), Value::Bool(state.initialized));
            }
        }
    }
}

fn stamp_millis(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_empty_data_yields_fresh_state() {
        let data = StaticData::new();
        for kind in EntityKind::ALL {
            assert_eq!(data.poll_state(kind), PollState::default());
        }
    }

    #[test]
    fn test_atom_cursor_round_trip_keeps_precision() {
        let mut data = StaticData::new();
        let cursor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        let state = PollState {
            cursor: Some(cursor),
            ..PollState::default()
        };
        data.set_poll_state(EntityKind::Atoms, &state);

        assert_eq!(
            data.get(LAST_ATOM_CREATED_AT),
            Some(&json!("2024-01-01T00:05:00.123456Z"))
        );
        let loaded = data.poll_state(EntityKind::Atoms);
        assert_eq!(loaded.cursor, Some(cursor));
        assert!(loaded.initialized);
    }

    #[test]
    fn test_seen_state_uses_host_keys() {
        let mut data = StaticData::new();
        let state = PollState {
            cursor: None,
            seen: SeenSet::from_entries([("0xtx".to_string(), 1_700_000_000_000)]),
            initialized: true,
        };
        data.set_poll_state(EntityKind::Vaults, &state);

        assert_eq!(data.get("seenVaultTx"), Some(&json!({"0xtx": 1_700_000_000_000i64})));
        assert_eq!(data.get("seenVaultsInitialized"), Some(&json!(true)));
        assert_eq!(data.poll_state(EntityKind::Vaults), state);
    }

    #[test]
    fn test_foreign_keys_preserved() {
        let mut data: StaticData = serde_json::from_value(json!({
            "lastAtomCreatedAt": "2024-01-01T00:00:00Z",
            "somethingElse": [1, 2, 3]
        }))
        .unwrap();
        data.set_poll_state(EntityKind::Triples, &PollState {
            initialized: true,
            ..PollState::default()
        });

        assert_eq!(data.get("somethingElse"), Some(&json!([1, 2, 3])));
        assert!(data.poll_state(EntityKind::Atoms).cursor.is_some());
        assert!(data.poll_state(EntityKind::Triples).initialized);
    }

    #[test]
    fn test_malformed_entries_read_as_absent() {
        let data: StaticData = serde_json::from_value(json!({
            "lastAtomCreatedAt": "not a date",
            "seenTripleIds": {"t1": 1000.0, "t2": "soon", "": 5},
            "seenTriplesInitialized": "yes"
        }))
        .unwrap();

        assert_eq!(data.poll_state(EntityKind::Atoms).cursor, None);
        let triples = data.poll_state(EntityKind::Triples);
        assert_eq!(triples.seen.len(), 1);
        assert_eq!(triples.seen.stamp("t1"), Some(1000));
        assert!(!triples.initialized);
    }
}
