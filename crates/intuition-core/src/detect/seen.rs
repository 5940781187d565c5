//! Seen-set detection for entities without a reliable incrementing key.
//!
//! Triples, accounts, positions and vaults are re-scanned through the same
//! window every poll. A bounded set of identifiers already observed
//! suppresses repeats. Rows that scroll out of the window before a poll sees
//! them are never detected, and an identifier evicted from the set is
//! emitted again if it comes back into the window.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Detection, Outcome};
use crate::config::{ResourceConfig, TriggerConfig};
use crate::entity::keys;
use crate::entity::{
    AccountFilters, AccountSortField, EntityKind, PositionFilters, PositionSortField, Record,
    TripleFilters, TripleSortField, VaultFilters, VaultSortField,
};
use crate::error::SearchError;
use crate::search::{EntitySearch, Page, SearchPort, SearchRequest};
use crate::state::PollState;

/// Per-entity hooks for the shared seen-set algorithm.
pub trait SeenSetEntity {
    const KIND: EntityKind;
    type Filters: Clone;
    type SortField: Copy;

    /// Deduplication key of a record; `None` skips the record.
    fn record_key(record: &Record) -> Option<String>;

    /// Apply a relative-window lower bound to the filters.
    fn set_created_from(filters: &mut Self::Filters, from: DateTime<Utc>);

    fn resource(config: &TriggerConfig) -> &ResourceConfig<Self::Filters, Self::SortField>;

    fn wrap(request: SearchRequest<Self::Filters, Self::SortField>) -> EntitySearch;
}

pub struct Triples;
pub struct Accounts;
pub struct Positions;
pub struct Vaults;

impl SeenSetEntity for Triples {
    const KIND: EntityKind = EntityKind::Triples;
    type Filters = TripleFilters;
    type SortField = TripleSortField;

    fn record_key(record: &Record) -> Option<String> {
        keys::triple_key(record)
    }

    fn set_created_from(filters: &mut TripleFilters, from: DateTime<Utc>) {
        filters.created_at_from = Some(from);
    }

    fn resource(config: &TriggerConfig) -> &ResourceConfig<TripleFilters, TripleSortField> {
        &config.triples
    }

    fn wrap(request: SearchRequest<TripleFilters, TripleSortField>) -> EntitySearch {
        EntitySearch::Triples(request)
    }
}

impl SeenSetEntity for Accounts {
    const KIND: EntityKind = EntityKind::Accounts;
    type Filters = AccountFilters;
    type SortField = AccountSortField;

    fn record_key(record: &Record) -> Option<String> {
        keys::account_key(record)
    }

    fn set_created_from(filters: &mut AccountFilters, from: DateTime<Utc>) {
        filters.created_at_from = Some(from);
    }

    fn resource(config: &TriggerConfig) -> &ResourceConfig<AccountFilters, AccountSortField> {
        &config.accounts
    }

    fn wrap(request: SearchRequest<AccountFilters, AccountSortField>) -> EntitySearch {
        EntitySearch::Accounts(request)
    }
}

impl SeenSetEntity for Positions {
    const KIND: EntityKind = EntityKind::Positions;
    type Filters = PositionFilters;
    type SortField = PositionSortField;

    fn record_key(record: &Record) -> Option<String> {
        keys::position_key(record)
    }

    fn set_created_from(filters: &mut PositionFilters, from: DateTime<Utc>) {
        filters.created_at_from = Some(from);
    }

    fn resource(config: &TriggerConfig) -> &ResourceConfig<PositionFilters, PositionSortField> {
        &config.positions
    }

    fn wrap(request: SearchRequest<PositionFilters, PositionSortField>) -> EntitySearch {
        EntitySearch::Positions(request)
    }
}

impl SeenSetEntity for Vaults {
    const KIND: EntityKind = EntityKind::Vaults;
    type Filters = VaultFilters;
    type SortField = VaultSortField;

    fn record_key(record: &Record) -> Option<String> {
        keys::vault_key(record)
    }

    fn set_created_from(filters: &mut VaultFilters, from: DateTime<Utc>) {
        filters.created_at_from = Some(from);
    }

    fn resource(config: &TriggerConfig) -> &ResourceConfig<VaultFilters, VaultSortField> {
        &config.vaults
    }

    fn wrap(request: SearchRequest<VaultFilters, VaultSortField>) -> EntitySearch {
        EntitySearch::Vaults(request)
    }
}

/// The request a seen-set poll issues: the configured window as is, with
/// the relative bound (if any) replacing `created_at_from`.
pub fn build_request<E: SeenSetEntity>(config: &TriggerConfig, now: DateTime<Utc>) -> EntitySearch {
    let resource = E::resource(config);
    let mut filters = resource.filters.clone();
    if let Some(window) = &resource.relative_time {
        E::set_created_from(&mut filters, window.floor(now));
    }
    E::wrap(SearchRequest {
        filters,
        limit: config.page_size,
        offset: 0,
        sort: resource.sort,
        shape: config.shape(),
    })
}

/// Fold a page into the seen-set.
///
/// Seeding (first poll with `seed_on_first_run`) records every key and emits
/// nothing. Otherwise unseen keys are recorded and their rows emitted in page
/// order. The set is trimmed to `max_seen` afterwards and `initialized` is
/// set either way.
pub fn apply_page(
    state: PollState,
    page: Page,
    record_key: impl Fn(&Record) -> Option<String>,
    seed_on_first_run: bool,
    max_seen: usize,
    now: DateTime<Utc>,
) -> Detection {
    let mut state = state;
    let now_ms = now.timestamp_millis();

    if !state.initialized && seed_on_first_run {
        for record in &page.records {
            if let Some(key) = record_key(record) {
                state.seen.insert(key, now_ms);
            }
        }
        state.initialized = true;
        // A seeding page can be larger than max_seen.
        state.seen.evict_to(max_seen);
        return Detection {
            state,
            outcome: Outcome::Seeded,
        };
    }

    let mut emitted = Vec::new();
    let mut skipped = 0usize;
    for record in page.records {
        match record_key(&record) {
            Some(key) => {
                if state.seen.insert(key, now_ms) {
                    emitted.push(record);
                }
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "Skipped records without an identifier");
    }

    let evicted = state.seen.evict_to(max_seen);
    if !evicted.is_empty() {
        debug!(evicted = evicted.len(), retained = state.seen.len(), "Trimmed seen-set");
    }
    state.initialized = true;

    let outcome = if emitted.is_empty() {
        Outcome::Nothing
    } else {
        Outcome::Emitted(emitted)
    };
    Detection { state, outcome }
}

/// Run one seen-set poll for entity `E`.
pub async fn poll_seen<E: SeenSetEntity, P: SearchPort + ?Sized>(
    port: &P,
    state: PollState,
    config: &TriggerConfig,
    now: DateTime<Utc>,
) -> Result<Detection, SearchError> {
    let request = build_request::<E>(config, now);
    debug!(entity = %E::KIND, limit = request.limit(), seen = state.seen.len(), "Polling");
    let page = port.search(&request).await?;
    Ok(apply_page(
        state,
        page,
        E::record_key,
        config.start_from_now,
        config.max_seen,
        now,
    ))
}
