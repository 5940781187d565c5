//! Timestamp-cursor detection for atoms.
//!
//! Atoms carry a `created_at` assigned at creation, so each poll asks for
//! `created_at >= cursor` in ascending order and every returned row is new.
//! The bound is inclusive: a row created exactly at the cursor is fetched
//! (and emitted) again by the next poll.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{Detection, Outcome};
use crate::config::{RelativeWindow, TriggerConfig};
use crate::entity::keys::created_at;
use crate::entity::{AtomFilters, AtomSortField, Sort};
use crate::error::SearchError;
use crate::search::{EntitySearch, Page, SearchPort, SearchRequest};
use crate::state::PollState;

/// What a poll has to do before it can produce a result.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorStep {
    /// First poll with seeding enabled: the new state, no query.
    Seed(PollState),
    /// Run this request and feed the page to [`apply_page`].
    Query(SearchRequest<AtomFilters, AtomSortField>),
}

/// Lower bound for the `created_at >=` predicate.
///
/// With a relative window the later of the window and the cursor wins, so
/// a wide window never re-fetches rows the cursor already passed. Without
/// either, the operator's own `created_at_from` filter is kept.
pub fn effective_floor(
    cursor: Option<DateTime<Utc>>,
    relative: Option<&RelativeWindow>,
    user_from: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (relative.map(|window| window.floor(now)), cursor) {
        (Some(window), Some(cursor)) => Some(window.max(cursor)),
        (Some(window), None) => Some(window),
        (None, Some(cursor)) => Some(cursor),
        (None, None) => user_from,
    }
}

/// Decide between seeding and querying.
pub fn plan(state: &PollState, config: &TriggerConfig, now: DateTime<Utc>) -> CursorStep {
    if state.cursor.is_none() && config.start_from_now {
        let mut seeded = state.clone();
        seeded.cursor = Some(now);
        seeded.initialized = true;
        return CursorStep::Seed(seeded);
    }

    let resource = &config.atoms;
    let forced = Sort::asc(AtomSortField::CreatedAt);
    if let Some(requested) = resource.sort {
        if requested != forced {
            debug!(
                by = ?requested.by,
                dir = requested.dir.as_str(),
                "Ignoring atom sort preference; polling always reads created_at ascending"
            );
        }
    }

    let mut filters = resource.filters.clone();
    filters.created_at_from = effective_floor(
        state.cursor,
        resource.relative_time.as_ref(),
        filters.created_at_from,
        now,
    );

    CursorStep::Query(SearchRequest {
        filters,
        limit: config.page_size,
        offset: 0,
        sort: Some(forced),
        shape: config.shape(),
    })
}

/// Emit the whole page and move the cursor to its last row.
pub fn apply_page(state: PollState, page: Page) -> Detection {
    let mut state = state;
    let Some(last) = page.records.last() else {
        return Detection {
            state,
            outcome: Outcome::Nothing,
        };
    };

    match created_at(last) {
        Some(latest) => {
            if !state.advance_cursor(latest) {
                debug!(cursor = ?state.cursor, latest = %latest, "Cursor already ahead of page");
            }
        }
        None => warn!(
            rows = page.records.len(),
            "Last atom in page has no usable created_at; cursor not advanced"
        ),
    }

    Detection {
        state,
        outcome: Outcome::Emitted(page.records),
    }
}

/// Run one atom poll. On error `state` is dropped unchanged by the caller.
pub async fn poll_atoms<P: SearchPort + ?Sized>(
    port: &P,
    state: PollState,
    config: &TriggerConfig,
    now: DateTime<Utc>,
) -> Result<Detection, SearchError> {
    match plan(&state, config, now) {
        CursorStep::Seed(seeded) => {
            debug!(cursor = ?seeded.cursor, "Seeded atom cursor");
            Ok(Detection {
                state: seeded,
                outcome: Outcome::Seeded,
            })
        }
        CursorStep::Query(request) => {
            debug!(
                floor = ?request.filters.created_at_from,
                limit = request.limit,
                "Polling atoms"
            );
            let page = port.search(&EntitySearch::Atoms(request)).await?;
            Ok(apply_page(state, page))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeUnit;
    use crate::detect::testing::ScriptedPort;
    use crate::entity::SortDirection;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn atom(id: &str, created: DateTime<Utc>) -> serde_json::Value {
        json!({"term_id": id, "created_at": created.to_rfc3339()})
    }

    fn query(step: CursorStep) -> SearchRequest<AtomFilters, AtomSortField> {
        match step {
            CursorStep::Query(request) => request,
            CursorStep::Seed(_) => panic!("expected a query"),
        }
    }

    #[test]
    fn test_relative_floor_later_than_cursor_wins() {
        let now = at(65);
        let window = RelativeWindow::new(60, TimeUnit::Minutes);
        assert_eq!(effective_floor(Some(at(0)), Some(&window), None, now), Some(at(5)));
    }

    #[test]
    fn test_cursor_later_than_relative_floor_wins() {
        let now = at(30);
        let window = RelativeWindow::new(1, TimeUnit::Hours);
        assert_eq!(effective_floor(Some(at(10)), Some(&window), None, now), Some(at(10)));
    }

    #[test]
    fn test_user_floor_only_without_cursor_or_window() {
        assert_eq!(effective_floor(None, None, Some(at(3)), at(9)), Some(at(3)));
        assert_eq!(effective_floor(Some(at(4)), None, Some(at(3)), at(9)), Some(at(4)));
        assert_eq!(effective_floor(None, None, None, at(9)), None);
    }

    #[test]
    fn test_first_poll_seeds_without_query() {
        let config = TriggerConfig::default();
        match plan(&PollState::default(), &config, at(7)) {
            CursorStep::Seed(state) => {
                assert_eq!(state.cursor, Some(at(7)));
                assert!(state.initialized);
            }
            CursorStep::Query(_) => panic!("expected seeding"),
        }
    }

    #[test]
    fn test_first_poll_without_seeding_queries_everything() {
        let config = TriggerConfig {
            start_from_now: false,
            ..TriggerConfig::default()
        };
        let request = query(plan(&PollState::default(), &config, at(7)));
        assert_eq!(request.filters.created_at_from, None);
        assert_eq!(request.offset, 0);
        assert_eq!(request.limit, 50);
    }

    #[test]
    fn test_sort_forced_ascending_by_created_at() {
        let mut config = TriggerConfig::default();
        config.atoms.sort = Some(Sort::desc(AtomSortField::BlockNumber));
        let state = PollState {
            cursor: Some(at(1)),
            initialized: true,
            ..PollState::default()
        };
        let request = query(plan(&state, &config, at(2)));
        assert_eq!(request.sort, Some(Sort::asc(AtomSortField::CreatedAt)));
        assert_eq!(request.sort.map(|s| s.dir), Some(SortDirection::Asc));
        assert_eq!(request.filters.created_at_from, Some(at(1)));
    }

    #[test]
    fn test_cursor_overrides_user_floor_and_keeps_other_filters() {
        let mut config = TriggerConfig::default();
        config.atoms.filters.label = Some("eth".into());
        config.atoms.filters.created_at_from = Some(at(0));
        let state = PollState {
            cursor: Some(at(20)),
            initialized: true,
            ..PollState::default()
        };
        let request = query(plan(&state, &config, at(30)));
        assert_eq!(request.filters.created_at_from, Some(at(20)));
        assert_eq!(request.filters.label.as_deref(), Some("eth"));
    }

    #[test]
    fn test_apply_page_advances_to_last_row() {
        let state = PollState {
            cursor: Some(at(0)),
            initialized: true,
            ..PollState::default()
        };
        let page = Page::new(vec![atom("a", at(1)), atom("b", at(2))]);
        let detection = apply_page(state, page);
        assert_eq!(detection.state.cursor, Some(at(2)));
        assert_eq!(detection.outcome.len(), 2);
    }

    #[test]
    fn test_apply_page_without_created_at_keeps_cursor() {
        let state = PollState {
            cursor: Some(at(0)),
            initialized: true,
            ..PollState::default()
        };
        let detection = apply_page(state, Page::new(vec![json!({"term_id": "x"})]));
        assert_eq!(detection.state.cursor, Some(at(0)));
        assert_eq!(detection.outcome.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_then_quiet_poll_keeps_cursor() {
        let port = ScriptedPort::new(vec![Ok(Page::default())]);
        let config = TriggerConfig::default();
        let started = Utc::now();

        let first = poll_atoms(&port, PollState::default(), &config, Utc::now()).await.unwrap();
        assert_eq!(first.outcome, Outcome::Seeded);
        let seeded_cursor = first.state.cursor.unwrap();
        assert!(seeded_cursor >= started);
        assert_eq!(port.calls(), 0);

        let second = poll_atoms(&port, first.state, &config, Utc::now()).await.unwrap();
        assert_eq!(second.outcome, Outcome::Nothing);
        assert_eq!(second.state.cursor, Some(seeded_cursor));
        assert_eq!(port.calls(), 1);
    }

    #[tokio::test]
    async fn test_boundary_row_is_emitted_again() {
        let boundary = atom("edge", at(5));
        let port = ScriptedPort::new(vec![
            Ok(Page::new(vec![atom("a", at(4)), boundary.clone()])),
            Ok(Page::new(vec![boundary.clone()])),
        ]);
        let config = TriggerConfig::default();
        let state = PollState {
            cursor: Some(at(3)),
            initialized: true,
            ..PollState::default()
        };

        let first = poll_atoms(&port, state, &config, at(10)).await.unwrap();
        let second = poll_atoms(&port, first.state, &config, at(11)).await.unwrap();

        assert_eq!(second.outcome, Outcome::Emitted(vec![boundary]));
        assert_eq!(second.state.cursor, Some(at(5)));
        let floors: Vec<_> = port
            .requests()
            .into_iter()
            .map(|r| match r {
                EntitySearch::Atoms(r) => r.filters.created_at_from,
                other => panic!("unexpected {:?}", other.kind()),
            })
            .collect();
        assert_eq!(floors, vec![Some(at(3)), Some(at(5))]);
    }

    #[tokio::test]
    async fn test_relative_window_floor_used_in_query() {
        let port = ScriptedPort::new(vec![Ok(Page::default())]);
        let mut config = TriggerConfig::default();
        config.atoms.relative_time = Some(RelativeWindow::new(10, TimeUnit::Minutes));
        let state = PollState {
            cursor: Some(at(0)),
            initialized: true,
            ..PollState::default()
        };

        poll_atoms(&port, state, &config, at(15)).await.unwrap();

        match &port.requests()[0] {
            EntitySearch::Atoms(request) => {
                assert_eq!(request.filters.created_at_from, Some(at(5)));
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_search_error_propagates() {
        let port = ScriptedPort::new(vec![Err(SearchError::Transport("timeout".into()))]);
        let config = TriggerConfig::default();
        let state = PollState {
            cursor: Some(at(0)),
            initialized: true,
            ..PollState::default()
        };
        let result = poll_atoms(&port, state, &config, at(1) + Duration::seconds(1)).await;
        assert!(matches!(result, Err(SearchError::Transport(_))));
    }
}
