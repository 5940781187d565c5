//! Change detection strategies.
//!
//! Atoms are polled through a timestamp cursor ([`cursor`]). Every other
//! entity is re-scanned and deduplicated against a bounded seen-set
//! ([`seen`]). Both take the current state by value and hand back the state
//! to persist together with what to emit; nothing is written on error.

pub mod cursor;
pub mod seen;

use chrono::{DateTime, Utc};

use crate::config::TriggerConfig;
use crate::entity::{EntityKind, Record};
use crate::error::SearchError;
use crate::search::SearchPort;
use crate::state::PollState;

use seen::{Accounts, Positions, Triples, Vaults};

/// What a single poll produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// First run: state was initialized and nothing is emitted.
    Seeded,
    /// Query ran but nothing new was found.
    Nothing,
    /// New records, in backend order.
    Emitted(Vec<Record>),
}

impl Outcome {
    pub fn len(&self) -> usize {
        match self {
            Self::Emitted(records) => records.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records to hand to the workflow, `None` when there are none.
    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            Self::Emitted(records) if !records.is_empty() => Some(records),
            _ => None,
        }
    }
}

/// Result of a successful poll: the state to persist and the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub state: PollState,
    pub outcome: Outcome,
}

/// Run the strategy for `config.resource`.
pub async fn detect<P: SearchPort + ?Sized>(
    port: &P,
    state: PollState,
    config: &TriggerConfig,
    now: DateTime<Utc>,
) -> Result<Detection, SearchError> {
    match config.resource {
        EntityKind::Atoms => cursor::poll_atoms(port, state, config, now).await,
        EntityKind::Triples => seen::poll_seen::<Triples, P>(port, state, config, now).await,
        EntityKind::Accounts => seen::poll_seen::<Accounts, P>(port, state, config, now).await,
        EntityKind::Positions => seen::poll_seen::<Positions, P>(port, state, config, now).await,
        EntityKind::Vaults => seen::poll_seen::<Vaults, P>(port, state, config, now).await,
    }
}
