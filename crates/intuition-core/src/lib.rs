//! Intuition Core Library
//!
//! Change detection for the Intuition knowledge-graph API: the poll state
//! persisted between invocations, the per-entity detection strategies, and
//! the driver that ties a search backend and a state store together.

pub mod config;
pub mod detect;
pub mod driver;
pub mod entity;
pub mod error;
pub mod search;
pub mod state;
pub mod store;

pub use config::TriggerConfig;
pub use driver::PollDriver;
pub use entity::{EntityKind, Record, Shape, Sort, SortDirection};
pub use error::{SearchError, StoreError, TriggerError, TriggerResult};
pub use search::{EntitySearch, Page, SearchPort, SearchRequest};
pub use state::{PollState, SeenSet, StaticData};
pub use store::{FileStateStore, MemoryStateStore, StateStore};
