//! Intuition GraphQL Backend
//!
//! Implements the core `SearchPort` against the Hasura-style GraphQL API
//! served by Intuition indexers.

pub mod client;
pub mod query;
pub mod selection;
pub mod where_clause;

pub use client::{GraphqlSearch, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
pub use query::{build_query, GraphqlQuery};
