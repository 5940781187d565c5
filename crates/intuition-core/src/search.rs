//! The search capability the detectors poll through.

use async_trait::async_trait;

use crate::entity::{
    AccountFilters, AccountSortField, AtomFilters, AtomSortField, EntityKind, PositionFilters,
    PositionSortField, Record, Shape, Sort, TripleFilters, TripleSortField, VaultFilters,
    VaultSortField,
};
use crate::error::SearchError;

/// One windowed search against a single entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest<F, S> {
    pub filters: F,
    pub limit: u32,
    pub offset: u32,
    pub sort: Option<Sort<S>>,
    pub shape: Shape,
}

/// A search request tagged with its entity type.
#[derive(Debug, Clone, PartialEq)]
pub enum EntitySearch {
    Atoms(SearchRequest<AtomFilters, AtomSortField>),
    Triples(SearchRequest<TripleFilters, TripleSortField>),
    Accounts(SearchRequest<AccountFilters, AccountSortField>),
    Positions(SearchRequest<PositionFilters, PositionSortField>),
    Vaults(SearchRequest<VaultFilters, VaultSortField>),
}

impl EntitySearch {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Atoms(_) => EntityKind::Atoms,
            Self::Triples(_) => EntityKind::Triples,
            Self::Accounts(_) => EntityKind::Accounts,
            Self::Positions(_) => EntityKind::Positions,
            Self::Vaults(_) => EntityKind::Vaults,
        }
    }

    pub fn limit(&self) -> u32 {
        match self {
            Self::Atoms(r) => r.limit,
            Self::Triples(r) => r.limit,
            Self::Accounts(r) => r.limit,
            Self::Positions(r) => r.limit,
            Self::Vaults(r) => r.limit,
        }
    }
}

/// Records returned by one search call, in the order the backend produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
}

impl Page {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Backend able to run entity searches, typically the GraphQL API.
#[async_trait]
pub trait SearchPort: Send + Sync {
    async fn search(&self, request: &EntitySearch) -> Result<Page, SearchError>;
}

#[async_trait]
impl<T: SearchPort + ?Sized> SearchPort for std::sync::Arc<T> {
    async fn search(&self, request: &EntitySearch) -> Result<Page, SearchError> {
        (**self).search(request).await
    }
}
