//! Entity kinds exposed by the Intuition API and their query vocabulary.

pub mod filters;
pub mod keys;

use serde::{Deserialize, Serialize};

pub use filters::{
    AccountFilters, AccountSortField, AtomFilters, AtomSortField, PositionFilters,
    PositionSortField, TripleFilters, TripleSortField, VaultFilters, VaultSortField,
};

/// A record as returned by the API. The payload shape depends on the entity
/// and on the requested [`Shape`]; the detectors only read identifier and
/// timestamp fields from it.
pub type Record = serde_json::Value;

/// Entity type selected for polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Atoms,
    Triples,
    Accounts,
    Positions,
    Vaults,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Atoms,
        EntityKind::Triples,
        EntityKind::Accounts,
        EntityKind::Positions,
        EntityKind::Vaults,
    ];

    /// Name of the GraphQL root field, which is also the key of the entity
    /// array in the response.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atoms => "atoms",
            Self::Triples => "triples",
            Self::Accounts => "accounts",
            Self::Positions => "positions",
            Self::Vaults => "vaults",
        }
    }

}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-selection profile for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Light,
    #[default]
    Full,
}

impl Shape {
    pub fn from_light_flag(light: bool) -> Self {
        if light {
            Self::Light
        } else {
            Self::Full
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A sort pair. Absence of a `Sort` means the query carries no `order_by`
/// and the API returns rows in implementation-defined order.
///
/// A configured sort without `dir` takes the field's
/// [`SortColumn::DEFAULT_DIR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "SortSpec<F>",
    bound(deserialize = "F: Deserialize<'de> + SortColumn")
)]
pub struct Sort<F> {
    pub by: F,
    pub dir: SortDirection,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SortSpec<F> {
    by: F,
    #[serde(default)]
    dir: Option<SortDirection>,
}

impl<F: SortColumn> From<SortSpec<F>> for Sort<F> {
    fn from(spec: SortSpec<F>) -> Self {
        Self {
            by: spec.by,
            dir: spec.dir.unwrap_or(F::DEFAULT_DIR),
        }
    }
}

impl<F> Sort<F> {
    pub fn asc(by: F) -> Self {
        Self {
            by,
            dir: SortDirection::Asc,
        }
    }

    pub fn desc(by: F) -> Self {
        Self {
            by,
            dir: SortDirection::Desc,
        }
    }
}

/// Column a sort field maps to in the GraphQL `order_by` clause.
pub trait SortColumn {
    /// Direction used when a sort names only the field.
    const DEFAULT_DIR: SortDirection;

    fn column(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_serde_names() {
        let kind: EntityKind = serde_json::from_str("\"positions\"").unwrap();
        assert_eq!(kind, EntityKind::Positions);
        assert_eq!(serde_json::to_string(&EntityKind::Atoms).unwrap(), "\"atoms\"");
    }

    #[test]
    fn test_sort_direction_defaults_per_field() {
        let sort: Sort<AtomSortField> = serde_json::from_str(r#"{"by":"block_number"}"#).unwrap();
        assert_eq!(sort.by, AtomSortField::BlockNumber);
        assert_eq!(sort.dir, SortDirection::Asc);

        let sort: Sort<TripleSortField> = serde_json::from_str(r#"{"by":"created_at"}"#).unwrap();
        assert_eq!(sort.dir, SortDirection::Desc);

        let sort: Sort<TripleSortField> =
            serde_json::from_str(r#"{"by":"created_at","dir":"asc"}"#).unwrap();
        assert_eq!(sort.dir, SortDirection::Asc);
    }
}
