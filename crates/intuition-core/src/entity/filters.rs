//! Structured search filters, one type per entity.
//!
//! Every field is optional; an unset field contributes no predicate. Fields
//! named `*_contains` are substring matches, `*_min`/`*_max` and
//! `*_from`/`*_to` are inclusive range bounds, everything else is equality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SortColumn, SortDirection};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtomFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_atom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_total_market_cap_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_total_market_cap_max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_updated_at_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_updated_at_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TripleFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triple_id: Option<String>,
    /// Matches triples whose subject, predicate or object is this atom.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_term_id: Option<String>,
    /// Substring match on the subject, predicate or object label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<TripleAtomFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<TripleAtomFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<TripleAtomFilters>,
}

/// Predicates on one position (subject, predicate or object) of a triple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TripleAtomFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_contains: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccountFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_contains: Option<String>,
    /// Accounts carry no creation time; these bound the account's positions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PositionFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_max: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_count_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_count_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_shares_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_shares_max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_share_price_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_share_price_max: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomSortField {
    CreatedAt,
    BlockNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripleSortField {
    CreatedAt,
    BlockNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSortField {
    Id,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSortField {
    CreatedAt,
    BlockNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultSortField {
    CreatedAt,
    BlockNumber,
    MarketCap,
}

impl SortColumn for AtomSortField {
    const DEFAULT_DIR: SortDirection = SortDirection::Asc;

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::BlockNumber => "block_number",
        }
    }
}

impl SortColumn for TripleSortField {
    const DEFAULT_DIR: SortDirection = SortDirection::Desc;

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::BlockNumber => "block_number",
        }
    }
}

impl SortColumn for AccountSortField {
    const DEFAULT_DIR: SortDirection = SortDirection::Asc;

    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Label => "label",
        }
    }
}

impl SortColumn for PositionSortField {
    const DEFAULT_DIR: SortDirection = SortDirection::Desc;

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::BlockNumber => "block_number",
        }
    }
}

impl SortColumn for VaultSortField {
    const DEFAULT_DIR: SortDirection = SortDirection::Desc;

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::BlockNumber => "block_number",
            Self::MarketCap => "market_cap",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_from_toml() {
        let filters: TripleFilters = toml::from_str(
            r#"
            atom_label = "ethereum"
            block_number_min = 100
            created_at_from = "2024-01-01T00:00:00Z"

            [subject]
            type = "Person"
            "#,
        )
        .unwrap();

        assert_eq!(filters.atom_label.as_deref(), Some("ethereum"));
        assert_eq!(filters.block_number_min, Some(100));
        assert_eq!(
            filters.created_at_from.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(filters.subject.unwrap().r#type.as_deref(), Some("Person"));
        assert!(filters.object.is_none());
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let result: Result<AccountFilters, _> = toml::from_str(r#"wallet = "0xabc""#);
        assert!(result.is_err());
    }
}
