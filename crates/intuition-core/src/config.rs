//! Operator configuration for one trigger node.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{
    AccountFilters, AccountSortField, AtomFilters, AtomSortField, EntityKind, PositionFilters,
    PositionSortField, Shape, Sort, SortColumn, TripleFilters, TripleSortField, VaultFilters,
    VaultSortField,
};
use crate::error::{TriggerError, TriggerResult};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;
pub const DEFAULT_MAX_SEEN: usize = 10_000;
pub const MIN_MAX_SEEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Seconds,
    #[default]
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn millis(&self) -> i64 {
        match self {
            Self::Seconds => 1_000,
            Self::Minutes => 60 * 1_000,
            Self::Hours => 60 * 60 * 1_000,
            Self::Days => 24 * 60 * 60 * 1_000,
        }
    }
}

/// "Created within the last `amount` `unit`s" lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelativeWindow {
    #[serde(default = "default_relative_amount")]
    pub amount: i64,
    #[serde(default)]
    pub unit: TimeUnit,
}

fn default_relative_amount() -> i64 {
    60
}

impl RelativeWindow {
    pub fn new(amount: i64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    /// Lower bound derived from `now`. Negative amounts count as zero.
    pub fn floor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let millis = self.amount.max(0).saturating_mul(self.unit.millis());
        TimeDelta::try_milliseconds(millis)
            .and_then(|delta| now.checked_sub_signed(delta))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Per-resource knobs: filters, optional relative window, optional sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "F: Deserialize<'de> + Default, S: Deserialize<'de> + SortColumn")
)]
pub struct ResourceConfig<F, S> {
    pub filters: F,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_time: Option<RelativeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort<S>>,
}

impl<F: Default, S> Default for ResourceConfig<F, S> {
    fn default() -> Self {
        Self {
            filters: F::default(),
            relative_time: None,
            sort: None,
        }
    }
}

/// Everything a poll needs besides state and a search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerConfig {
    pub resource: EntityKind,
    pub light_output: bool,
    /// Seed the cursor or seen-set on the first poll instead of emitting
    /// existing records.
    pub start_from_now: bool,
    pub page_size: u32,
    pub max_seen: usize,
    pub atoms: ResourceConfig<AtomFilters, AtomSortField>,
    pub triples: ResourceConfig<TripleFilters, TripleSortField>,
    pub accounts: ResourceConfig<AccountFilters, AccountSortField>,
    pub positions: ResourceConfig<PositionFilters, PositionSortField>,
    pub vaults: ResourceConfig<VaultFilters, VaultSortField>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            resource: EntityKind::Atoms,
            light_output: false,
            start_from_now: true,
            page_size: DEFAULT_PAGE_SIZE,
            max_seen: DEFAULT_MAX_SEEN,
            atoms: ResourceConfig::default(),
            triples: ResourceConfig::default(),
            accounts: ResourceConfig::default(),
            positions: ResourceConfig::default(),
            vaults: ResourceConfig::default(),
        }
    }
}

impl TriggerConfig {
    /// Default configuration polling `resource`.
    pub fn for_resource(resource: EntityKind) -> Self {
        Self {
            resource,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(raw: &str) -> TriggerResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the bounds the host UI enforces.
    pub fn validate(&self) -> TriggerResult<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(TriggerError::config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.max_seen < MIN_MAX_SEEN {
            return Err(TriggerError::config(format!(
                "max_seen must be at least {}, got {}",
                MIN_MAX_SEEN, self.max_seen
            )));
        }
        Ok(())
    }

    pub fn shape(&self) -> Shape {
        Shape::from_light_flag(self.light_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let config = TriggerConfig::from_toml("").unwrap();
        assert_eq!(config.resource, EntityKind::Atoms);
        assert!(config.start_from_now);
        assert!(!config.light_output);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_seen, 10_000);
        assert_eq!(config.shape(), Shape::Full);
    }

    #[test]
    fn test_full_document() {
        let config = TriggerConfig::from_toml(
            r#"
            resource = "vaults"
            light_output = true
            start_from_now = false
            page_size = 200
            max_seen = 100

            [vaults.filters]
            curve_id = "1"

            [vaults.relative_time]
            amount = 2
            unit = "hours"

            [vaults.sort]
            by = "market_cap"
            dir = "desc"
            "#,
        )
        .unwrap();

        assert_eq!(config.resource, EntityKind::Vaults);
        assert_eq!(config.shape(), Shape::Light);
        assert_eq!(config.vaults.filters.curve_id.as_deref(), Some("1"));
        assert_eq!(
            config.vaults.relative_time,
            Some(RelativeWindow::new(2, TimeUnit::Hours))
        );
        assert_eq!(config.vaults.sort, Some(Sort::desc(VaultSortField::MarketCap)));
        assert!(config.atoms.sort.is_none());
    }

    #[test]
    fn test_sort_without_dir_uses_resource_default() {
        let config = TriggerConfig::from_toml(
            r#"
            [atoms.sort]
            by = "block_number"

            [triples.sort]
            by = "created_at"

            [accounts.sort]
            by = "label"

            [positions.sort]
            by = "block_number"

            [vaults.sort]
            by = "created_at"
            "#,
        )
        .unwrap();

        assert_eq!(config.atoms.sort, Some(Sort::asc(AtomSortField::BlockNumber)));
        assert_eq!(config.triples.sort, Some(Sort::desc(TripleSortField::CreatedAt)));
        assert_eq!(config.accounts.sort, Some(Sort::asc(AccountSortField::Label)));
        assert_eq!(
            config.positions.sort,
            Some(Sort::desc(PositionSortField::BlockNumber))
        );
        assert_eq!(config.vaults.sort, Some(Sort::desc(VaultSortField::CreatedAt)));
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(TriggerConfig::from_toml("page_size = 0").is_err());
        assert!(TriggerConfig::from_toml("page_size = 201").is_err());
        assert!(TriggerConfig::from_toml("page_size = 1").is_ok());
    }

    #[test]
    fn test_max_seen_lower_bound() {
        let err = TriggerConfig::from_toml("max_seen = 99").unwrap_err();
        assert!(matches!(err, TriggerError::Config(_)));
    }

    #[test]
    fn test_relative_window_defaults_to_an_hour() {
        let config = TriggerConfig::from_toml("[triples.relative_time]").unwrap();
        let window = config.triples.relative_time.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(window.floor(now), Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn test_relative_window_clamps_negative_and_huge() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(RelativeWindow::new(-5, TimeUnit::Days).floor(now), now);
        assert_eq!(
            RelativeWindow::new(i64::MAX, TimeUnit::Days).floor(now),
            DateTime::<Utc>::MIN_UTC
        );
    }
}
