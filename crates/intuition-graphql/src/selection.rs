//! Field selections per entity and output shape.
//!
//! Light selections always keep the identifier and `created_at` fields the
//! change detectors read.

use intuition_core::{EntityKind, Shape};

const CREATOR: &str = "creator { id label image atom_id type }";

const ATOMS_LIGHT: &str = "
  term_id
  label
  emoji
  image
  type
  data
  block_number
  created_at
  transaction_hash
  wallet_id
  creator_id
  positions_aggregate { aggregate { count } }
  as_subject_triples_aggregate { aggregate { count } }
  as_predicate_triples_aggregate { aggregate { count } }
  as_object_triples_aggregate { aggregate { count } }
";

const ATOMS_FULL: &str = "
  term_id
  label
  emoji
  image
  type
  data
  block_number
  created_at
  transaction_hash
  wallet_id
  creator_id
  creator { id label image atom_id type }
  term { total_market_cap updated_at }
  positions_aggregate { aggregate { count sum { shares } } }
  positions { id shares account { id label } }
  as_subject_triples {
    term_id
    object { term_id label image emoji type creator { id label image atom_id type } }
    predicate { term_id label image emoji type creator { id label image atom_id type } }
  }
  as_predicate_triples {
    term_id
    subject { term_id label image emoji type creator { id label image atom_id type } }
    object { term_id label image emoji type creator { id label image atom_id type } }
  }
  as_object_triples {
    term_id
    subject { term_id label image emoji type creator { id label image atom_id type } }
    predicate { term_id label image emoji type creator { id label image atom_id type } }
  }
  triplesPredicateTotal: as_predicate_triples_aggregate { aggregate { count } }
  triplesObjectTotal: as_object_triples_aggregate { aggregate { count } }
";

const TRIPLES_LIGHT: &str = "
  term_id
  created_at
  subject { term_id label }
  predicate { term_id label }
  object { term_id label }
";

const ACCOUNTS_LIGHT: &str = "
  id
  label
  image
  atom_id
  type
";

const ACCOUNTS_FULL: &str = "
  id
  label
  image
  atom_id
  type
  positions_aggregate { aggregate { count } }
  atoms_aggregate { aggregate { count } }
  triples_aggregate { aggregate { count } }
";

const POSITIONS_LIGHT: &str = "
  id
  shares
  block_number
  created_at
  transaction_hash
  account { id label }
  term_id
  curve_id
  vault { term_id current_share_price position_count }
";

const POSITIONS_FULL: &str = "
  id
  shares
  block_number
  created_at
  updated_at
  transaction_hash
  transaction_index
  log_index
  account { id label image }
  account_id
  term_id
  curve_id
  total_deposit_assets_after_total_fees
  total_redeem_assets_for_receiver
  term { total_market_cap updated_at }
  vault {
    term_id
    curve_id
    current_share_price
    position_count
    total_shares
    total_assets
    market_cap
    block_number
    transaction_hash
    created_at
    updated_at
  }
";

const VAULTS_LIGHT: &str = "
  term_id
  curve_id
  current_share_price
  position_count
  total_shares
  total_assets
  market_cap
  block_number
  created_at
  updated_at
  transaction_hash
";

const VAULTS_FULL_EXTRA: &str = "
  term { total_market_cap updated_at }
  positions_aggregate { aggregate { count } }
  signals_aggregate { aggregate { count } }
  deposits_aggregate { aggregate { count } }
  redemptions_aggregate { aggregate { count } }
";

/// Full triple selection: each role carries the same atom detail.
fn triples_full() -> String {
    let atom = format!(
        "term_id label image emoji type data {CREATOR} \
         term {{ total_market_cap updated_at }} \
         positions_aggregate {{ aggregate {{ count }} }} \
         as_subject_triples_aggregate {{ aggregate {{ count }} }} \
         as_predicate_triples_aggregate {{ aggregate {{ count }} }} \
         as_object_triples_aggregate {{ aggregate {{ count }} }}"
    );
    format!(
        "
  term_id
  created_at
  block_number
  transaction_hash
  creator_id
  {CREATOR}
  subject {{ {atom} }}
  predicate {{ {atom} }}
  object {{ {atom} }}
"
    )
}

/// Selection set for `kind` in `shape`.
pub fn selection(kind: EntityKind, shape: Shape) -> String {
    match (kind, shape) {
        (EntityKind::Atoms, Shape::Light) => ATOMS_LIGHT.to_string(),
        (EntityKind::Atoms, Shape::Full) => ATOMS_FULL.to_string(),
        (EntityKind::Triples, Shape::Light) => TRIPLES_LIGHT.to_string(),
        (EntityKind::Triples, Shape::Full) => triples_full(),
        (EntityKind::Accounts, Shape::Light) => ACCOUNTS_LIGHT.to_string(),
        (EntityKind::Accounts, Shape::Full) => ACCOUNTS_FULL.to_string(),
        (EntityKind::Positions, Shape::Light) => POSITIONS_LIGHT.to_string(),
        (EntityKind::Positions, Shape::Full) => POSITIONS_FULL.to_string(),
        (EntityKind::Vaults, Shape::Light) => VAULTS_LIGHT.to_string(),
        (EntityKind::Vaults, Shape::Full) => format!("{VAULTS_LIGHT}{VAULTS_FULL_EXTRA}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(selection: &str) -> Vec<&str> {
        selection.split_whitespace().collect()
    }

    #[test]
    fn test_light_shapes_keep_detection_keys() {
        let required: [(EntityKind, &[&str]); 5] = [
            (EntityKind::Atoms, &["term_id", "created_at"]),
            (EntityKind::Triples, &["term_id", "created_at"]),
            (EntityKind::Accounts, &["id"]),
            (EntityKind::Positions, &["id", "created_at"]),
            (EntityKind::Vaults, &["transaction_hash", "term_id", "created_at"]),
        ];
        for (kind, keys) in required {
            for shape in [Shape::Light, Shape::Full] {
                let sel = selection(kind, shape);
                for key in keys {
                    assert!(fields(&sel).contains(key), "{kind} {shape:?} missing {key}");
                }
            }
        }
    }

    #[test]
    fn test_full_is_superset_of_light_for_vaults() {
        let light = selection(EntityKind::Vaults, Shape::Light);
        let full = selection(EntityKind::Vaults, Shape::Full);
        assert!(full.starts_with(&light));
        assert!(full.contains("redemptions_aggregate"));
    }

    #[test]
    fn test_braces_balanced() {
        for kind in EntityKind::ALL {
            for shape in [Shape::Light, Shape::Full] {
                let sel = selection(kind, shape);
                let open = sel.matches('{').count();
                let close = sel.matches('}').count();
                assert_eq!(open, close, "{kind} {shape:?}");
            }
        }
    }
}
