//! Translation of filter structs into `*_bool_exp` where clauses.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use intuition_core::entity::filters::TripleAtomFilters;
use intuition_core::entity::{
    AccountFilters, AtomFilters, PositionFilters, TripleFilters, VaultFilters,
};

/// Conjunction of predicates, rendered as `{"_and": [...]}` or `{}`.
#[derive(Debug, Default)]
struct Conditions(Vec<Value>);

impl Conditions {
    fn push(&mut self, path: &[&str], op: &str, value: Value) {
        let mut leaf = Map::new();
        leaf.insert(op.to_string(), value);
        let nested = path.iter().rev().fold(Value::Object(leaf), |inner, key| {
            let mut outer = Map::new();
            outer.insert((*key).to_string(), inner);
            Value::Object(outer)
        });
        self.0.push(nested);
    }

    fn eq(&mut self, path: &[&str], value: Option<&String>) {
        if let Some(v) = non_empty(value) {
            self.push(path, "_eq", json!(v));
        }
    }

    fn contains(&mut self, path: &[&str], value: Option<&String>) {
        if let Some(v) = non_empty(value) {
            self.push(path, "_ilike", json!(format!("%{}%", v)));
        }
    }

    fn range_i64(&mut self, path: &[&str], min: Option<i64>, max: Option<i64>) {
        if let Some(min) = min {
            self.push(path, "_gte", json!(min));
        }
        if let Some(max) = max {
            self.push(path, "_lte", json!(max));
        }
    }

    /// Numeric columns stored as big decimals are compared as strings.
    fn range_decimal(&mut self, path: &[&str], min: Option<&String>, max: Option<&String>) {
        if let Some(min) = non_empty(min) {
            self.push(path, "_gte", json!(min));
        }
        if let Some(max) = non_empty(max) {
            self.push(path, "_lte", json!(max));
        }
    }

    fn range_time(&mut self, path: &[&str], from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) {
        if let Some(from) = from {
            self.push(path, "_gte", json!(timestamp(from)));
        }
        if let Some(to) = to {
            self.push(path, "_lte", json!(timestamp(to)));
        }
    }

    fn any_of(&mut self, alternatives: Vec<Value>) {
        self.0.push(json!({ "_or": alternatives }));
    }

    fn finish(self) -> Value {
        if self.0.is_empty() {
            json!({})
        } else {
            json!({ "_and": self.0 })
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Timestamp rendering shared with the persisted cursor.
pub fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn atoms(f: &AtomFilters) -> Value {
    let mut c = Conditions::default();
    c.eq(&["term_id"], f.term_id.as_ref());
    c.eq(&["type"], f.r#type.as_ref());
    c.eq(&["wallet_id"], f.wallet_id.as_ref());
    c.eq(&["transaction_hash"], f.transaction_hash.as_ref());
    c.contains(&["label"], f.label.as_ref());
    c.eq(&["emoji"], f.emoji.as_ref());
    c.contains(&["image"], f.image_contains.as_ref());
    c.contains(&["data"], f.data_contains.as_ref());
    c.range_i64(&["block_number"], f.block_number_min, f.block_number_max);
    c.range_time(&["created_at"], f.created_at_from, f.created_at_to);
    c.eq(&["creator_id"], f.creator_id.as_ref());
    c.contains(&["creator", "label"], f.creator_label.as_ref());
    c.eq(&["creator", "type"], f.creator_type.as_ref());
    c.eq(&["creator", "atom_id"], f.creator_atom_id.as_ref());
    c.range_decimal(
        &["term", "total_market_cap"],
        f.term_total_market_cap_min.as_ref(),
        f.term_total_market_cap_max.as_ref(),
    );
    c.range_time(&["term", "updated_at"], f.term_updated_at_from, f.term_updated_at_to);
    c.finish()
}

pub fn triples(f: &TripleFilters) -> Value {
    let mut c = Conditions::default();
    c.eq(&["term_id"], f.triple_id.as_ref());

    if let Some(id) = non_empty(f.atom_term_id.as_ref()) {
        c.any_of(vec![
            json!({"subject_id": {"_eq": id}}),
            json!({"predicate_id": {"_eq": id}}),
            json!({"object_id": {"_eq": id}}),
        ]);
    }
    if let Some(label) = non_empty(f.atom_label.as_ref()) {
        let like = format!("%{}%", label);
        c.any_of(vec![
            json!({"subject": {"label": {"_ilike": like}}}),
            json!({"predicate": {"label": {"_ilike": like}}}),
            json!({"object": {"label": {"_ilike": like}}}),
        ]);
    }

    c.range_time(&["created_at"], f.created_at_from, f.created_at_to);
    c.eq(&["transaction_hash"], f.transaction_hash.as_ref());
    c.eq(&["creator_id"], f.creator_id.as_ref());
    c.range_i64(&["block_number"], f.block_number_min, f.block_number_max);

    for (role, id_column, filters) in [
        ("subject", "subject_id", &f.subject),
        ("predicate", "predicate_id", &f.predicate),
        ("object", "object_id", &f.object),
    ] {
        if let Some(filters) = filters {
            triple_atom(&mut c, role, id_column, filters);
        }
    }
    c.finish()
}

fn triple_atom(c: &mut Conditions, role: &str, id_column: &str, f: &TripleAtomFilters) {
    c.eq(&[id_column], f.term_id.as_ref());
    c.contains(&[role, "label"], f.label.as_ref());
    c.eq(&[role, "type"], f.r#type.as_ref());
    c.eq(&[role, "emoji"], f.emoji.as_ref());
    c.eq(&[role, "creator", "id"], f.creator_id.as_ref());
    c.contains(&[role, "data"], f.data_contains.as_ref());
    c.contains(&[role, "image"], f.image_contains.as_ref());
}

pub fn accounts(f: &AccountFilters) -> Value {
    let mut c = Conditions::default();
    c.eq(&["id"], f.id.as_ref());
    c.contains(&["label"], f.label.as_ref());
    c.eq(&["type"], f.r#type.as_ref());
    c.eq(&["atom_id"], f.atom_id.as_ref());
    c.contains(&["image"], f.image_contains.as_ref());
    c.range_time(&["positions", "created_at"], f.created_at_from, f.created_at_to);
    c.finish()
}

pub fn positions(f: &PositionFilters) -> Value {
    let mut c = Conditions::default();
    c.eq(&["id"], f.id.as_ref());
    c.eq(&["account_id"], f.account_id.as_ref());
    c.eq(&["term_id"], f.term_id.as_ref());
    c.eq(&["curve_id"], f.curve_id.as_ref());
    c.eq(&["transaction_hash"], f.transaction_hash.as_ref());
    c.range_i64(&["block_number"], f.block_number_min, f.block_number_max);
    c.range_time(&["created_at"], f.created_at_from, f.created_at_to);
    c.range_decimal(&["shares"], f.shares_min.as_ref(), f.shares_max.as_ref());
    c.finish()
}

pub fn vaults(f: &VaultFilters) -> Value {
    let mut c = Conditions::default();
    c.eq(&["term_id"], f.term_id.as_ref());
    c.eq(&["curve_id"], f.curve_id.as_ref());
    c.range_i64(&["block_number"], f.block_number_min, f.block_number_max);
    c.range_time(&["created_at"], f.created_at_from, f.created_at_to);
    c.range_i64(&["position_count"], f.position_count_min, f.position_count_max);
    c.range_decimal(&["market_cap"], f.market_cap_min.as_ref(), f.market_cap_max.as_ref());
    c.range_decimal(&["total_shares"], f.total_shares_min.as_ref(), f.total_shares_max.as_ref());
    c.range_decimal(
        &["current_share_price"],
        f.current_share_price_min.as_ref(),
        f.current_share_price_max.as_ref(),
    );
    c.finish()
}
