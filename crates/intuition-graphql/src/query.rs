//! Query document and variables for one entity search.

use serde::Serialize;
use serde_json::{json, Map, Value};

use intuition_core::entity::SortColumn;
use intuition_core::{EntityKind, EntitySearch, SearchRequest, Sort};

use crate::selection::selection;
use crate::where_clause;

/// Request body posted to the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlQuery {
    pub query: String,
    pub variables: Value,
}

fn document(kind: EntityKind, selection: &str) -> String {
    let root = kind.as_str();
    let operation = match kind {
        EntityKind::Atoms => "SearchAtoms",
        EntityKind::Triples => "SearchTriples",
        EntityKind::Accounts => "SearchAccounts",
        EntityKind::Positions => "SearchPositions",
        EntityKind::Vaults => "SearchVaults",
    };
    format!(
        "query {operation}($where: {root}_bool_exp, $limit: Int, $offset: Int, $orderBy: [{root}_order_by!]) {{\n  \
         {root}(where: $where, limit: $limit, offset: $offset, order_by: $orderBy) {{{selection}  }}\n}}"
    )
}

fn variables<F, S: SortColumn>(request: &SearchRequest<F, S>, filter: Value) -> Value {
    let mut vars = Map::new();
    vars.insert("where".into(), filter);
    vars.insert("limit".into(), json!(request.limit));
    vars.insert("offset".into(), json!(request.offset));
    if let Some(sort) = &request.sort {
        vars.insert("orderBy".into(), order_by(sort));
    }
    Value::Object(vars)
}

fn order_by<S: SortColumn>(sort: &Sort<S>) -> Value {
    let mut clause = Map::new();
    clause.insert(sort.by.column().to_string(), json!(sort.dir.as_str()));
    Value::Array(vec![Value::Object(clause)])
}

/// Build the query for `search`. `orderBy` is omitted when no sort is set.
pub fn build_query(search: &EntitySearch) -> GraphqlQuery {
    let kind = search.kind();
    let (shape, vars) = match search {
        EntitySearch::Atoms(r) => (r.shape, variables(r, where_clause::atoms(&r.filters))),
        EntitySearch::Triples(r) => (r.shape, variables(r, where_clause::triples(&r.filters))),
        EntitySearch::Accounts(r) => (r.shape, variables(r, where_clause::accounts(&r.filters))),
        EntitySearch::Positions(r) => (r.shape, variables(r, where_clause::positions(&r.filters))),
        EntitySearch::Vaults(r) => (r.shape, variables(r, where_clause::vaults(&r.filters))),
    };
    GraphqlQuery {
        query: document(kind, &selection(kind, shape)),
        variables: vars,
    }
}
