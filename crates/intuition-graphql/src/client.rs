//! HTTP client posting searches to the Intuition GraphQL endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use intuition_core::{EntityKind, EntitySearch, Page, SearchError, SearchPort};

use crate::query::build_query;

/// Public testnet indexer.
pub const DEFAULT_ENDPOINT: &str = "https://testnet.intuition.sh/v1/graphql";

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// GraphQL-backed [`SearchPort`].
#[derive(Clone)]
pub struct GraphqlSearch {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    #[serde(default)]
    message: String,
}

impl GraphqlSearch {
    /// Create a client for `endpoint` with a request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Turn a decoded GraphQL body into a page of `kind` records.
fn page_from_body(kind: EntityKind, body: GraphqlResponse) -> Result<Page, SearchError> {
    if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(SearchError::GraphQl(messages.join("; ")));
    }

    let rows = body
        .data
        .and_then(|mut data| data.get_mut(kind.as_str()).map(Value::take));
    match rows {
        None | Some(Value::Null) => Ok(Page::default()),
        Some(Value::Array(rows)) => Ok(Page::new(rows)),
        Some(other) => Err(SearchError::Decode(format!(
            "expected an array under '{}', got {}",
            kind,
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl SearchPort for GraphqlSearch {
    async fn search(&self, request: &EntitySearch) -> Result<Page, SearchError> {
        let kind = request.kind();
        let query = build_query(request);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&query)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Http { status, body });
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;
        let page = page_from_body(kind, body)?;

        debug!(entity = %kind, rows = page.len(), "GraphQL search completed");
        Ok(page)
    }
}
