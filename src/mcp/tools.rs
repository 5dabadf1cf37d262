//! Tool implementations exposed over MCP.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::embeddings::Embedder;
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool, ToolContent};
use crate::mcp::server::ToolHandler;
use crate::retrieval::{RetrievalService, SearchOutcome, format_response};

/// Semantic precedent search over the loaded case index.
pub struct SearchCasesHandler<E> {
    service: Arc<RetrievalService<E>>,
}

impl<E: Embedder> SearchCasesHandler<E> {
    #[inline]
    pub fn new(service: Arc<RetrievalService<E>>) -> Self {
        Self { service }
    }

    /// Create the search_cases tool definition.
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "search_cases".to_string(),
            description: Some(
                "Search the indexed legal cases for precedents relevant to a query".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "legal_query": {
                        "type": "string",
                        "description": "Free-text description of the legal question"
                    },
                    "k": {
                        "type": "integer",
                        "description": "Number of neighbors to return (default: 3)"
                    }
                },
                "required": ["legal_query"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl<E: Embedder + 'static> ToolHandler for SearchCasesHandler<E> {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let query = args
            .get("legal_query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing required parameter: legal_query"))?;

        let k = match args.get("k").and_then(serde_json::Value::as_u64) {
            Some(k) => usize::try_from(k).unwrap_or(usize::MAX).max(1),
            None => self.service.default_k(),
        };

        debug!("Searching cases: query='{}', k={}", query, k);

        let outcome = self.service.search(query, k);
        let is_error = matches!(outcome, SearchOutcome::Unavailable { .. });

        Ok(CallToolResult {
            content: vec![ToolContent::Text {
                text: format_response(&outcome),
            }],
            is_error: Some(is_error),
        })
    }
}
