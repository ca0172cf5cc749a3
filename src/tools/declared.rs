/// Declared tool - a connector function the model can see but nothing serves.
use std::sync::Arc;

use adk_rust::prelude::*;
use async_trait::async_trait;
use serde_json::Value;

use crate::connectors::{ToolDeclaration, validate_arguments};

/// Presents a static declaration as an ADK tool. Calls are validated against
/// the declaration's required parameters and then refused, because the
/// connector has no in-process implementation.
pub struct DeclaredTool {
    declaration: ToolDeclaration,
}

impl DeclaredTool {
    pub fn new(declaration: ToolDeclaration) -> Self {
        Self { declaration }
    }

    pub fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }
}

#[async_trait]
impl Tool for DeclaredTool {
    fn name(&self) -> &str {
        self.declaration.name
    }

    fn description(&self) -> &str {
        self.declaration.description
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(self.declaration.parameters.clone())
    }

    async fn execute(&self, _ctx: Arc<dyn ToolContext>, args: Value) -> adk_rust::Result<Value> {
        validate_arguments(&self.declaration, &args)
            .map_err(|e| adk_rust::AdkError::tool(e.to_string()))?;

        tracing::warn!(
            tool = self.declaration.name,
            connector = self.declaration.connector.name(),
            "declared tool invoked without a connected MCP server"
        );
        Err(adk_rust::AdkError::tool(format!(
            "connector '{}' is not connected; '{}' cannot run until its MCP server is available",
            self.declaration.connector.name(),
            self.declaration.name
        )))
    }
}
