/// Sub-agent tool - exposes a specialist agent to the coordinator as a callable tool.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use adk_rust::prelude::*;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::RuntimeConfig;
use crate::runner::{build_runner, run_prompt};
use crate::telemetry::TelemetrySink;

/// Each call runs the wrapped agent in its own session, so delegations do
/// not share history with the coordinator or with each other.
pub struct SubAgentTool {
    name: String,
    description: String,
    agent: Arc<dyn Agent>,
    cfg: RuntimeConfig,
    telemetry: TelemetrySink,
    calls: AtomicUsize,
}

impl SubAgentTool {
    pub fn new(
        agent: Arc<dyn Agent>,
        description: &str,
        cfg: RuntimeConfig,
        telemetry: TelemetrySink,
    ) -> Self {
        Self {
            name: agent.name().to_string(),
            description: description.to_string(),
            agent,
            cfg,
            telemetry,
            calls: AtomicUsize::new(0),
        }
    }

    fn next_session_id(&self) -> String {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}-{}", self.cfg.session_id, self.name, call)
    }
}

#[async_trait]
impl Tool for SubAgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "Task for the agent, including any context it needs"
                }
            },
            "required": ["request"]
        }))
    }

    async fn execute(&self, _ctx: Arc<dyn ToolContext>, args: Value) -> adk_rust::Result<Value> {
        let request = args
            .get("request")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|request| !request.is_empty())
            .ok_or_else(|| adk_rust::AdkError::tool("request is required".to_string()))?;

        let session_id = self.next_session_id();
        tracing::info!(agent = %self.name, session = %session_id, "delegating to sub-agent");
        self.telemetry.emit(
            "agent.delegated",
            json!({ "agent": self.name, "session": session_id }),
        );

        let runner = build_runner(self.agent.clone(), &self.cfg, &session_id)
            .await
            .map_err(|e| adk_rust::AdkError::tool(format!("{e:#}")))?;
        let reply = run_prompt(&runner, &self.cfg, &session_id, request, &self.telemetry)
            .await
            .map_err(|e| adk_rust::AdkError::tool(format!("{}: {e:#}", self.name)))?;

        Ok(json!({
            "agent": self.name,
            "response": reply,
        }))
    }
}
