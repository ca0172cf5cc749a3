use std::collections::BTreeMap;
use std::sync::Arc;

use adk_rust::prelude::*;
use anyhow::{Context, Result};

use super::tools::SubAgentTool;
use super::{AgentSpec, COORDINATOR_SPEC, sub_agent_specs};
use crate::config::RuntimeConfig;
use crate::mcp::ConnectorToolsets;
use crate::telemetry::TelemetrySink;

/// Coordinator plus the specialists it can delegate to. The specialists are
/// also kept by name so workflows can drive them one stage at a time.
#[derive(Clone)]
pub struct AgentTree {
    pub coordinator: Arc<dyn Agent>,
    pub sub_agents: BTreeMap<&'static str, Arc<dyn Agent>>,
}

impl AgentTree {
    pub fn sub_agent(&self, name: &str) -> Result<Arc<dyn Agent>> {
        self.sub_agents
            .get(name)
            .cloned()
            .with_context(|| format!("sub-agent '{}' is not part of the agent tree", name))
    }
}

/// Builds one LLM agent whose sampling temperature is pinned on every model
/// request.
pub fn build_llm_agent(
    spec: &AgentSpec,
    model: Arc<dyn Llm>,
    tools: &[Arc<dyn Tool>],
) -> Result<Arc<dyn Agent>> {
    let temperature = spec.temperature;
    let mut builder = LlmAgentBuilder::new(spec.name)
        .description(spec.description)
        .instruction(spec.instruction)
        .model(model)
        .before_model_callback(Box::new(move |_ctx, mut request| {
            Box::pin(async move {
                request
                    .config
                    .get_or_insert_with(adk_rust::GenerateContentConfig::default)
                    .temperature = Some(temperature);
                Ok(BeforeModelResult::Continue(request))
            })
        }));

    for tool in tools {
        builder = builder.tool(tool.clone());
    }

    let agent = builder
        .build()
        .with_context(|| format!("failed to build agent '{}'", spec.name))?;
    Ok(Arc::new(agent))
}

pub fn build_agent_tree(
    model: Arc<dyn Llm>,
    toolsets: &ConnectorToolsets,
    cfg: &RuntimeConfig,
    telemetry: &TelemetrySink,
) -> Result<AgentTree> {
    let mut sub_agents = BTreeMap::new();
    let mut delegations: Vec<Arc<dyn Tool>> = Vec::new();

    for spec in sub_agent_specs() {
        let tools = toolsets.tools_for(spec.connectors);
        let missing = spec
            .connectors
            .iter()
            .filter(|connector| !toolsets.is_available(**connector))
            .map(|connector| connector.name())
            .collect::<Vec<&str>>();
        if !missing.is_empty() {
            tracing::warn!(
                agent = spec.name,
                missing = %missing.join(", "),
                "agent built without some connector tools"
            );
        }
        tracing::debug!(agent = spec.name, tools = tools.len(), "building sub-agent");

        let agent = build_llm_agent(&spec, model.clone(), &tools)?;
        delegations.push(Arc::new(SubAgentTool::new(
            agent.clone(),
            spec.description,
            cfg.clone(),
            telemetry.clone(),
        )));
        sub_agents.insert(spec.name, agent);
    }

    let coordinator = build_llm_agent(&COORDINATOR_SPEC, model, &delegations)?;
    tracing::info!(sub_agents = sub_agents.len(), "agent tree ready");

    Ok(AgentTree {
        coordinator,
        sub_agents,
    })
}
