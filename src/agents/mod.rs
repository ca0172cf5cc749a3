/// Agent definitions for the assistant.
///
/// One coordinator delegates to four sub-agents, each bound to the
/// connectors it needs:
/// - `context_agent`: pantry, calendar, receipts, spending, location
/// - `planning_agent`: meal plans, shopping lists, errand trips
/// - `decision_agent`: vendor price comparison and selection
/// - `execution_agent`: order placement and delivery tracking
pub mod prompts;
pub mod tools;
pub mod tree;

use anyhow::Result;

use crate::connectors::Connector;

pub const COORDINATOR_AGENT: &str = "coordinator_agent";
pub const CONTEXT_AGENT: &str = "context_agent";
pub const PLANNING_AGENT: &str = "planning_agent";
pub const DECISION_AGENT: &str = "decision_agent";
pub const EXECUTION_AGENT: &str = "execution_agent";

#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
    pub temperature: f32,
    pub connectors: &'static [Connector],
}

pub const CONTEXT_SPEC: AgentSpec = AgentSpec {
    name: CONTEXT_AGENT,
    description: "Gathers environmental data including pantry status, calendar, receipts, and \
                  financial state",
    instruction: prompts::CONTEXT_AGENT_PROMPT,
    temperature: 0.1,
    connectors: &[
        Connector::Mongodb,
        Connector::GoogleCalendar,
        Connector::Gmail,
        Connector::Plaid,
        Connector::GoogleMaps,
    ],
};

pub const PLANNING_SPEC: AgentSpec = AgentSpec {
    name: PLANNING_AGENT,
    description: "Generates meal plans and shopping lists based on context data",
    instruction: prompts::PLANNING_AGENT_PROMPT,
    temperature: 0.7,
    connectors: &[
        Connector::Mongodb,
        Connector::GoogleCalendar,
        Connector::GoogleMaps,
    ],
};

pub const DECISION_SPEC: AgentSpec = AgentSpec {
    name: DECISION_AGENT,
    description: "Compares prices across vendors and selects optimal options",
    instruction: prompts::DECISION_AGENT_PROMPT,
    temperature: 0.2,
    connectors: &[Connector::Mongodb, Connector::Instacart],
};

pub const EXECUTION_SPEC: AgentSpec = AgentSpec {
    name: EXECUTION_AGENT,
    description: "Executes orders and tracks delivery status",
    instruction: prompts::EXECUTION_AGENT_PROMPT,
    temperature: 0.1,
    connectors: &[Connector::Mongodb, Connector::Instacart, Connector::Gmail],
};

pub const COORDINATOR_SPEC: AgentSpec = AgentSpec {
    name: COORDINATOR_AGENT,
    description: "Orchestrates multi-agent workflows for grocery planning and ordering",
    instruction: prompts::COORDINATOR_PROMPT,
    temperature: 0.3,
    connectors: &[],
};

/// Sub-agents in delegation order.
pub fn sub_agent_specs() -> [AgentSpec; 4] {
    [CONTEXT_SPEC, PLANNING_SPEC, DECISION_SPEC, EXECUTION_SPEC]
}

pub fn agent_specs() -> Vec<AgentSpec> {
    let mut specs = vec![COORDINATOR_SPEC];
    specs.extend(sub_agent_specs());
    specs
}

pub fn find_agent_spec(name: &str) -> Result<AgentSpec> {
    let trimmed = name.trim();
    agent_specs()
        .into_iter()
        .find(|spec| spec.name == trimmed)
        .ok_or_else(|| {
            let names = agent_specs()
                .iter()
                .map(|spec| spec.name)
                .collect::<Vec<&str>>();
            anyhow::anyhow!(
                "agent '{}' not found. Available agents: {}",
                trimmed,
                names.join(", ")
            )
        })
}

fn connector_names(spec: &AgentSpec) -> String {
    if spec.name == COORDINATOR_AGENT {
        return sub_agent_specs()
            .iter()
            .map(|sub| sub.name)
            .collect::<Vec<&str>>()
            .join(", ");
    }
    spec.connectors
        .iter()
        .map(|connector| connector.name())
        .collect::<Vec<&str>>()
        .join(", ")
}

pub fn run_agents_list(model_name: &str) -> Result<()> {
    println!("Agents (model='{}'):", model_name);
    for spec in agent_specs() {
        let marker = if spec.name == COORDINATOR_AGENT { "*" } else { " " };
        println!(
            "{marker} {} temperature={:.1} tools=[{}]",
            spec.name,
            spec.temperature,
            connector_names(&spec)
        );
    }
    Ok(())
}

pub fn run_agents_show(name: &str) -> Result<()> {
    let spec = find_agent_spec(name)?;
    println!("Agent: {}", spec.name);
    println!("Description: {}", spec.description);
    println!("Temperature: {:.1}", spec.temperature);
    if spec.name == COORDINATOR_AGENT {
        println!("Delegates to: {}", connector_names(&spec));
    } else {
        println!("Connectors: {}", connector_names(&spec));
    }
    println!("Instruction:\n{}", spec.instruction);
    Ok(())
}
