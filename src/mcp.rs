use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use adk_rust::ReadonlyContext;
use adk_rust::prelude::*;
use adk_tool::{McpHttpClientBuilder, McpToolset};
use anyhow::{Context, Result};
use rmcp::ServiceExt;
use rmcp::transport::TokioChildProcess;

use crate::cli::ToolSource;
use crate::config::{ConnectorConfig, RuntimeConfig, display_secret};
use crate::connectors::{Connector, LaunchSpec, credentials, launch_spec};
use crate::tools::build_declared_tools;

const DEFAULT_CONNECTOR_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
struct ConnectorDiscoveryContext {
    user_content: Content,
    user_id: String,
    app_name: String,
}

impl ConnectorDiscoveryContext {
    fn new(cfg: &RuntimeConfig) -> Self {
        Self {
            user_content: Content::new("user").with_text("discover connector tools"),
            user_id: cfg.user_id.clone(),
            app_name: cfg.app_name.clone(),
        }
    }
}

impl ReadonlyContext for ConnectorDiscoveryContext {
    fn invocation_id(&self) -> &str {
        "connector-discovery"
    }
    fn agent_name(&self) -> &str {
        "connector-manager"
    }
    fn user_id(&self) -> &str {
        &self.user_id
    }
    fn app_name(&self) -> &str {
        &self.app_name
    }
    fn session_id(&self) -> &str {
        "connector-discovery"
    }
    fn branch(&self) -> &str {
        "main"
    }
    fn user_content(&self) -> &Content {
        &self.user_content
    }
}

/// Tools per connector. A connector whose server could not be reached has
/// no entry, and agents wired to it simply go without those tools.
#[derive(Clone, Default)]
pub struct ConnectorToolsets {
    toolsets: BTreeMap<Connector, Vec<Arc<dyn Tool>>>,
}

impl ConnectorToolsets {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, connector: Connector, tools: Vec<Arc<dyn Tool>>) {
        self.toolsets.insert(connector, tools);
    }

    pub fn is_available(&self, connector: Connector) -> bool {
        self.toolsets.contains_key(&connector)
    }

    pub fn available(&self) -> Vec<Connector> {
        self.toolsets.keys().copied().collect()
    }

    pub fn tools_for(&self, connectors: &[Connector]) -> Vec<Arc<dyn Tool>> {
        connectors
            .iter()
            .filter_map(|connector| self.toolsets.get(connector))
            .flat_map(|tools| tools.iter().cloned())
            .collect()
    }

    pub fn tool_count(&self) -> usize {
        self.toolsets.values().map(Vec::len).sum()
    }
}

fn connector_timeout(entry: Option<&ConnectorConfig>) -> Duration {
    Duration::from_secs(
        entry
            .and_then(|entry| entry.timeout_secs)
            .unwrap_or(DEFAULT_CONNECTOR_TIMEOUT_SECS)
            .max(1),
    )
}

/// Stdio launch spec after applying any profile override.
pub fn effective_launch_spec(cfg: &RuntimeConfig, connector: Connector) -> LaunchSpec {
    let mut spec = launch_spec(connector, &cfg.settings);
    if let Some(entry) = cfg.connector_config(connector)
        && let Some(command) = entry.command.as_deref()
    {
        spec.command = command.to_string();
        spec.args = entry.args.clone();
    }
    spec
}

async fn discover_stdio_tools(
    connector: Connector,
    spec: &LaunchSpec,
    timeout: Duration,
    allowlist: Vec<String>,
    ctx: Arc<dyn ReadonlyContext>,
) -> Result<Vec<Arc<dyn Tool>>> {
    let mut command = tokio::process::Command::new(&spec.command);
    command.args(&spec.args);
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let transport = TokioChildProcess::new(command).with_context(|| {
        format!(
            "failed to spawn MCP server for connector '{}' ({})",
            connector.name(),
            spec.command
        )
    })?;
    let client = tokio::time::timeout(timeout, ().serve(transport))
        .await
        .with_context(|| {
            format!(
                "connector '{}' MCP handshake timed out after {}s",
                connector.name(),
                timeout.as_secs()
            )
        })?
        .with_context(|| {
            format!(
                "failed to initialize MCP session for connector '{}'",
                connector.name()
            )
        })?;

    let mut toolset = McpToolset::new(client).with_name(format!("mcp:{}", connector.name()));
    if !allowlist.is_empty() {
        toolset = toolset.with_filter(move |tool_name| {
            allowlist.iter().any(|allowed_name| allowed_name == tool_name)
        });
    }
    toolset.tools(ctx).await.with_context(|| {
        format!(
            "failed to discover MCP tools for connector '{}'",
            connector.name()
        )
    })
}

pub async fn discover_connector_tools(
    cfg: &RuntimeConfig,
    connector: Connector,
) -> Result<Vec<Arc<dyn Tool>>> {
    let entry = cfg.connector_config(connector);
    let timeout = connector_timeout(entry);
    let allowlist = entry
        .map(|entry| entry.tool_allowlist.clone())
        .unwrap_or_default();
    let ctx: Arc<dyn ReadonlyContext> = Arc::new(ConnectorDiscoveryContext::new(cfg));

    if let Some(endpoint) = entry.and_then(|entry| entry.endpoint.clone()) {
        let mut toolset = McpHttpClientBuilder::new(endpoint.clone())
            .timeout(timeout)
            .connect()
            .await
            .with_context(|| {
                format!(
                    "failed to connect to MCP server for connector '{}' at {}",
                    connector.name(),
                    endpoint
                )
            })?
            .with_name(format!("mcp:{}", connector.name()));
        if !allowlist.is_empty() {
            toolset = toolset.with_filter(move |tool_name| {
                allowlist.iter().any(|allowed_name| allowed_name == tool_name)
            });
        }
        return toolset.tools(ctx).await.with_context(|| {
            format!(
                "failed to discover MCP tools for connector '{}' ({})",
                connector.name(),
                endpoint
            )
        });
    }

    let spec = effective_launch_spec(cfg, connector);
    discover_stdio_tools(connector, &spec, timeout, allowlist, ctx).await
}

/// Builds the per-connector toolsets for the configured tool source.
/// Unreachable connectors are logged and left out; startup never fails here.
pub async fn resolve_connector_toolsets(cfg: &RuntimeConfig) -> ConnectorToolsets {
    let mut toolsets = ConnectorToolsets::empty();
    let enabled = Connector::ALL
        .into_iter()
        .filter(|connector| cfg.connector_enabled(*connector));

    match cfg.tool_source {
        ToolSource::None => {}
        ToolSource::Declared => {
            for connector in enabled {
                toolsets.insert(connector, build_declared_tools(connector));
            }
        }
        ToolSource::Mcp => {
            for connector in enabled {
                match discover_connector_tools(cfg, connector).await {
                    Ok(tools) => {
                        tracing::info!(
                            connector = connector.name(),
                            tools = tools.len(),
                            "connector tools discovered"
                        );
                        toolsets.insert(connector, tools);
                    }
                    Err(err) => {
                        tracing::warn!(
                            connector = connector.name(),
                            error = %err,
                            "connector MCP server not available; continuing without its tools"
                        );
                    }
                }
            }
        }
    }

    tracing::info!(
        source = ?cfg.tool_source,
        connectors = toolsets.available().len(),
        tools = toolsets.tool_count(),
        "resolved connector toolsets"
    );
    toolsets
}

pub fn run_mcp_list(cfg: &RuntimeConfig) -> Result<()> {
    println!(
        "Connector MCP servers for profile '{}' (tool source: {:?}):",
        cfg.profile, cfg.tool_source
    );
    for connector in Connector::ALL {
        let enabled = cfg.connector_enabled(connector);
        let entry = cfg.connector_config(connector);
        let transport = match entry.and_then(|entry| entry.endpoint.as_deref()) {
            Some(endpoint) => format!("http {endpoint}"),
            None => {
                let spec = effective_launch_spec(cfg, connector);
                let args = if connector == Connector::Mongodb && !cfg.show_sensitive_config {
                    spec.args
                        .iter()
                        .map(|arg| crate::error::redact_uri_credentials(arg))
                        .collect::<Vec<String>>()
                } else {
                    spec.args.clone()
                };
                format!("stdio {} {}", spec.command, args.join(" "))
            }
        };
        let creds = credentials(connector, &cfg.settings)
            .into_iter()
            .map(|(key, value)| format!("{key}={}", display_secret(cfg, &value)))
            .collect::<Vec<String>>();
        println!(
            "- {} enabled={} timeout={}s transport=[{}] credentials=[{}]",
            connector.name(),
            enabled,
            connector_timeout(entry).as_secs(),
            transport,
            if creds.is_empty() {
                "<none>".to_string()
            } else {
                creds.join(", ")
            }
        );
    }
    Ok(())
}

pub async fn run_mcp_discover(cfg: &RuntimeConfig, connector: Option<Connector>) -> Result<()> {
    let targets = match connector {
        Some(connector) => {
            if !cfg.connector_enabled(connector) {
                return Err(anyhow::anyhow!(
                    "connector '{}' is disabled in profile '{}'",
                    connector.name(),
                    cfg.profile
                ));
            }
            vec![connector]
        }
        None => Connector::ALL
            .into_iter()
            .filter(|connector| cfg.connector_enabled(*connector))
            .collect(),
    };

    let mut failures = 0usize;
    for connector in targets {
        match discover_connector_tools(cfg, connector).await {
            Ok(tools) => {
                println!(
                    "Connector '{}' reachable. Discovered {} tool(s):",
                    connector.name(),
                    tools.len()
                );
                for tool in tools {
                    println!("- {}", tool.name());
                }
            }
            Err(err) => {
                failures += 1;
                eprintln!(
                    "[CONNECTOR] discovery failed for '{}': {:#}",
                    connector.name(),
                    err
                );
            }
        }
    }

    if failures > 0 {
        return Err(anyhow::anyhow!(
            "connector discovery completed with {} failure(s). Check credentials and retry.",
            failures
        ));
    }
    Ok(())
}
