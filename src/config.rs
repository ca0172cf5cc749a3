use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::*;
use crate::connectors::Connector;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_MONGODB_DATABASE: &str = "edwardo_db";
pub const DEFAULT_USER_ID: &str = "demo_user_001";

/// Service credentials and application settings. Every field has a static
/// default so the assistant starts with nothing configured.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub google_api_key: String,
    pub gemini_model: String,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub google_calendar_client_id: String,
    pub google_calendar_client_secret: String,
    pub gmail_client_id: String,
    pub gmail_client_secret: String,
    pub plaid_client_id: String,
    pub plaid_secret: String,
    pub plaid_env: PlaidEnv,
    pub instacart_api_key: String,
    pub instacart_user_token: String,
    pub amazon_fresh_access_key: String,
    pub amazon_fresh_secret_key: String,
    pub google_maps_api_key: String,
    pub app_env: AppEnv,
    pub log_level: LogLevel,
    pub agent_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            google_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            mongodb_uri: DEFAULT_MONGODB_URI.to_string(),
            mongodb_database: DEFAULT_MONGODB_DATABASE.to_string(),
            google_calendar_client_id: String::new(),
            google_calendar_client_secret: String::new(),
            gmail_client_id: String::new(),
            gmail_client_secret: String::new(),
            plaid_client_id: String::new(),
            plaid_secret: String::new(),
            plaid_env: PlaidEnv::Sandbox,
            instacart_api_key: String::new(),
            instacart_user_token: String::new(),
            amazon_fresh_access_key: String::new(),
            amazon_fresh_secret_key: String::new(),
            google_maps_api_key: String::new(),
            app_env: AppEnv::Development,
            log_level: LogLevel::Info,
            agent_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub profile: String,
    pub config_path: String,
    pub settings: Settings,
    pub provider: Provider,
    pub model: Option<String>,
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub pace_ms: u64,
    pub workflow_backend: WorkflowBackendKind,
    pub tool_source: ToolSource,
    pub telemetry_enabled: bool,
    pub telemetry_path: String,
    pub show_sensitive_config: bool,
    pub connectors: Vec<ConnectorConfig>,
}

impl RuntimeConfig {
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.agent_timeout_seconds.max(1))
    }

    /// Profile override for a connector, if any.
    pub fn connector_config(&self, connector: Connector) -> Option<&ConnectorConfig> {
        self.connectors.iter().find(|entry| entry.name == connector)
    }

    pub fn connector_enabled(&self, connector: Connector) -> bool {
        self.connector_config(connector)
            .and_then(|entry| entry.enabled)
            .unwrap_or(true)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub app_name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub pace_ms: Option<u64>,
    pub workflow_backend: Option<WorkflowBackendKind>,
    pub tool_source: Option<ToolSource>,
    pub telemetry_enabled: Option<bool>,
    pub telemetry_path: Option<String>,
    pub gemini_model: Option<String>,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: Option<String>,
    pub plaid_env: Option<PlaidEnv>,
    pub app_env: Option<AppEnv>,
    pub log_level: Option<LogLevel>,
    pub agent_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub connectors: Vec<ConnectorConfig>,
}

/// Per-profile connector override. `endpoint` switches the connector to a
/// streamable HTTP MCP server; `command`/`args` replace the stdio launcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    pub name: Connector,
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub tool_allowlist: Vec<String>,
}

pub fn load_profiles(config_path: &str) -> Result<ProfilesFile> {
    let path = Path::new(config_path);
    if !path.exists() {
        return Ok(ProfilesFile::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile config file at '{}'", path.display()))?;
    toml::from_str::<ProfilesFile>(&content).with_context(|| {
        format!(
            "invalid profile configuration in '{}'. Check enum values and field names.",
            path.display()
        )
    })
}

fn select_profile(cli: &Cli, profiles: &ProfilesFile) -> Result<ProfileConfig> {
    let selected = cli.profile.trim();
    if selected.is_empty() {
        return Err(anyhow::anyhow!(
            "profile name cannot be empty. Set --profile <name>."
        ));
    }

    if selected == "default" && !profiles.profiles.contains_key("default") {
        return Ok(ProfileConfig::default());
    }

    profiles.profiles.get(selected).cloned().ok_or_else(|| {
        let mut names = profiles.profiles.keys().cloned().collect::<Vec<String>>();
        names.sort();
        if names.is_empty() {
            anyhow::anyhow!(
                "profile '{}' not found in '{}'. No profiles are defined yet.",
                selected,
                cli.config_path
            )
        } else {
            anyhow::anyhow!(
                "profile '{}' not found in '{}'. Available profiles: {}",
                selected,
                cli.config_path,
                names.join(", ")
            )
        }
    })
}

fn pick(flag: &Option<String>, fallback: Option<String>, default: &str) -> String {
    flag.clone()
        .or(fallback)
        .unwrap_or_else(|| default.to_string())
}

pub fn resolve_settings(cli: &Cli, profile: &ProfileConfig) -> Settings {
    let defaults = Settings::default();
    Settings {
        google_api_key: pick(&cli.google_api_key, None, ""),
        gemini_model: pick(
            &cli.gemini_model,
            profile.gemini_model.clone(),
            &defaults.gemini_model,
        ),
        mongodb_uri: pick(
            &cli.mongodb_uri,
            profile.mongodb_uri.clone(),
            &defaults.mongodb_uri,
        ),
        mongodb_database: pick(
            &cli.mongodb_database,
            profile.mongodb_database.clone(),
            &defaults.mongodb_database,
        ),
        google_calendar_client_id: pick(&cli.google_calendar_client_id, None, ""),
        google_calendar_client_secret: pick(&cli.google_calendar_client_secret, None, ""),
        gmail_client_id: pick(&cli.gmail_client_id, None, ""),
        gmail_client_secret: pick(&cli.gmail_client_secret, None, ""),
        plaid_client_id: pick(&cli.plaid_client_id, None, ""),
        plaid_secret: pick(&cli.plaid_secret, None, ""),
        plaid_env: cli
            .plaid_env
            .or(profile.plaid_env)
            .unwrap_or(defaults.plaid_env),
        instacart_api_key: pick(&cli.instacart_api_key, None, ""),
        instacart_user_token: pick(&cli.instacart_user_token, None, ""),
        amazon_fresh_access_key: pick(&cli.amazon_fresh_access_key, None, ""),
        amazon_fresh_secret_key: pick(&cli.amazon_fresh_secret_key, None, ""),
        google_maps_api_key: pick(&cli.google_maps_api_key, None, ""),
        app_env: cli.app_env.or(profile.app_env).unwrap_or(defaults.app_env),
        log_level: cli
            .log_level
            .or(profile.log_level)
            .unwrap_or(defaults.log_level),
        agent_timeout_seconds: cli
            .agent_timeout_seconds
            .or(profile.agent_timeout_seconds)
            .unwrap_or(defaults.agent_timeout_seconds),
    }
}

fn merge_connector_configs(profile: &ProfileConfig) -> Result<Vec<ConnectorConfig>> {
    let mut seen = BTreeSet::<Connector>::new();
    for entry in &profile.connectors {
        if !seen.insert(entry.name) {
            return Err(anyhow::anyhow!(
                "connector '{}' is configured more than once in the active profile",
                entry.name.name()
            ));
        }
        if entry.endpoint.is_some() && entry.command.is_some() {
            return Err(anyhow::anyhow!(
                "connector '{}' sets both endpoint and command; choose one transport",
                entry.name.name()
            ));
        }
    }
    Ok(profile.connectors.clone())
}

pub fn resolve_runtime_config(cli: &Cli, profiles: &ProfilesFile) -> Result<RuntimeConfig> {
    let profile = select_profile(cli, profiles)?;
    let settings = resolve_settings(cli, &profile);
    let connectors = merge_connector_configs(&profile)?;

    Ok(RuntimeConfig {
        profile: cli.profile.trim().to_string(),
        config_path: cli.config_path.clone(),
        provider: cli
            .provider
            .or(profile.provider)
            .unwrap_or(Provider::Gemini),
        model: cli.model.clone().or(profile.model.clone()),
        app_name: pick(&cli.app_name, profile.app_name.clone(), "edwardo"),
        user_id: pick(&cli.user_id, profile.user_id.clone(), DEFAULT_USER_ID),
        session_id: pick(
            &cli.session_id,
            profile.session_id.clone(),
            "default-session",
        ),
        pace_ms: cli.pace_ms.or(profile.pace_ms).unwrap_or(500),
        workflow_backend: cli
            .workflow_backend
            .or(profile.workflow_backend)
            .unwrap_or(WorkflowBackendKind::Demo),
        tool_source: cli
            .tool_source
            .or(profile.tool_source)
            .unwrap_or(ToolSource::Mcp),
        telemetry_enabled: cli
            .telemetry_enabled
            .or(profile.telemetry_enabled)
            .unwrap_or(true),
        telemetry_path: pick(
            &cli.telemetry_path,
            profile.telemetry_path.clone(),
            ".edwardo/telemetry/events.jsonl",
        ),
        show_sensitive_config: cli.show_sensitive_config,
        settings,
        connectors,
    })
}

/// Renders a secret for display: presence only unless sensitive output is on.
pub fn display_secret(cfg: &RuntimeConfig, value: &str) -> String {
    if value.trim().is_empty() {
        "missing".to_string()
    } else if cfg.show_sensitive_config {
        value.to_string()
    } else {
        "set".to_string()
    }
}

pub fn display_mongodb_uri(cfg: &RuntimeConfig) -> String {
    if cfg.show_sensitive_config {
        cfg.settings.mongodb_uri.clone()
    } else {
        crate::error::redact_uri_credentials(&cfg.settings.mongodb_uri)
    }
}
