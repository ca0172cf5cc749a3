use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::connectors::Connector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Auto,
    Gemini,
    Openai,
    Anthropic,
    Deepseek,
    Groq,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaidEnv {
    Sandbox,
    Development,
    Production,
}

impl PlaidEnv {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaidEnv::Sandbox => "sandbox",
            PlaidEnv::Development => "development",
            PlaidEnv::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    Staging,
    Production,
}

impl AppEnv {
    pub fn as_str(self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Staging => "staging",
            AppEnv::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
pub enum LogLevel {
    #[serde(alias = "debug", rename = "DEBUG")]
    Debug,
    #[serde(alias = "info", rename = "INFO")]
    Info,
    #[serde(alias = "warning", rename = "WARNING")]
    Warning,
    #[serde(alias = "error", rename = "ERROR")]
    Error,
    #[serde(alias = "critical", rename = "CRITICAL")]
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowBackendKind {
    Demo,
    Agents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    Mcp,
    Declared,
    None,
}

#[derive(Debug, Subcommand)]
pub enum AgentCommands {
    #[command(about = "List the coordinator and its sub-agents")]
    List,
    #[command(about = "Show one agent's description, temperature, connectors and instruction")]
    Show {
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum McpCommands {
    #[command(about = "List connector MCP launch specs and credential status")]
    List,
    #[command(about = "Start connector MCP servers and list the tools they expose")]
    Discover {
        #[arg(long, value_enum)]
        connector: Option<Connector>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ToolCommands {
    #[command(about = "Print the static tool declarations per connector")]
    List {
        #[arg(long, value_enum)]
        connector: Option<Connector>,
        #[arg(long, default_value_t = false)]
        schema: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum TelemetryCommands {
    #[command(about = "Summarize telemetry events from a JSONL stream")]
    Report {
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 5000)]
        limit: usize,
    },
}

const CLI_EXAMPLES: &str = "Examples:\n\
  edwardo\n\
  edwardo demo --pace-ms 0\n\
  edwardo run weekly_planning --json\n\
  edwardo run approval --approval-id appr_12345 --approval-type grocery_order\n\
  edwardo run adaptive_replan --trigger pantry_item_depleted --change '{\"item\":\"milk\"}'\n\
  edwardo --workflow-backend agents run weekly_planning\n\
  edwardo ask \"Plan my meals for next week and find the cheapest delivery\"\n\
  edwardo agents list\n\
  edwardo tools list --connector instacart --schema\n\
  edwardo mcp discover --connector google-maps\n\
  edwardo telemetry report --limit 2000";

#[derive(Debug, Parser)]
#[command(name = "edwardo")]
#[command(about = "Autonomous life assistant: meal planning, grocery shopping, and errands")]
#[command(after_long_help = CLI_EXAMPLES)]
pub struct Cli {
    #[arg(long, env = "EDWARDO_PROVIDER", value_enum)]
    pub provider: Option<Provider>,

    #[arg(long, env = "EDWARDO_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "EDWARDO_PROFILE", default_value = "default")]
    pub profile: String,

    #[arg(long, env = "EDWARDO_CONFIG", default_value = ".edwardo/config.toml")]
    pub config_path: String,

    #[arg(long, env = "EDWARDO_APP_NAME")]
    pub app_name: Option<String>,

    #[arg(long, env = "EDWARDO_USER_ID")]
    pub user_id: Option<String>,

    #[arg(long, env = "EDWARDO_SESSION_ID")]
    pub session_id: Option<String>,

    #[arg(long, env = "EDWARDO_PACE_MS")]
    pub pace_ms: Option<u64>,

    #[arg(long, env = "EDWARDO_WORKFLOW_BACKEND", value_enum)]
    pub workflow_backend: Option<WorkflowBackendKind>,

    #[arg(long, env = "EDWARDO_TOOL_SOURCE", value_enum)]
    pub tool_source: Option<ToolSource>,

    #[arg(long, env = "EDWARDO_TELEMETRY_ENABLED", action = clap::ArgAction::Set)]
    pub telemetry_enabled: Option<bool>,

    #[arg(long, env = "EDWARDO_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    #[arg(long, env = "EDWARDO_SHOW_SENSITIVE_CONFIG", default_value_t = false)]
    pub show_sensitive_config: bool,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,

    #[arg(long, env = "MONGODB_DATABASE")]
    pub mongodb_database: Option<String>,

    #[arg(long, env = "GOOGLE_CALENDAR_CLIENT_ID")]
    pub google_calendar_client_id: Option<String>,

    #[arg(long, env = "GOOGLE_CALENDAR_CLIENT_SECRET", hide_env_values = true)]
    pub google_calendar_client_secret: Option<String>,

    #[arg(long, env = "GMAIL_CLIENT_ID")]
    pub gmail_client_id: Option<String>,

    #[arg(long, env = "GMAIL_CLIENT_SECRET", hide_env_values = true)]
    pub gmail_client_secret: Option<String>,

    #[arg(long, env = "PLAID_CLIENT_ID")]
    pub plaid_client_id: Option<String>,

    #[arg(long, env = "PLAID_SECRET", hide_env_values = true)]
    pub plaid_secret: Option<String>,

    #[arg(long, env = "PLAID_ENV", value_enum, ignore_case = true)]
    pub plaid_env: Option<PlaidEnv>,

    #[arg(long, env = "INSTACART_API_KEY", hide_env_values = true)]
    pub instacart_api_key: Option<String>,

    #[arg(long, env = "INSTACART_USER_TOKEN", hide_env_values = true)]
    pub instacart_user_token: Option<String>,

    #[arg(long, env = "AMAZON_FRESH_ACCESS_KEY", hide_env_values = true)]
    pub amazon_fresh_access_key: Option<String>,

    #[arg(long, env = "AMAZON_FRESH_SECRET_KEY", hide_env_values = true)]
    pub amazon_fresh_secret_key: Option<String>,

    #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    pub google_maps_api_key: Option<String>,

    #[arg(long, env = "APP_ENV", value_enum, ignore_case = true)]
    pub app_env: Option<AppEnv>,

    #[arg(long, env = "LOG_LEVEL", value_enum, ignore_case = true)]
    pub log_level: Option<LogLevel>,

    #[arg(long, env = "AGENT_TIMEOUT_SECONDS")]
    pub agent_timeout_seconds: Option<u64>,

    /// Overrides the filter derived from the log level.
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Run the weekly planning demo followed by a simulated order approval")]
    Demo,
    #[command(about = "Run one registered workflow (weekly_planning, approval, adaptive_replan)")]
    Run {
        workflow: String,
        #[arg(long, default_value = "appr_12345")]
        approval_id: String,
        #[arg(long, default_value = "grocery_order")]
        approval_type: String,
        #[arg(long, default_value = "pantry_item_depleted")]
        trigger: String,
        /// JSON object describing what changed.
        #[arg(long, default_value = "{}")]
        change: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    #[command(about = "List registered workflows")]
    Workflows,
    #[command(about = "Send a request to the coordinator agent and print its reply")]
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    #[command(about = "Inspect agent definitions")]
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },
    #[command(about = "Inspect and discover connector MCP servers")]
    Mcp {
        #[command(subcommand)]
        command: McpCommands,
    },
    #[command(about = "Inspect connector tool declarations")]
    Tools {
        #[command(subcommand)]
        command: ToolCommands,
    },
    #[command(about = "Check provider credentials, connector settings and runtime configuration")]
    Doctor,
    #[command(about = "Telemetry utilities and reporting")]
    Telemetry {
        #[command(subcommand)]
        command: TelemetryCommands,
    },
}

pub fn command_label(command: &Commands) -> String {
    match command {
        Commands::Demo => "demo".to_string(),
        Commands::Run { workflow, .. } => format!("run.{}", workflow.trim()),
        Commands::Workflows => "workflows".to_string(),
        Commands::Ask { .. } => "ask".to_string(),
        Commands::Agents { command } => match command {
            AgentCommands::List => "agents.list".to_string(),
            AgentCommands::Show { .. } => "agents.show".to_string(),
        },
        Commands::Mcp { command } => match command {
            McpCommands::List => "mcp.list".to_string(),
            McpCommands::Discover { .. } => "mcp.discover".to_string(),
        },
        Commands::Tools { command } => match command {
            ToolCommands::List { .. } => "tools.list".to_string(),
        },
        Commands::Doctor => "doctor".to_string(),
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { .. } => "telemetry.report".to_string(),
        },
    }
}
