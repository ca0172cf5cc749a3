use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use crate::agents::tree::build_agent_tree;
use crate::agents::{run_agents_list, run_agents_show};
use crate::cli::{
    AgentCommands, Cli, Commands, McpCommands, TelemetryCommands, ToolCommands, command_label,
};
use crate::config::{RuntimeConfig, load_profiles, resolve_runtime_config};
use crate::connectors::run_tools_list;
use crate::doctor::run_doctor;
use crate::error::categorize_error;
use crate::mcp::{resolve_connector_toolsets, run_mcp_discover, run_mcp_list};
use crate::provider::{effective_model_name, effective_provider, resolve_model};
use crate::runner::{build_runner, run_prompt};
use crate::telemetry::{TelemetrySink, run_telemetry_report};
use crate::theme::{
    BOLD_GREEN, DIM, RESET, ConsoleProgress, print_approval_outcome, print_banner, print_json,
    print_plan_summary, print_workflow_output,
};
use crate::workflows::approval::ApprovalWorkflow;
use crate::workflows::model::{ApprovalKind, TriggerReason};
use crate::workflows::weekly::WeeklyPlanningWorkflow;
use crate::workflows::{
    WorkflowEnv, WorkflowKind, WorkflowParams, build_backend, run_workflow, run_workflows_list,
};

pub const DEMO_APPROVAL_ID: &str = "appr_12345";

/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init_tracing(filter: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter '{filter}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

pub async fn run_cli(cli: Cli) -> Result<()> {
    let profiles = load_profiles(&cli.config_path)?;
    let cfg = resolve_runtime_config(&cli, &profiles)?;

    let filter = cli
        .log_filter
        .clone()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| cfg.settings.log_level.filter_directive().to_string());
    init_tracing(&filter)?;

    let command = cli.command.unwrap_or(Commands::Demo);
    let telemetry = TelemetrySink::new(&cfg, command_label(&command));
    telemetry.emit(
        "command.started",
        json!({
            "profile": cfg.profile,
            "workflow_backend": format!("{:?}", cfg.workflow_backend).to_ascii_lowercase()
        }),
    );

    let started = Instant::now();
    let result = dispatch(command, &cfg, &telemetry).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(()) => telemetry.emit("command.completed", json!({ "duration_ms": duration_ms })),
        Err(err) => telemetry.emit(
            "command.failed",
            json!({
                "duration_ms": duration_ms,
                "category": categorize_error(err).code(),
                "error": format!("{err:#}")
            }),
        ),
    }

    result
}

async fn dispatch(command: Commands, cfg: &RuntimeConfig, telemetry: &TelemetrySink) -> Result<()> {
    match command {
        Commands::Demo => run_demo(cfg, telemetry).await,
        Commands::Run {
            workflow,
            approval_id,
            approval_type,
            trigger,
            change,
            json,
        } => {
            let kind = WorkflowKind::from_name(&workflow)?;
            let change = parse_change(&change)?;
            let backend = build_backend(cfg, telemetry).await?;
            let env = WorkflowEnv {
                backend,
                progress: Arc::new(ConsoleProgress::new(json)),
                telemetry: telemetry.clone(),
                pace: cfg.pace(),
            };
            let params = WorkflowParams {
                user_id: cfg.user_id.clone(),
                approval_id,
                approval_kind: ApprovalKind::from(approval_type),
                trigger: TriggerReason::from(trigger),
                change,
            };

            let output = run_workflow(kind, &env, &params).await?;
            if json {
                print_json(&output)?;
            } else {
                print_workflow_output(&output);
            }
            Ok(())
        }
        Commands::Workflows => {
            run_workflows_list();
            Ok(())
        }
        Commands::Ask { prompt } => run_ask(cfg, telemetry, &prompt.join(" ")).await,
        Commands::Agents { command } => match command {
            AgentCommands::List => {
                let model_name = effective_provider(cfg)
                    .map(|provider| effective_model_name(cfg, provider))
                    .unwrap_or_else(|_| cfg.settings.gemini_model.clone());
                run_agents_list(&model_name)
            }
            AgentCommands::Show { name } => run_agents_show(&name),
        },
        Commands::Mcp { command } => match command {
            McpCommands::List => run_mcp_list(cfg),
            McpCommands::Discover { connector } => run_mcp_discover(cfg, connector).await,
        },
        Commands::Tools { command } => match command {
            ToolCommands::List { connector, schema } => run_tools_list(connector, schema),
        },
        Commands::Doctor => run_doctor(cfg),
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { path, limit } => run_telemetry_report(cfg, path, limit),
        },
    }
}

/// `--change` must be a JSON object; an empty flag means no details.
pub fn parse_change(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(json!({}));
    }
    let value = serde_json::from_str::<Value>(trimmed)
        .with_context(|| format!("--change is not valid JSON: {trimmed}"))?;
    if !value.is_object() {
        return Err(anyhow::anyhow!(
            "--change must be a JSON object, got: {trimmed}"
        ));
    }
    Ok(value)
}

/// Weekly planning followed by a simulated approval of the grocery order.
async fn run_demo(cfg: &RuntimeConfig, telemetry: &TelemetrySink) -> Result<()> {
    let model_name = effective_provider(cfg)
        .map(|provider| effective_model_name(cfg, provider))
        .unwrap_or_else(|_| cfg.settings.gemini_model.clone());
    print_banner(cfg.settings.app_env.as_str(), &model_name);

    let backend = build_backend(cfg, telemetry).await?;
    let env = WorkflowEnv {
        backend,
        progress: Arc::new(ConsoleProgress::new(false)),
        telemetry: telemetry.clone(),
        pace: cfg.pace(),
    };

    let mut weekly = WeeklyPlanningWorkflow::new(&cfg.user_id);
    let plan = weekly.execute(&env).await?;
    print_plan_summary(&plan);

    println!("{DIM}Simulating user approval...{RESET}");
    let approval = ApprovalWorkflow::new(DEMO_APPROVAL_ID, &cfg.user_id);
    let outcome = approval.execute(&env, &ApprovalKind::GroceryOrder).await?;
    print_approval_outcome(&outcome);

    println!();
    println!("{BOLD_GREEN}🎉 Demo completed successfully!{RESET}");
    Ok(())
}

async fn run_ask(cfg: &RuntimeConfig, telemetry: &TelemetrySink, prompt: &str) -> Result<()> {
    let (model, provider, model_name) = resolve_model(cfg)?;
    tracing::info!(provider = ?provider, model = %model_name, "Using model");

    let toolsets = resolve_connector_toolsets(cfg).await;
    let tree = build_agent_tree(model, &toolsets, cfg, telemetry)?;
    let runner = build_runner(tree.coordinator.clone(), cfg, &cfg.session_id).await?;
    let answer = run_prompt(&runner, cfg, &cfg.session_id, prompt, telemetry).await?;
    println!("{answer}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_accepts_objects_and_empty_input() {
        assert_eq!(parse_change("").expect("empty"), json!({}));
        assert_eq!(
            parse_change(r#"{"item":"milk"}"#).expect("object"),
            json!({"item": "milk"})
        );
    }

    #[test]
    fn change_rejects_non_objects() {
        let err = parse_change("[1,2]").expect_err("array is rejected");
        assert!(err.to_string().contains("--change"));
        let err = parse_change("{not json").expect_err("malformed is rejected");
        assert!(err.to_string().contains("--change"));
    }
}
