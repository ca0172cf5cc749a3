/// Planning workflows and the registry that names them.
///
/// Each workflow sequences stage calls on a [`backend::PlanningBackend`]
/// and reports through a [`progress::ProgressSink`]. The demo backend
/// returns canned payloads; the agent backend asks the sub-agents.
pub mod agent_backend;
pub mod approval;
pub mod backend;
pub mod model;
pub mod progress;
pub mod replan;
pub mod weekly;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use serde_json::Value;

use crate::agents::tree::build_agent_tree;
use crate::cli::WorkflowBackendKind;
use crate::config::RuntimeConfig;
use crate::mcp::resolve_connector_toolsets;
use crate::provider::resolve_model;
use crate::telemetry::TelemetrySink;
use agent_backend::AgentBackend;
use approval::ApprovalWorkflow;
use backend::{DemoBackend, PlanningBackend};
use model::{ApprovalKind, ApprovalOutcome, ReplanOutcome, TriggerReason, WeeklyPlan};
use progress::ProgressSink;
use replan::AdaptiveRePlanningWorkflow;
use weekly::WeeklyPlanningWorkflow;

/// Local wall-clock time with microseconds and no offset.
pub fn local_iso_timestamp<Tz: TimeZone>(at: DateTime<Tz>) -> String {
    at.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// What every workflow runs against.
#[derive(Clone)]
pub struct WorkflowEnv {
    pub backend: Arc<dyn PlanningBackend>,
    pub progress: Arc<dyn ProgressSink>,
    pub telemetry: TelemetrySink,
    pub pace: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    WeeklyPlanning,
    Approval,
    AdaptiveReplan,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 3] = [
        WorkflowKind::WeeklyPlanning,
        WorkflowKind::Approval,
        WorkflowKind::AdaptiveReplan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WorkflowKind::WeeklyPlanning => "weekly_planning",
            WorkflowKind::Approval => "approval",
            WorkflowKind::AdaptiveReplan => "adaptive_replan",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WorkflowKind::WeeklyPlanning => {
                "context -> meal plan -> grocery list -> prices -> errands -> plan for approval"
            }
            WorkflowKind::Approval => "execute an approved grocery order, errand schedule or plan",
            WorkflowKind::AdaptiveReplan => "assess a change and re-plan when the impact warrants it",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == trimmed)
            .ok_or_else(|| anyhow::anyhow!("Unknown workflow: {}", trimmed))
    }
}

/// Inputs for a single workflow run. Each workflow reads only its own fields.
#[derive(Debug, Clone)]
pub struct WorkflowParams {
    pub user_id: String,
    pub approval_id: String,
    pub approval_kind: ApprovalKind,
    pub trigger: TriggerReason,
    pub change: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WorkflowOutput {
    Plan(WeeklyPlan),
    Approval(ApprovalOutcome),
    Replan(ReplanOutcome),
}

pub async fn run_workflow(
    kind: WorkflowKind,
    env: &WorkflowEnv,
    params: &WorkflowParams,
) -> Result<WorkflowOutput> {
    match kind {
        WorkflowKind::WeeklyPlanning => {
            let mut workflow = WeeklyPlanningWorkflow::new(&params.user_id);
            workflow.execute(env).await.map(WorkflowOutput::Plan)
        }
        WorkflowKind::Approval => ApprovalWorkflow::new(&params.approval_id, &params.user_id)
            .execute(env, &params.approval_kind)
            .await
            .map(WorkflowOutput::Approval),
        WorkflowKind::AdaptiveReplan => {
            AdaptiveRePlanningWorkflow::new(&params.user_id, params.trigger.clone())
                .execute(env, &params.change)
                .await
                .map(WorkflowOutput::Replan)
        }
    }
}

/// Backend for the configured mode. The agent backend needs a model and
/// starts whichever connector servers are reachable.
pub async fn build_backend(
    cfg: &RuntimeConfig,
    telemetry: &TelemetrySink,
) -> Result<Arc<dyn PlanningBackend>> {
    match cfg.workflow_backend {
        WorkflowBackendKind::Demo => Ok(Arc::new(DemoBackend::new(cfg.pace()))),
        WorkflowBackendKind::Agents => {
            let (model, provider, model_name) = resolve_model(cfg)?;
            telemetry.emit(
                "model.resolved",
                serde_json::json!({
                    "provider": format!("{:?}", provider).to_ascii_lowercase(),
                    "model": model_name,
                    "path": "workflow"
                }),
            );
            let toolsets = resolve_connector_toolsets(cfg).await;
            let tree = build_agent_tree(model, &toolsets, cfg, telemetry)?;
            Ok(Arc::new(AgentBackend::new(tree, cfg.clone(), telemetry.clone())))
        }
    }
}

pub fn run_workflows_list() {
    println!("Registered workflows:");
    for kind in WorkflowKind::ALL {
        println!("- {}: {}", kind.name(), kind.description());
    }
}
