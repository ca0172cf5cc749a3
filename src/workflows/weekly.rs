use std::collections::BTreeMap;
use std::future::Future;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use serde_json::json;

use super::WorkflowEnv;
use super::local_iso_timestamp;
use super::model::*;
use super::progress::Stage;

/// Savings shown with every plan until a backend can estimate them.
pub const ESTIMATED_SAVINGS: Savings = Savings {
    time_saved_hours: 5,
    money_saved_dollars: 23.45,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Initialized,
    Completed,
    Failed,
}

/// Context, meal plan, grocery list, prices and errands, gathered in that
/// order and bundled into a plan awaiting approval.
pub struct WeeklyPlanningWorkflow {
    user_id: String,
    workflow_id: String,
    status: BTreeMap<&'static str, StageStatus>,
}

impl WeeklyPlanningWorkflow {
    pub fn new(user_id: &str) -> Self {
        let workflow_id = format!(
            "weekly_plan_{}_{}",
            user_id,
            local_iso_timestamp(Local::now())
        );
        Self::with_workflow_id(user_id, workflow_id)
    }

    pub fn with_workflow_id(user_id: &str, workflow_id: String) -> Self {
        Self {
            user_id: user_id.to_string(),
            workflow_id,
            status: BTreeMap::new(),
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn status(&self) -> &BTreeMap<&'static str, StageStatus> {
        &self.status
    }

    pub async fn execute(&mut self, env: &WorkflowEnv) -> Result<WeeklyPlan> {
        env.progress.workflow_started(
            "🚀 Starting Weekly Planning Workflow",
            &[
                ("User ID", self.user_id.clone()),
                ("Workflow ID", self.workflow_id.clone()),
            ],
        );
        env.telemetry.emit(
            "workflow.started",
            json!({
                "workflow": "weekly_planning",
                "workflow_id": self.workflow_id,
                "backend": env.backend.name()
            }),
        );
        tracing::info!(
            workflow_id = %self.workflow_id,
            backend = env.backend.name(),
            "weekly planning started"
        );

        match self.run_stages(env).await {
            Ok(plan) => {
                self.status.insert("workflow", StageStatus::Completed);
                env.progress
                    .workflow_completed("Weekly planning workflow completed successfully!");
                env.telemetry.emit(
                    "workflow.completed",
                    json!({ "workflow": "weekly_planning", "workflow_id": self.workflow_id }),
                );
                Ok(plan)
            }
            Err(err) => {
                self.status.insert("workflow", StageStatus::Failed);
                tracing::error!(
                    workflow_id = %self.workflow_id,
                    error = %format!("{err:#}"),
                    "weekly planning failed"
                );
                env.progress.workflow_failed(&err);
                env.telemetry.emit(
                    "workflow.failed",
                    json!({
                        "workflow": "weekly_planning",
                        "workflow_id": self.workflow_id,
                        "error": format!("{err:#}")
                    }),
                );
                Err(err)
            }
        }
    }

    async fn run_stages(&mut self, env: &WorkflowEnv) -> Result<WeeklyPlan> {
        run_stage(env, Stage::Coordinator, true, async { Ok(()) }).await?;
        self.status.insert("coordinator", StageStatus::Initialized);

        let backend = env.backend.as_ref();
        let context =
            run_stage(env, Stage::Context, true, backend.gather_context(&self.user_id)).await?;
        self.status.insert("context", StageStatus::Completed);

        let meal_plan = run_stage(
            env,
            Stage::MealPlan,
            true,
            backend.generate_meal_plan(&context),
        )
        .await?;
        self.status.insert("planning", StageStatus::Completed);

        let grocery_list = run_stage(
            env,
            Stage::GroceryList,
            true,
            backend.compile_grocery_list(&meal_plan, &context),
        )
        .await?;

        let pricing = run_stage(
            env,
            Stage::Prices,
            true,
            backend.compare_prices(&grocery_list),
        )
        .await?;
        self.status.insert("decision", StageStatus::Completed);

        let errand_schedule = run_stage(
            env,
            Stage::Errands,
            true,
            backend.schedule_errands(&context),
        )
        .await?;

        let workflow_id = self.workflow_id.clone();
        run_stage(env, Stage::Finalize, false, async move {
            finalize_plan(workflow_id, meal_plan, grocery_list, pricing, errand_schedule)
        })
        .await
    }
}

async fn run_stage<T, F>(env: &WorkflowEnv, stage: Stage, pace_after: bool, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    env.progress.stage_started(stage);
    tracing::debug!(stage = stage.name(), "stage started");
    let output = work.await?;
    env.progress.stage_completed(stage);
    env.telemetry.emit("stage.completed", json!({ "stage": stage.name() }));
    if pace_after {
        tokio::time::sleep(env.pace).await;
    }
    Ok(output)
}

pub fn finalize_plan(
    workflow_id: String,
    meal_plan: MealPlan,
    grocery_list: GroceryList,
    pricing: PriceComparison,
    errand_schedule: ErrandSchedule,
) -> Result<WeeklyPlan> {
    let total = pricing
        .recommended_quote()
        .map(|quote| quote.total_cost)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "recommended vendor '{}' is not among the compared vendors",
                pricing.recommended_vendor
            )
        })?;

    Ok(WeeklyPlan {
        workflow_id,
        status: PlanStatus::ReadyForApproval,
        meal_plan,
        grocery_order: GroceryOrder {
            list: grocery_list,
            selected_vendor: pricing.recommended_vendor.clone(),
            pricing,
            total,
        },
        errand_schedule,
        estimated_savings: ESTIMATED_SAVINGS,
        approvals_needed: vec![
            ApprovalKind::GroceryOrder,
            ApprovalKind::MealPlan,
            ApprovalKind::ErrandSchedule,
        ],
    })
}
