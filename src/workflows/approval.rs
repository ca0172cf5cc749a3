use anyhow::Result;
use serde_json::json;

use super::WorkflowEnv;
use super::model::{ApprovalKind, ApprovalOutcome, GenericApproval};
use super::progress::Stage;

/// Carries out whatever the user just approved.
pub struct ApprovalWorkflow {
    approval_id: String,
    user_id: String,
}

impl ApprovalWorkflow {
    pub fn new(approval_id: &str, user_id: &str) -> Self {
        Self {
            approval_id: approval_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    pub async fn execute(&self, env: &WorkflowEnv, kind: &ApprovalKind) -> Result<ApprovalOutcome> {
        env.progress.workflow_started(
            "📋 Processing Approval",
            &[
                ("Approval ID", self.approval_id.clone()),
                ("Type", kind.to_string()),
            ],
        );
        env.telemetry.emit(
            "workflow.started",
            json!({
                "workflow": "approval",
                "approval_id": self.approval_id,
                "approval_type": kind,
                "backend": env.backend.name()
            }),
        );

        match self.dispatch(env, kind).await {
            Ok(outcome) => {
                env.progress
                    .workflow_completed(&format!("{kind} processed successfully!"));
                env.telemetry.emit(
                    "workflow.completed",
                    json!({ "workflow": "approval", "approval_id": self.approval_id }),
                );
                Ok(outcome)
            }
            Err(err) => {
                env.progress.workflow_failed(&err);
                env.telemetry.emit(
                    "workflow.failed",
                    json!({
                        "workflow": "approval",
                        "approval_id": self.approval_id,
                        "error": format!("{err:#}")
                    }),
                );
                Err(err)
            }
        }
    }

    async fn dispatch(&self, env: &WorkflowEnv, kind: &ApprovalKind) -> Result<ApprovalOutcome> {
        match kind {
            ApprovalKind::GroceryOrder => {
                env.progress.stage_started(Stage::PlaceOrder);
                let order = env
                    .backend
                    .place_grocery_order(&self.approval_id, &self.user_id)
                    .await?;
                env.progress.stage_completed(Stage::PlaceOrder);
                env.telemetry.emit(
                    "stage.completed",
                    json!({ "stage": Stage::PlaceOrder.name(), "order_id": order.order_id }),
                );
                tracing::info!(
                    approval_id = %self.approval_id,
                    order_id = %order.order_id,
                    "grocery order placed"
                );
                Ok(ApprovalOutcome::Order(order))
            }
            ApprovalKind::ErrandSchedule => {
                let booking = env
                    .backend
                    .book_errands(&self.approval_id, &self.user_id)
                    .await?;
                Ok(ApprovalOutcome::Errands(booking))
            }
            other => Ok(ApprovalOutcome::Approved(GenericApproval {
                status: "approved".to_string(),
                message: format!("{other} approved"),
            })),
        }
    }
}
