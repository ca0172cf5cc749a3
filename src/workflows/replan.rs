use anyhow::Result;
use serde_json::{Value, json};

use super::WorkflowEnv;
use super::model::{Impact, PlanComponent, ReplanOutcome, Severity, TriggerReason};

pub fn assess_impact(trigger: &TriggerReason) -> Impact {
    match trigger {
        TriggerReason::PantryItemDepleted => Impact {
            severity: Severity::Medium,
            affected: vec![PlanComponent::GroceryList, PlanComponent::MealPlan],
        },
        TriggerReason::CalendarConflict => Impact {
            severity: Severity::High,
            affected: vec![PlanComponent::ErrandSchedule],
        },
        TriggerReason::Other(_) => Impact {
            severity: Severity::Low,
            affected: Vec::new(),
        },
    }
}

/// Re-plans after a change in pantry or schedule. Low-impact changes leave
/// the plan alone.
pub struct AdaptiveRePlanningWorkflow {
    user_id: String,
    trigger: TriggerReason,
}

impl AdaptiveRePlanningWorkflow {
    pub fn new(user_id: &str, trigger: TriggerReason) -> Self {
        Self {
            user_id: user_id.to_string(),
            trigger,
        }
    }

    pub async fn execute(&self, env: &WorkflowEnv, change: &Value) -> Result<ReplanOutcome> {
        env.progress.workflow_started(
            "🔄 Adaptive Re-planning Triggered",
            &[
                ("Reason", self.trigger.to_string()),
                ("Change", change.to_string()),
            ],
        );

        let impact = assess_impact(&self.trigger);
        env.telemetry.emit(
            "workflow.started",
            json!({
                "workflow": "adaptive_replan",
                "trigger": self.trigger,
                "severity": impact.severity,
                "backend": env.backend.name()
            }),
        );
        tracing::info!(
            user_id = %self.user_id,
            trigger = %self.trigger,
            severity = ?impact.severity,
            "assessed re-planning impact"
        );

        if impact.severity == Severity::Low {
            env.progress.note("Low impact - no re-planning needed");
            env.telemetry.emit(
                "workflow.completed",
                json!({ "workflow": "adaptive_replan", "action": "none" }),
            );
            return Ok(ReplanOutcome::low_impact());
        }

        match env.backend.replan(&self.trigger, change, &impact).await {
            Ok(changes) => {
                env.progress.workflow_completed("Re-planning completed!");
                env.telemetry.emit(
                    "workflow.completed",
                    json!({ "workflow": "adaptive_replan", "action": changes.action }),
                );
                Ok(ReplanOutcome::Replanned(changes))
            }
            Err(err) => {
                env.progress.workflow_failed(&err);
                env.telemetry.emit(
                    "workflow.failed",
                    json!({ "workflow": "adaptive_replan", "error": format!("{err:#}") }),
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_conflict_is_high_impact_on_errands() {
        let impact = assess_impact(&TriggerReason::CalendarConflict);
        assert_eq!(impact.severity, Severity::High);
        assert_eq!(impact.affected, vec![PlanComponent::ErrandSchedule]);
    }

    #[test]
    fn unknown_trigger_is_low_impact() {
        let impact = assess_impact(&TriggerReason::from("weather_changed"));
        assert_eq!(impact.severity, Severity::Low);
        assert!(impact.affected.is_empty());
    }
}
