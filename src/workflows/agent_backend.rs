use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::backend::*;
use super::model::*;
use crate::agents::tree::AgentTree;
use crate::agents::{CONTEXT_AGENT, DECISION_AGENT, EXECUTION_AGENT, PLANNING_AGENT};
use crate::config::RuntimeConfig;
use crate::runner::{build_runner, run_prompt};
use crate::telemetry::TelemetrySink;

/// Pulls the JSON object out of a model reply. Replies are often wrapped in
/// a markdown fence or surrounded by prose, and the prose may contain braces
/// of its own, so every `{` is tried as a starting point.
pub fn parse_json_reply<T: DeserializeOwned>(agent: &str, reply: &str) -> Result<T> {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|body| body.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    for (start, _) in unfenced.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&unfenced[start..]).into_iter::<T>();
        if let Some(Ok(value)) = values.next() {
            return Ok(value);
        }
    }

    serde_json::from_str::<T>(unfenced).with_context(|| {
        let preview = unfenced.chars().take(200).collect::<String>();
        format!("{agent} returned malformed JSON: {preview}")
    })
}

/// Runs each stage through the sub-agent that owns it. Every request gets a
/// fresh session and asks for JSON matching the demo payload's shape.
pub struct AgentBackend {
    tree: AgentTree,
    cfg: RuntimeConfig,
    telemetry: TelemetrySink,
    requests: AtomicUsize,
}

impl AgentBackend {
    pub fn new(tree: AgentTree, cfg: RuntimeConfig, telemetry: TelemetrySink) -> Self {
        Self {
            tree,
            cfg,
            telemetry,
            requests: AtomicUsize::new(0),
        }
    }

    async fn ask_json<T, E>(
        &self,
        agent_name: &str,
        task: &str,
        input: Value,
        example: &E,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        E: Serialize,
    {
        let agent = self.tree.sub_agent(agent_name)?;
        let request = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        let session_id = format!("{}-stage-{}", self.cfg.session_id, request);
        let example = serde_json::to_string_pretty(example)
            .context("failed to serialize example payload")?;
        let prompt = format!(
            "{task}\n\nInput:\n{input:#}\n\nRespond with one JSON object using exactly the \
             fields of this example and no other text:\n{example}"
        );

        tracing::info!(agent = agent_name, session = %session_id, "running workflow stage on agent");
        let runner = build_runner(agent, &self.cfg, &session_id).await?;
        let reply = run_prompt(&runner, &self.cfg, &session_id, &prompt, &self.telemetry)
            .await
            .with_context(|| format!("{agent_name} did not complete the request"))?;
        parse_json_reply(agent_name, &reply)
    }
}

#[async_trait]
impl PlanningBackend for AgentBackend {
    fn name(&self) -> &'static str {
        "agents"
    }

    async fn gather_context(&self, user_id: &str) -> Result<ContextSnapshot> {
        self.ask_json(
            CONTEXT_AGENT,
            "Gather the user's current availability, grocery spending patterns, pantry state \
             and shopping conditions for the coming week.",
            json!({ "user_id": user_id }),
            &sample_context(),
        )
        .await
    }

    async fn generate_meal_plan(&self, context: &ContextSnapshot) -> Result<MealPlan> {
        self.ask_json(
            PLANNING_AGENT,
            "Create this week's meal plan from the context. Set status to \"proposed\".",
            json!({ "context": context }),
            &sample_meal_plan(),
        )
        .await
    }

    async fn compile_grocery_list(
        &self,
        meal_plan: &MealPlan,
        context: &ContextSnapshot,
    ) -> Result<GroceryList> {
        self.ask_json(
            PLANNING_AGENT,
            "Compile the grocery list for the meal plan, leaving out what the pantry already \
             holds. Set status to \"draft\".",
            json!({ "meal_plan": meal_plan, "pantry_state": context.pantry_state }),
            &sample_grocery_list(),
        )
        .await
    }

    async fn compare_prices(&self, grocery_list: &GroceryList) -> Result<PriceComparison> {
        self.ask_json(
            DECISION_AGENT,
            "Compare vendor prices for the grocery list and recommend one vendor. The \
             recommended_vendor must be one of the compared vendors.",
            json!({ "grocery_list": grocery_list }),
            &sample_price_comparison(),
        )
        .await
    }

    async fn schedule_errands(&self, context: &ContextSnapshot) -> Result<ErrandSchedule> {
        self.ask_json(
            PLANNING_AGENT,
            "Schedule this week's errands into the user's free time and plan the route.",
            json!({
                "availability": context.availability,
                "insights": context.contextual_insights
            }),
            &sample_errand_schedule(),
        )
        .await
    }

    async fn place_grocery_order(
        &self,
        approval_id: &str,
        user_id: &str,
    ) -> Result<OrderConfirmation> {
        self.ask_json(
            EXECUTION_AGENT,
            "The user approved the grocery order. Place it and report the confirmation.",
            json!({ "approval_id": approval_id, "user_id": user_id }),
            &sample_order_confirmation(),
        )
        .await
    }

    async fn book_errands(&self, approval_id: &str, user_id: &str) -> Result<ErrandBooking> {
        self.ask_json(
            EXECUTION_AGENT,
            "The user approved the errand schedule. Create the calendar events.",
            json!({ "approval_id": approval_id, "user_id": user_id }),
            &sample_errand_booking(),
        )
        .await
    }

    async fn replan(
        &self,
        trigger: &TriggerReason,
        change: &Value,
        impact: &Impact,
    ) -> Result<ReplanChanges> {
        self.ask_json(
            PLANNING_AGENT,
            "Something changed since the plan was approved. Update the affected parts of the \
             plan and report what changed and the new grocery total.",
            json!({ "trigger": trigger, "change": change, "impact": impact }),
            &sample_replan_changes(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_reply() {
        let reply = "```json\n{\"calendar_events_created\": 3, \"status\": \"scheduled\"}\n```";
        let booking: ErrandBooking =
            parse_json_reply(EXECUTION_AGENT, reply).expect("fenced JSON should parse");
        assert_eq!(booking.calendar_events_created, 3);
    }

    #[test]
    fn parses_reply_with_surrounding_prose() {
        let reply = "Here is the update: {\"action\": \"modified_grocery_list\", \
                     \"changes\": [\"Added oat milk\"], \"new_total\": 150.5} Let me know.";
        let changes: ReplanChanges =
            parse_json_reply(PLANNING_AGENT, reply).expect("embedded JSON should parse");
        assert_eq!(changes.changes, vec!["Added oat milk".to_string()]);
    }

    #[test]
    fn braces_in_prose_do_not_hide_the_reply() {
        let reply = "Notes {see below}: {\"calendar_events_created\": 2, \"status\": \"scheduled\"}";
        let booking: ErrandBooking =
            parse_json_reply(EXECUTION_AGENT, reply).expect("trailing JSON should parse");
        assert_eq!(
            booking,
            ErrandBooking {
                calendar_events_created: 2,
                status: "scheduled".to_string(),
            }
        );
    }

    #[test]
    fn malformed_reply_names_the_agent() {
        let err = parse_json_reply::<ErrandBooking>(EXECUTION_AGENT, "I could not do that.")
            .expect_err("prose should not parse");
        let message = err.to_string();
        assert!(message.contains("execution_agent"));
        assert!(message.contains("malformed JSON"));
    }
}
