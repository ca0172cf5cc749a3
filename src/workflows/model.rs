//! Payload types exchanged between workflow stages.
//!
//! Field names follow the JSON the stages produce, so an agent reply can be
//! deserialized straight into these types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub free_blocks: Vec<String>,
    pub busy_blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingPatterns {
    pub avg_weekly_grocery: f64,
    pub categories: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryState {
    pub running_low: Vec<String>,
    pub well_stocked: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualInsights {
    pub weather: String,
    pub traffic: String,
    pub recommended_shopping_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub availability: Availability,
    pub spending_patterns: SpendingPatterns,
    pub pantry_state: PantryState,
    pub contextual_insights: ContextualInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub day: String,
    pub meal_type: String,
    pub recipe_name: String,
    pub cook_time_minutes: u32,
    pub servings: u32,
    pub ingredients: Vec<Ingredient>,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub week_start_date: String,
    pub meals: Vec<Meal>,
    pub total_estimated_cost: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub in_pantry: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryList {
    pub items: Vec<GroceryItem>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorQuote {
    pub vendor: String,
    pub total_cost: f64,
    pub delivery_fee: f64,
    pub items_available: u32,
    pub items_total: u32,
    pub delivery_windows: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub vendor_comparisons: Vec<VendorQuote>,
    pub recommended_vendor: String,
    pub reasoning: String,
}

impl PriceComparison {
    pub fn recommended_quote(&self) -> Option<&VendorQuote> {
        self.vendor_comparisons
            .iter()
            .find(|quote| quote.vendor == self.recommended_vendor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Errand {
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub scheduled_time: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub total_drive_time_minutes: u32,
    pub total_duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrandSchedule {
    pub errands: Vec<Errand>,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    pub time_saved_hours: u32,
    pub money_saved_dollars: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryOrder {
    pub list: GroceryList,
    pub pricing: PriceComparison,
    pub selected_vendor: String,
    pub total: f64,
}

/// What a user is asked to approve. Unrecognised kinds are carried through
/// verbatim and approved generically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApprovalKind {
    GroceryOrder,
    MealPlan,
    ErrandSchedule,
    Other(String),
}

impl ApprovalKind {
    pub fn as_str(&self) -> &str {
        match self {
            ApprovalKind::GroceryOrder => "grocery_order",
            ApprovalKind::MealPlan => "meal_plan",
            ApprovalKind::ErrandSchedule => "errand_schedule",
            ApprovalKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ApprovalKind {
    fn from(value: String) -> Self {
        match value.trim() {
            "grocery_order" => ApprovalKind::GroceryOrder,
            "meal_plan" => ApprovalKind::MealPlan,
            "errand_schedule" => ApprovalKind::ErrandSchedule,
            _ => ApprovalKind::Other(value),
        }
    }
}

impl From<&str> for ApprovalKind {
    fn from(value: &str) -> Self {
        ApprovalKind::from(value.to_string())
    }
}

impl From<ApprovalKind> for String {
    fn from(value: ApprovalKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ApprovalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    ReadyForApproval,
}

/// Output of the weekly planning workflow, awaiting user approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub workflow_id: String,
    pub status: PlanStatus,
    pub meal_plan: MealPlan,
    pub grocery_order: GroceryOrder,
    pub errand_schedule: ErrandSchedule,
    pub estimated_savings: Savings,
    pub approvals_needed: Vec<ApprovalKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub status: String,
    pub confirmation_number: String,
    pub estimated_delivery: String,
    pub total_charged: f64,
    pub tracking_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrandBooking {
    pub calendar_events_created: u32,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericApproval {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApprovalOutcome {
    Order(OrderConfirmation),
    Errands(ErrandBooking),
    Approved(GenericApproval),
}

/// Why re-planning was requested. Unknown triggers are kept and treated as
/// low impact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerReason {
    PantryItemDepleted,
    CalendarConflict,
    Other(String),
}

impl TriggerReason {
    pub fn as_str(&self) -> &str {
        match self {
            TriggerReason::PantryItemDepleted => "pantry_item_depleted",
            TriggerReason::CalendarConflict => "calendar_conflict",
            TriggerReason::Other(reason) => reason,
        }
    }
}

impl From<String> for TriggerReason {
    fn from(value: String) -> Self {
        match value.trim() {
            "pantry_item_depleted" => TriggerReason::PantryItemDepleted,
            "calendar_conflict" => TriggerReason::CalendarConflict,
            _ => TriggerReason::Other(value),
        }
    }
}

impl From<&str> for TriggerReason {
    fn from(value: &str) -> Self {
        TriggerReason::from(value.to_string())
    }
}

impl From<TriggerReason> for String {
    fn from(value: TriggerReason) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanComponent {
    GroceryList,
    MealPlan,
    ErrandSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    pub severity: Severity,
    pub affected: Vec<PlanComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanChanges {
    pub action: String,
    pub changes: Vec<String>,
    pub new_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplanOutcome {
    Replanned(ReplanChanges),
    Skipped { action: String, reason: String },
}

impl ReplanOutcome {
    pub fn low_impact() -> Self {
        ReplanOutcome::Skipped {
            action: "none".to_string(),
            reason: "low_impact".to_string(),
        }
    }
}
