use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use serde_json::Value;

use super::local_iso_timestamp;
use super::model::*;

/// Produces the output of each workflow stage.
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn gather_context(&self, user_id: &str) -> Result<ContextSnapshot>;

    async fn generate_meal_plan(&self, context: &ContextSnapshot) -> Result<MealPlan>;

    async fn compile_grocery_list(
        &self,
        meal_plan: &MealPlan,
        context: &ContextSnapshot,
    ) -> Result<GroceryList>;

    async fn compare_prices(&self, grocery_list: &GroceryList) -> Result<PriceComparison>;

    async fn schedule_errands(&self, context: &ContextSnapshot) -> Result<ErrandSchedule>;

    async fn place_grocery_order(
        &self,
        approval_id: &str,
        user_id: &str,
    ) -> Result<OrderConfirmation>;

    async fn book_errands(&self, approval_id: &str, user_id: &str) -> Result<ErrandBooking>;

    async fn replan(
        &self,
        trigger: &TriggerReason,
        change: &Value,
        impact: &Impact,
    ) -> Result<ReplanChanges>;
}

pub fn sample_context() -> ContextSnapshot {
    ContextSnapshot {
        availability: Availability {
            free_blocks: strings(&["Sat 10am-6pm", "Sun 2pm-8pm"]),
            busy_blocks: strings(&["Sat 8-9:30am", "Sun 10am-1pm"]),
        },
        spending_patterns: SpendingPatterns {
            avg_weekly_grocery: 150.0,
            categories: BTreeMap::from([
                ("produce".to_string(), 40.0),
                ("dairy".to_string(), 25.0),
                ("meat".to_string(), 35.0),
                ("pantry".to_string(), 50.0),
            ]),
        },
        pantry_state: PantryState {
            running_low: strings(&["milk", "eggs", "bread"]),
            well_stocked: strings(&["rice", "pasta", "canned_goods"]),
        },
        contextual_insights: ContextualInsights {
            weather: "Clear weekend".to_string(),
            traffic: "Light Saturday afternoon".to_string(),
            recommended_shopping_time: "Saturday 2-3pm".to_string(),
        },
    }
}

pub fn sample_meal_plan() -> MealPlan {
    MealPlan {
        week_start_date: Local::now().date_naive().to_string(),
        meals: vec![
            Meal {
                day: "monday".to_string(),
                meal_type: "dinner".to_string(),
                recipe_name: "Veggie Stir-fry".to_string(),
                cook_time_minutes: 25,
                servings: 2,
                ingredients: vec![
                    ingredient("broccoli", 1.0, "head"),
                    ingredient("bell peppers", 2.0, "count"),
                    ingredient("soy sauce", 2.0, "tbsp"),
                ],
                estimated_cost: 12.50,
            },
            Meal {
                day: "tuesday".to_string(),
                meal_type: "dinner".to_string(),
                recipe_name: "Pasta Primavera".to_string(),
                cook_time_minutes: 30,
                servings: 2,
                ingredients: vec![
                    ingredient("pasta", 8.0, "oz"),
                    ingredient("cherry tomatoes", 1.0, "pint"),
                    ingredient("parmesan", 4.0, "oz"),
                ],
                estimated_cost: 15.00,
            },
        ],
        total_estimated_cost: 145.00,
        status: "proposed".to_string(),
    }
}

pub fn sample_grocery_list() -> GroceryList {
    GroceryList {
        items: vec![
            grocery_item("broccoli", 1.0, "head", "produce"),
            grocery_item("bell peppers", 2.0, "count", "produce"),
            grocery_item("milk", 1.0, "gallon", "dairy"),
            grocery_item("eggs", 12.0, "count", "dairy"),
        ],
        status: "draft".to_string(),
    }
}

pub fn sample_price_comparison() -> PriceComparison {
    PriceComparison {
        vendor_comparisons: vec![
            VendorQuote {
                vendor: "instacart_whole_foods".to_string(),
                total_cost: 147.23,
                delivery_fee: 5.99,
                items_available: 45,
                items_total: 45,
                delivery_windows: strings(&["Sat 2-4pm", "Sat 4-6pm"]),
            },
            VendorQuote {
                vendor: "amazon_fresh".to_string(),
                total_cost: 152.10,
                delivery_fee: 0.0,
                items_available: 43,
                items_total: 45,
                delivery_windows: strings(&["Sat 4-6pm"]),
            },
        ],
        recommended_vendor: "instacart_whole_foods".to_string(),
        reasoning: "Best availability and competitive pricing".to_string(),
    }
}

pub fn sample_errand_schedule() -> ErrandSchedule {
    ErrandSchedule {
        errands: vec![
            Errand {
                kind: "dry_cleaning".to_string(),
                location: "Clean Express, 123 Main St".to_string(),
                scheduled_time: "Sat 10:00am".to_string(),
                duration_minutes: 15,
            },
            Errand {
                kind: "pharmacy".to_string(),
                location: "CVS, 456 Oak Ave".to_string(),
                scheduled_time: "Sat 10:30am".to_string(),
                duration_minutes: 10,
            },
        ],
        route: Route {
            total_drive_time_minutes: 25,
            total_duration_minutes: 50,
        },
    }
}

pub fn sample_order_confirmation() -> OrderConfirmation {
    OrderConfirmation {
        order_id: "inst_ord_12345".to_string(),
        status: "placed".to_string(),
        confirmation_number: "EDWRD12345".to_string(),
        estimated_delivery: local_iso_timestamp(Local::now() + chrono::Duration::days(1)),
        total_charged: 147.23,
        tracking_url: "https://instacart.com/track/inst_ord_12345".to_string(),
    }
}

pub fn sample_errand_booking() -> ErrandBooking {
    ErrandBooking {
        calendar_events_created: 2,
        status: "scheduled".to_string(),
    }
}

pub fn sample_replan_changes() -> ReplanChanges {
    ReplanChanges {
        action: "modified_grocery_list".to_string(),
        changes: strings(&["Added milk to order"]),
        new_total: 151.78,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn ingredient(name: &str, quantity: f64, unit: &str) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
    }
}

fn grocery_item(name: &str, quantity: f64, unit: &str, category: &str) -> GroceryItem {
    GroceryItem {
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
        category: category.to_string(),
        in_pantry: false,
    }
}

/// Returns the same canned payloads for every input. Placing an order waits
/// four pace intervals to stand in for the vendor call.
pub struct DemoBackend {
    pace: Duration,
}

impl DemoBackend {
    pub fn new(pace: Duration) -> Self {
        Self { pace }
    }
}

#[async_trait]
impl PlanningBackend for DemoBackend {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn gather_context(&self, _user_id: &str) -> Result<ContextSnapshot> {
        Ok(sample_context())
    }

    async fn generate_meal_plan(&self, _context: &ContextSnapshot) -> Result<MealPlan> {
        Ok(sample_meal_plan())
    }

    async fn compile_grocery_list(
        &self,
        _meal_plan: &MealPlan,
        _context: &ContextSnapshot,
    ) -> Result<GroceryList> {
        Ok(sample_grocery_list())
    }

    async fn compare_prices(&self, _grocery_list: &GroceryList) -> Result<PriceComparison> {
        Ok(sample_price_comparison())
    }

    async fn schedule_errands(&self, _context: &ContextSnapshot) -> Result<ErrandSchedule> {
        Ok(sample_errand_schedule())
    }

    async fn place_grocery_order(
        &self,
        approval_id: &str,
        _user_id: &str,
    ) -> Result<OrderConfirmation> {
        tracing::debug!(approval_id, "simulating vendor order call");
        tokio::time::sleep(self.pace * 4).await;
        Ok(sample_order_confirmation())
    }

    async fn book_errands(&self, _approval_id: &str, _user_id: &str) -> Result<ErrandBooking> {
        Ok(sample_errand_booking())
    }

    async fn replan(
        &self,
        _trigger: &TriggerReason,
        _change: &Value,
        _impact: &Impact,
    ) -> Result<ReplanChanges> {
        Ok(sample_replan_changes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_recommended_vendor_is_among_quotes() {
        let prices = sample_price_comparison();
        let quote = prices
            .recommended_quote()
            .expect("recommended vendor should be quoted");
        assert_eq!(quote.total_cost, 147.23);
    }

    #[test]
    fn sample_grocery_items_are_not_in_pantry() {
        let list = sample_grocery_list();
        assert_eq!(list.items.len(), 4);
        assert!(list.items.iter().all(|item| !item.in_pantry));
    }

    #[tokio::test]
    async fn demo_order_matches_tracking_url() {
        let backend = DemoBackend::new(Duration::ZERO);
        let order = backend
            .place_grocery_order("appr_12345", "demo_user_001")
            .await
            .expect("demo order should be placed");
        assert_eq!(order.order_id, "inst_ord_12345");
        assert!(order.tracking_url.ends_with(&order.order_id));
        assert!(order.estimated_delivery > local_iso_timestamp(Local::now()));
    }
}
