use std::sync::Mutex;

/// A reportable step inside a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Coordinator,
    Context,
    MealPlan,
    GroceryList,
    Prices,
    Errands,
    Finalize,
    PlaceOrder,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Coordinator => "coordinator",
            Stage::Context => "context",
            Stage::MealPlan => "meal_plan",
            Stage::GroceryList => "grocery_list",
            Stage::Prices => "prices",
            Stage::Errands => "errands",
            Stage::Finalize => "finalize",
            Stage::PlaceOrder => "place_order",
        }
    }

    pub fn running_label(self) -> &'static str {
        match self {
            Stage::Coordinator => "Initializing coordinator...",
            Stage::Context => "Gathering context data...",
            Stage::MealPlan => "Generating meal plan...",
            Stage::GroceryList => "Compiling grocery list...",
            Stage::Prices => "Comparing prices...",
            Stage::Errands => "Scheduling errands...",
            Stage::Finalize => "Creating approval requests...",
            Stage::PlaceOrder => "Placing order with Instacart...",
        }
    }

    pub fn done_label(self) -> &'static str {
        match self {
            Stage::Coordinator => "✓ Coordinator ready",
            Stage::Context => "✓ Context gathered",
            Stage::MealPlan => "✓ Meal plan generated",
            Stage::GroceryList => "✓ Grocery list ready",
            Stage::Prices => "✓ Best prices found",
            Stage::Errands => "✓ Errands scheduled",
            Stage::Finalize => "✓ Plan ready for approval",
            Stage::PlaceOrder => "✓ Order placed successfully",
        }
    }
}

/// Receives workflow progress. Workflows never print directly.
pub trait ProgressSink: Send + Sync {
    fn workflow_started(&self, title: &str, details: &[(&str, String)]);
    fn stage_started(&self, stage: Stage);
    fn stage_completed(&self, stage: Stage);
    fn note(&self, message: &str);
    fn workflow_completed(&self, message: &str);
    fn workflow_failed(&self, error: &anyhow::Error);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(String),
    StageStarted(Stage),
    StageCompleted(Stage),
    Note(String),
    Completed(String),
    Failed(String),
}

/// Keeps every progress event in order.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn completed_stages(&self) -> Vec<Stage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::StageCompleted(stage) => Some(stage),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressSink for RecordingProgress {
    fn workflow_started(&self, title: &str, _details: &[(&str, String)]) {
        self.push(ProgressEvent::Started(title.to_string()));
    }
    fn stage_started(&self, stage: Stage) {
        self.push(ProgressEvent::StageStarted(stage));
    }
    fn stage_completed(&self, stage: Stage) {
        self.push(ProgressEvent::StageCompleted(stage));
    }
    fn note(&self, message: &str) {
        self.push(ProgressEvent::Note(message.to_string()));
    }
    fn workflow_completed(&self, message: &str) {
        self.push(ProgressEvent::Completed(message.to_string()));
    }
    fn workflow_failed(&self, error: &anyhow::Error) {
        self.push(ProgressEvent::Failed(error.to_string()));
    }
}
