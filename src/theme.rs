/// Console presentation for the assistant.
///
/// Banner, workflow progress lines, plan summaries and order output, with
/// ANSI colour helpers shared by every command.
use serde::Serialize;

use crate::workflows::WorkflowOutput;
use crate::workflows::model::{ApprovalOutcome, OrderConfirmation, ReplanOutcome, WeeklyPlan};
use crate::workflows::progress::{ProgressSink, Stage};

// ---------------------------------------------------------------------------
// ANSI color helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const CYAN: &str = "\x1b[36m";
pub const GREEN: &str = "\x1b[32m";
pub const BOLD_CYAN: &str = "\x1b[1;36m";
pub const BOLD_GREEN: &str = "\x1b[1;32m";
pub const BOLD_YELLOW: &str = "\x1b[1;33m";
pub const BOLD_RED: &str = "\x1b[1;31m";

// ---------------------------------------------------------------------------
// Startup banner
// ---------------------------------------------------------------------------

pub fn print_banner(environment: &str, model: &str) {
    let title = format!("{BOLD_CYAN}🤖 Edwardo - Autonomous Life Assistant{RESET}");
    let subtitle = "Multi-agent orchestration for meal planning, grocery shopping, and errands";
    draw_box(&[title, subtitle.to_string()]);
    println!();
    println!("{DIM}Environment: {environment}{RESET}");
    println!("{DIM}Model: {model}{RESET}");
    println!();
}

/// Draw a cyan bordered box sized to its widest line.
fn draw_box(lines: &[String]) {
    let inner = lines
        .iter()
        .map(|line| visible_width(line))
        .max()
        .unwrap_or(0)
        + 2;

    println!("{CYAN}╭{}╮{RESET}", "─".repeat(inner));
    for line in lines {
        let pad = inner.saturating_sub(visible_width(line) + 1);
        println!("{CYAN}│{RESET} {line}{}{CYAN}│{RESET}", " ".repeat(pad));
    }
    println!("{CYAN}╰{}╯{RESET}", "─".repeat(inner));
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

/// Strip ANSI escape sequences for visible length calculation.
fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Workflow progress
// ---------------------------------------------------------------------------

/// Prints workflow progress to stdout. With `quiet` set nothing is printed,
/// which keeps `--json` output machine readable.
pub struct ConsoleProgress {
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressSink for ConsoleProgress {
    fn workflow_started(&self, title: &str, details: &[(&str, String)]) {
        if self.quiet {
            return;
        }
        let color = if title.contains("Re-planning") {
            BOLD_YELLOW
        } else {
            BOLD_CYAN
        };
        println!();
        println!("{color}{title}{RESET}");
        for (label, value) in details {
            println!("{label}: {value}");
        }
        println!();
    }

    fn stage_started(&self, stage: Stage) {
        if !self.quiet {
            println!("  {CYAN}⠋ {}{RESET}", stage.running_label());
        }
    }

    fn stage_completed(&self, stage: Stage) {
        if !self.quiet {
            println!("  {GREEN}{}{RESET}", stage.done_label());
        }
    }

    fn note(&self, message: &str) {
        if !self.quiet {
            println!("{GREEN}{message}{RESET}");
            println!();
        }
    }

    fn workflow_completed(&self, message: &str) {
        if !self.quiet {
            println!();
            println!("{BOLD_GREEN}✅ {message}{RESET}");
            println!();
        }
    }

    fn workflow_failed(&self, error: &anyhow::Error) {
        if !self.quiet {
            println!();
            println!("{BOLD_RED}❌ Workflow failed: {error}{RESET}");
            println!();
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

pub fn print_plan_summary(plan: &WeeklyPlan) {
    println!("{BOLD}📊 Planning Results:{RESET}");
    println!("  • Meals planned: {}", plan.meal_plan.meals.len());
    println!("  • Grocery items: {}", plan.grocery_order.list.items.len());
    println!("  • Total cost: ${:.2}", plan.grocery_order.total);
    println!(
        "  • Errands scheduled: {}",
        plan.errand_schedule.errands.len()
    );
    println!(
        "  • Estimated time saved: {} hours",
        plan.estimated_savings.time_saved_hours
    );
    println!(
        "  • Estimated money saved: ${:.2}",
        plan.estimated_savings.money_saved_dollars
    );
    println!();
    println!("{BOLD_GREEN}✨ Plan is ready for user approval!{RESET}");
    println!("{DIM}Workflow ID: {}{RESET}", plan.workflow_id);
    println!();
}

pub fn print_order(order: &OrderConfirmation) {
    println!("  • Order ID: {}", order.order_id);
    println!("  • Confirmation: {}", order.confirmation_number);
    println!("  • Tracking: {}", order.tracking_url);
}

pub fn print_approval_outcome(outcome: &ApprovalOutcome) {
    match outcome {
        ApprovalOutcome::Order(order) => print_order(order),
        ApprovalOutcome::Errands(booking) => {
            println!(
                "  • Calendar events created: {} ({})",
                booking.calendar_events_created, booking.status
            );
        }
        ApprovalOutcome::Approved(approval) => {
            println!("  • Status: {}", approval.status);
            println!("  • {}", approval.message);
        }
    }
}

pub fn print_replan_outcome(outcome: &ReplanOutcome) {
    match outcome {
        ReplanOutcome::Replanned(changes) => {
            println!("  • Action: {}", changes.action);
            for change in &changes.changes {
                println!("  • {change}");
            }
            println!("  • New total: ${:.2}", changes.new_total);
        }
        ReplanOutcome::Skipped { action, reason } => {
            println!("{DIM}Action: {action} ({reason}){RESET}");
        }
    }
}

pub fn print_workflow_output(output: &WorkflowOutput) {
    match output {
        WorkflowOutput::Plan(plan) => print_plan_summary(plan),
        WorkflowOutput::Approval(outcome) => print_approval_outcome(outcome),
        WorkflowOutput::Replan(outcome) => print_replan_outcome(outcome),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_ansi_removes_color_codes() {
        let colored = format!("{BOLD_GREEN}✓ Context gathered{RESET}");
        assert_eq!(strip_ansi(&colored), "✓ Context gathered");
        assert_eq!(visible_width(&colored), "✓ Context gathered".chars().count());
    }
}
