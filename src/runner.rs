use std::collections::HashMap;
use std::sync::Arc;

use adk_rust::futures::StreamExt;
use adk_rust::prelude::InMemoryArtifactService;
use adk_rust::prelude::*;
use adk_session::{CreateRequest, GetRequest, InMemorySessionService, SessionService};
use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::config::RuntimeConfig;
use crate::telemetry::TelemetrySink;

pub const NO_TEXTUAL_RESPONSE: &str = "No textual response produced by the agent.";

pub async fn ensure_session_exists(
    session_service: &Arc<dyn SessionService>,
    cfg: &RuntimeConfig,
    session_id: &str,
) -> Result<()> {
    let session = session_service
        .get(GetRequest {
            app_name: cfg.app_name.clone(),
            user_id: cfg.user_id.clone(),
            session_id: session_id.to_string(),
            num_recent_events: None,
            after: None,
        })
        .await;

    if session.is_ok() {
        return Ok(());
    }

    session_service
        .create(CreateRequest {
            app_name: cfg.app_name.clone(),
            user_id: cfg.user_id.clone(),
            session_id: Some(session_id.to_string()),
            state: HashMap::new(),
        })
        .await
        .with_context(|| {
            format!(
                "failed to create session '{}' for app '{}'",
                session_id, cfg.app_name
            )
        })?;

    Ok(())
}

/// Runner over a fresh in-memory session store. Sessions do not outlive the
/// process.
pub async fn build_runner(
    agent: Arc<dyn Agent>,
    cfg: &RuntimeConfig,
    session_id: &str,
) -> Result<Runner> {
    let session_service: Arc<dyn SessionService> = Arc::new(InMemorySessionService::new());
    build_runner_with_session_service(agent, cfg, session_service, session_id).await
}

pub async fn build_runner_with_session_service(
    agent: Arc<dyn Agent>,
    cfg: &RuntimeConfig,
    session_service: Arc<dyn SessionService>,
    session_id: &str,
) -> Result<Runner> {
    ensure_session_exists(&session_service, cfg, session_id).await?;

    Runner::new(RunnerConfig {
        app_name: cfg.app_name.clone(),
        agent,
        session_service,
        artifact_service: Some(Arc::new(InMemoryArtifactService::new())),
        memory_service: None,
        plugin_manager: None,
        run_config: None,
        compaction_config: None,
        context_cache_config: None,
        cache_capable: None,
        request_context: None,
        cancellation_token: None,
    })
    .context("failed to build ADK runner")
}

/// Keeps the latest text per author so the final reply survives both partial
/// streaming and snapshot-style events.
#[derive(Default, Debug)]
pub struct AuthorTextTracker {
    pub latest_final_text: Option<String>,
    pub last_textful_author: Option<String>,
    pub by_author: HashMap<String, String>,
}

impl AuthorTextTracker {
    pub fn ingest(&mut self, author: &str, text: &str, partial: bool, is_final: bool) {
        if text.is_empty() {
            return;
        }

        self.last_textful_author = Some(author.to_string());
        let buffer = self.by_author.entry(author.to_string()).or_default();
        if partial {
            buffer.push_str(text);
        } else {
            *buffer = text.to_string();
        }

        if is_final && !text.trim().is_empty() {
            self.latest_final_text = Some(text.to_string());
        }
    }

    pub fn resolve_text(&self) -> Option<String> {
        if let Some(final_text) = &self.latest_final_text {
            return Some(final_text.clone());
        }

        let author = self.last_textful_author.as_ref()?;
        let text = self.by_author.get(author)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(trimmed.to_string())
    }
}

pub fn event_text(event: &Event) -> String {
    match event.content() {
        Some(content) => content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
        None => String::new(),
    }
}

pub fn extract_tool_failure_message(response: &Value) -> Option<String> {
    if let Some(message) = response.get("error").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    if let Some(message) = response.get("message").and_then(Value::as_str) {
        let status = response
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if status.eq_ignore_ascii_case("error") || status.eq_ignore_ascii_case("failed") {
            return Some(message.to_string());
        }
    }
    None
}

pub fn emit_tool_lifecycle_events(event: &Event, telemetry: &TelemetrySink) {
    let Some(content) = event.content() else {
        return;
    };

    for part in &content.parts {
        match part {
            Part::FunctionCall { name, .. } => {
                tracing::info!(
                    tool = %name,
                    author = %event.author,
                    lifecycle = "requested",
                    "Tool call requested"
                );
                telemetry.emit(
                    "tool.requested",
                    json!({
                        "tool": name,
                        "author": event.author
                    }),
                );
            }
            Part::FunctionResponse {
                function_response, ..
            } => {
                if let Some(error_message) =
                    extract_tool_failure_message(&function_response.response)
                {
                    tracing::warn!(
                        tool = %function_response.name,
                        author = %event.author,
                        lifecycle = "failed",
                        error = %error_message,
                        "Tool execution failed"
                    );
                    telemetry.emit(
                        "tool.failed",
                        json!({
                            "tool": function_response.name,
                            "author": event.author,
                            "error": error_message
                        }),
                    );
                } else {
                    tracing::info!(
                        tool = %function_response.name,
                        author = %event.author,
                        lifecycle = "succeeded",
                        "Tool execution completed"
                    );
                    telemetry.emit(
                        "tool.succeeded",
                        json!({
                            "tool": function_response.name,
                            "author": event.author
                        }),
                    );
                }
            }
            _ => {}
        }
    }
}

async fn collect_reply(
    runner: &Runner,
    cfg: &RuntimeConfig,
    session_id: &str,
    prompt: &str,
    telemetry: &TelemetrySink,
) -> Result<String> {
    let mut stream = runner
        .run(
            adk_rust::UserId::new_unchecked(cfg.user_id.clone()),
            adk_rust::SessionId::new_unchecked(session_id),
            Content::new("user").with_text(prompt),
        )
        .await
        .context("failed to start runner stream")?;

    let mut tracker = AuthorTextTracker::default();
    let mut last_error: Option<String> = None;

    while let Some(event_result) = stream.next().await {
        let event = match event_result {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Runner event error: {e:#}");
                last_error = Some(e.to_string());
                continue;
            }
        };
        let text = event_text(&event);

        tracing::debug!(
            author = %event.author,
            is_final = event.is_final_response(),
            partial = event.llm_response.partial,
            text_len = text.len(),
            "received runner event"
        );

        if event.author == "user" {
            continue;
        }

        emit_tool_lifecycle_events(&event, telemetry);
        tracker.ingest(
            &event.author,
            &text,
            event.llm_response.partial,
            event.is_final_response(),
        );
    }

    match (tracker.resolve_text(), last_error) {
        (Some(text), _) => Ok(text),
        (None, Some(error)) => Err(anyhow::anyhow!("agent run failed: {error}")),
        (None, None) => Ok(NO_TEXTUAL_RESPONSE.to_string()),
    }
}

/// Sends one prompt and returns the agent's final text, bounded by the
/// configured agent timeout.
pub async fn run_prompt(
    runner: &Runner,
    cfg: &RuntimeConfig,
    session_id: &str,
    prompt: &str,
    telemetry: &TelemetrySink,
) -> Result<String> {
    let timeout = cfg.agent_timeout();
    tokio::time::timeout(
        timeout,
        collect_reply(runner, cfg, session_id, prompt, telemetry),
    )
    .await
    .map_err(|_| anyhow::anyhow!("agent run timed out after {}s", timeout.as_secs()))?
}
