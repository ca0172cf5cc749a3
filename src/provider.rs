use clap::ValueEnum;
use std::sync::Arc;

use adk_rust::prelude::*;
use anyhow::{Context, Result};

use crate::cli::Provider;
use crate::config::RuntimeConfig;

pub fn validate_model_for_provider(provider: Provider, model_name: &str) -> Result<()> {
    let is_valid = match provider {
        Provider::Gemini => model_name.starts_with("gemini"),
        Provider::Openai => {
            model_name.starts_with("gpt-")
                || model_name.starts_with("o1")
                || model_name.starts_with("o3")
        }
        Provider::Anthropic => model_name.starts_with("claude"),
        Provider::Deepseek => model_name.starts_with("deepseek"),
        Provider::Groq => !model_name.trim().is_empty(),
        Provider::Ollama => !model_name.trim().is_empty(),
        Provider::Auto => true,
    };

    if is_valid {
        return Ok(());
    }

    Err(anyhow::anyhow!(
        "model '{}' is not compatible with provider '{:?}'",
        model_name,
        provider
    ))
}

/// Provider after auto-detection. The Gemini key is read from settings so
/// profiles and `--google-api-key` count toward detection.
pub fn effective_provider(cfg: &RuntimeConfig) -> Result<Provider> {
    match cfg.provider {
        Provider::Auto => detect_provider(cfg).context(
            "no provider could be auto-detected. Set one of GOOGLE_API_KEY, OPENAI_API_KEY, \
             ANTHROPIC_API_KEY, DEEPSEEK_API_KEY, GROQ_API_KEY, or use --provider ollama",
        ),
        provider => Ok(provider),
    }
}

/// Model name that will be requested, without constructing a client.
pub fn effective_model_name(cfg: &RuntimeConfig, provider: Provider) -> String {
    if let Some(model) = cfg.model.as_deref()
        && !model.trim().is_empty()
    {
        return model.trim().to_string();
    }
    match provider {
        Provider::Gemini | Provider::Auto => cfg.settings.gemini_model.clone(),
        Provider::Openai => "gpt-5-mini".to_string(),
        Provider::Anthropic => "claude-sonnet-4-20250514".to_string(),
        Provider::Deepseek => "deepseek-chat".to_string(),
        Provider::Groq => "llama-3.3-70b-versatile".to_string(),
        Provider::Ollama => "llama4".to_string(),
    }
}

fn required_env(key: &str, provider_label: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("{key} is required for the {provider_label} provider"))
}

pub fn resolve_model(cfg: &RuntimeConfig) -> Result<(Arc<dyn Llm>, Provider, String)> {
    let provider = effective_provider(cfg)?;
    let model_name = effective_model_name(cfg, provider);
    validate_model_for_provider(provider, &model_name)?;

    let model: Arc<dyn Llm> = match provider {
        Provider::Gemini | Provider::Auto => {
            let api_key = cfg.settings.google_api_key.trim();
            if api_key.is_empty() {
                return Err(anyhow::anyhow!(
                    "GOOGLE_API_KEY is required for the Gemini provider"
                ));
            }
            Arc::new(GeminiModel::new(api_key.to_string(), model_name.clone())?)
        }
        Provider::Openai => {
            let api_key = required_env("OPENAI_API_KEY", "OpenAI")?;
            Arc::new(OpenAIClient::new(OpenAIConfig::new(
                api_key,
                model_name.clone(),
            ))?)
        }
        Provider::Anthropic => {
            let api_key = required_env("ANTHROPIC_API_KEY", "Anthropic")?;
            Arc::new(AnthropicClient::new(AnthropicConfig::new(
                api_key,
                model_name.clone(),
            ))?)
        }
        Provider::Deepseek => {
            let api_key = required_env("DEEPSEEK_API_KEY", "DeepSeek")?;
            Arc::new(DeepSeekClient::new(DeepSeekConfig::new(
                api_key,
                model_name.clone(),
            ))?)
        }
        Provider::Groq => {
            let api_key = required_env("GROQ_API_KEY", "Groq")?;
            Arc::new(GroqClient::new(GroqConfig::new(api_key, model_name.clone()))?)
        }
        Provider::Ollama => {
            let host = std::env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string());
            Arc::new(OllamaModel::new(OllamaConfig::with_host(
                host,
                model_name.clone(),
            ))?)
        }
    };

    tracing::info!(provider = ?provider, model = %model_name, "model resolved");
    Ok((model, provider, model_name))
}

pub fn detect_provider(cfg: &RuntimeConfig) -> Option<Provider> {
    if !cfg.settings.google_api_key.trim().is_empty() {
        return Some(Provider::Gemini);
    }
    if env_present("OPENAI_API_KEY") {
        return Some(Provider::Openai);
    }
    if env_present("ANTHROPIC_API_KEY") {
        return Some(Provider::Anthropic);
    }
    if env_present("DEEPSEEK_API_KEY") {
        return Some(Provider::Deepseek);
    }
    if env_present("GROQ_API_KEY") {
        return Some(Provider::Groq);
    }
    if env_present("OLLAMA_HOST") {
        return Some(Provider::Ollama);
    }
    None
}

pub fn env_present(key: &str) -> bool {
    std::env::var(key)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

pub fn parse_provider_name(value: &str) -> Result<Provider> {
    Provider::from_str(value, true).map_err(|_| {
        anyhow::anyhow!(
            "invalid provider '{}'. Supported values: auto, gemini, openai, anthropic, deepseek, groq, ollama",
            value
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_models_must_use_gemini_prefix() {
        assert!(validate_model_for_provider(Provider::Gemini, "gemini-1.5-flash").is_ok());
        assert!(validate_model_for_provider(Provider::Gemini, "gpt-4o").is_err());
        assert!(validate_model_for_provider(Provider::Anthropic, "claude-3").is_ok());
    }

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!(
            parse_provider_name("Gemini").expect("provider should parse"),
            Provider::Gemini
        );
        assert!(parse_provider_name("watson").is_err());
    }
}
