use anyhow::Result;

use crate::cli::Provider;
use crate::config::{RuntimeConfig, display_mongodb_uri, display_secret};
use crate::connectors::{Connector, credentials};
use crate::mcp::effective_launch_spec;
use crate::provider::{detect_provider, effective_model_name, env_present};

pub fn run_doctor(cfg: &RuntimeConfig) -> Result<()> {
    println!(
        "Active profile: '{}' (config: {})",
        cfg.profile, cfg.config_path
    );
    println!(
        "Environment: {} (log level: {:?})",
        cfg.settings.app_env.as_str(),
        cfg.settings.log_level
    );

    let checks = [
        (
            "GOOGLE_API_KEY",
            !cfg.settings.google_api_key.trim().is_empty(),
        ),
        ("OPENAI_API_KEY", env_present("OPENAI_API_KEY")),
        ("ANTHROPIC_API_KEY", env_present("ANTHROPIC_API_KEY")),
        ("DEEPSEEK_API_KEY", env_present("DEEPSEEK_API_KEY")),
        ("GROQ_API_KEY", env_present("GROQ_API_KEY")),
        ("OLLAMA_HOST", env_present("OLLAMA_HOST")),
    ];

    println!("Provider environment check:");
    for (key, ok) in checks {
        let status = if ok { "set" } else { "missing" };
        println!("- {key}: {status}");
    }

    let provider = match cfg.provider {
        Provider::Auto => detect_provider(cfg),
        provider => Some(provider),
    };
    match provider {
        Some(provider) => println!(
            "Provider: {:?} (configured {:?}), model: {}",
            provider,
            cfg.provider,
            effective_model_name(cfg, provider)
        ),
        None => {
            println!("Provider: none resolved");
            println!("Tip: export GOOGLE_API_KEY or run with --provider ollama");
        }
    }

    println!(
        "Workflow backend: {:?} (pace: {}ms, agent timeout: {}s)",
        cfg.workflow_backend,
        cfg.pace_ms,
        cfg.agent_timeout().as_secs()
    );
    println!(
        "Session: app={} user={} session_id={} (in-memory)",
        cfg.app_name, cfg.user_id, cfg.session_id
    );
    println!(
        "MongoDB: {} (database: {})",
        display_mongodb_uri(cfg),
        cfg.settings.mongodb_database
    );
    println!("Plaid environment: {}", cfg.settings.plaid_env.as_str());
    println!(
        "Amazon Fresh keys: access={} secret={}",
        display_secret(cfg, &cfg.settings.amazon_fresh_access_key),
        display_secret(cfg, &cfg.settings.amazon_fresh_secret_key)
    );

    println!("Connectors (tool source: {:?}):", cfg.tool_source);
    for connector in Connector::ALL {
        let creds = credentials(connector, &cfg.settings);
        let missing = creds
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect::<Vec<&str>>();
        let readiness = if missing.is_empty() {
            "ready".to_string()
        } else {
            format!("missing {}", missing.join(", "))
        };
        let transport = match cfg
            .connector_config(connector)
            .and_then(|entry| entry.endpoint.as_deref())
        {
            Some(endpoint) => format!("http {endpoint}"),
            None => format!("stdio {}", effective_launch_spec(cfg, connector).command),
        };
        println!(
            "- {}: enabled={} transport=[{}] credentials={}",
            connector.name(),
            cfg.connector_enabled(connector),
            transport,
            readiness
        );
    }

    println!(
        "Telemetry: enabled={} path={}",
        cfg.telemetry_enabled, cfg.telemetry_path
    );

    Ok(())
}
