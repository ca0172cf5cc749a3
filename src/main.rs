use anyhow::Result;
use clap::Parser;
use edwardo::app::run_cli;
use edwardo::cli::Cli;
use edwardo::error::{categorize_error, format_cli_error, render_error_message};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so clap's env fallbacks see its values.
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let err = anyhow::Error::new(err);
            eprintln!("{}", format_cli_error(&err, false));
            std::process::exit(2);
        }
        Err(err) => err.exit(),
    };

    let show_sensitive = cli.show_sensitive_config;
    if let Err(err) = run_cli(cli).await {
        eprintln!("{}", format_cli_error(&err, show_sensitive));
        tracing::error!(
            category = %categorize_error(&err).code(),
            error = %render_error_message(&err, show_sensitive),
            "command failed"
        );
        std::process::exit(1);
    }
    Ok(())
}
