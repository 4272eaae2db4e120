use std::process::ExitCode;

use clap::Parser;

mod cli;

use guidebook::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "guidebook=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    // stdout carries command output
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let args = cli::Cli::parse();
    let state = AppState::init()?;
    tracing::debug!(api_base = %state.config.api_base, "configuration loaded");

    let mut stdout = std::io::stdout().lock();
    let ok = cli::run(args, &state, &mut stdout).await?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
