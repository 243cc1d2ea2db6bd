//! Marshal - pull-request validation for GitHub Actions
//!
//! Sends the pull request's diff and intent to the Marshal backend and
//! reports the verdict through a check run. Exits 0 only when validation
//! passes.

mod actions;
mod config;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use marshal_core::{GitHubClient, HttpValidationBackend, TokioSleeper, ValidationRun};
use tracing::{error, info, Level};

use crate::config::ActionInputs;

#[derive(Parser)]
#[command(name = "marshal")]
#[command(version = marshal_core::VERSION)]
#[command(about = "Validate a pull request and report through a check run", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    inputs: ActionInputs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    marshal_core::init_tracing(cli.json, level);

    match run(&cli.inputs).await {
        Ok(summary) => {
            info!(%summary, "Marshal validation passed");
            actions::notice(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let message = format!("Action failed: {err:#}");
            error!("{message}");
            actions::set_failed(&message);
            ExitCode::FAILURE
        }
    }
}

/// Build the run context, execute the run and return the pass summary.
async fn run(inputs: &ActionInputs) -> Result<String> {
    let api_url = inputs.api_url()?;
    let api_key = inputs.api_key()?;
    let token = inputs.github_token()?;
    let repo = inputs.repo()?;
    let pull_request = inputs
        .pull_request()
        .context("Failed to load pull request context")?;

    let github = GitHubClient::new(&inputs.github_api_url, token, repo)?;

    let diff = match inputs.diff_file() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read diff file {}", path.display()))?,
        None => github
            .pull_request_diff(pull_request.number)
            .await
            .context("Failed to fetch pull request diff")?,
    };

    let ctx = inputs.run_context(github.repo().clone(), pull_request, diff)?;
    let backend = HttpValidationBackend::new(api_url, api_key)?;

    let outcome = ValidationRun::new(&github, &backend, &TokioSleeper)
        .execute(&ctx)
        .await?
        .into_result()?;

    Ok(outcome.summary)
}
