//! Action inputs and run context construction.
//!
//! Inputs come from flags or from the variables the Actions runner sets
//! (`INPUT_*` for `with:` values, `GITHUB_*` for the job). The runner
//! exports unset optional inputs as empty strings, so blanks count as absent.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, ValueEnum};
use marshal_core::retry::{
    DEFAULT_INTERVAL_MS, DEFAULT_POLL_ATTEMPTS, DEFAULT_RESOLVE_ATTEMPTS,
};
use marshal_core::{
    resolve_prompt, CheckRunId, DispatchMode, MarshalError, MatchBy, PollConfig, PullRequestInfo,
    RepoRef, Result, RunContext, DEFAULT_API_BASE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Resolve the job's check run, dispatch, then poll it
    Async,
    /// Dispatch without a check run and publish the inline verdict
    Sync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchByArg {
    /// Match the check run by job name
    Name,
    /// Take the first check run that has not completed
    StatusOnly,
}

#[derive(Debug, Clone, Args)]
pub struct ActionInputs {
    /// Validation backend base URL
    #[arg(long, env = "INPUT_API-URL")]
    pub api_url: Option<String>,

    /// Validation backend API key
    #[arg(long, env = "INPUT_API-KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Token for the GitHub checks and pulls APIs
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Job token exported by the workflow; used when github-token is unset
    #[arg(long, env = "GITHUB_TOKEN", hide = true, hide_env_values = true)]
    pub workflow_token: Option<String>,

    /// Prompt override (defaults to the pull request body)
    #[arg(long, env = "INPUT_PROMPT")]
    pub prompt: Option<String>,

    /// Dispatch mode: async or sync [default: async]
    #[arg(long, env = "INPUT_MODE")]
    pub mode: Option<String>,

    /// How to find the job's check run: name or status-only [default: name]
    #[arg(long, env = "INPUT_MATCH-BY")]
    pub match_by: Option<String>,

    /// Check run name to match (defaults to the job id)
    #[arg(long, env = "INPUT_CHECK-NAME")]
    pub check_name: Option<String>,

    /// Job id of the running workflow job
    #[arg(long, env = "GITHUB_JOB", hide = true)]
    pub job: Option<String>,

    /// Known check run id; skips resolution
    #[arg(long, env = "INPUT_CHECK-RUN-ID")]
    pub check_run_id: Option<String>,

    /// Attempts to find the check run [default: 10]
    #[arg(long, env = "INPUT_RESOLVE-ATTEMPTS")]
    pub resolve_attempts: Option<String>,

    /// Attempts to wait for completion [default: 30]
    #[arg(long, env = "INPUT_POLL-ATTEMPTS")]
    pub poll_attempts: Option<String>,

    /// Pause between attempts in milliseconds [default: 2000]
    #[arg(long, env = "INPUT_POLL-INTERVAL-MS")]
    pub poll_interval_ms: Option<String>,

    /// Read the diff from a file instead of the pulls API
    #[arg(long, env = "INPUT_DIFF-FILE")]
    pub diff_file: Option<PathBuf>,

    /// Path of the webhook event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    /// Repository in owner/repo form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    pub github_api_url: String,
}

/// Treat blank values as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    present(value).ok_or_else(|| MarshalError::Configuration(format!("{name} is required")))
}

fn number_or<T: FromStr>(value: &Option<String>, name: &str, default: T) -> Result<T> {
    match present(value) {
        Some(raw) => raw.parse().map_err(|_| {
            MarshalError::Configuration(format!("{name} must be a number, got '{raw}'"))
        }),
        None => Ok(default),
    }
}

fn choice_or<T: ValueEnum>(value: &Option<String>, name: &str, default: T) -> Result<T> {
    match present(value) {
        Some(raw) => <T as ValueEnum>::from_str(raw, true).map_err(|_| {
            let allowed: Vec<String> = T::value_variants()
                .iter()
                .filter_map(|v| v.to_possible_value())
                .map(|v| v.get_name().to_string())
                .collect();
            MarshalError::Configuration(format!(
                "{name} must be one of {}, got '{raw}'",
                allowed.join(", ")
            ))
        }),
        None => Ok(default),
    }
}

impl ActionInputs {
    pub fn api_url(&self) -> Result<&str> {
        required(&self.api_url, "api-url")
    }

    pub fn api_key(&self) -> Result<&str> {
        required(&self.api_key, "api-key")
    }

    pub fn github_token(&self) -> Result<&str> {
        present(&self.github_token)
            .or_else(|| present(&self.workflow_token))
            .ok_or_else(|| MarshalError::Configuration("github-token is required".to_string()))
    }

    pub fn repo(&self) -> Result<RepoRef> {
        RepoRef::parse(required(&self.repository, "repository")?)
    }

    pub fn diff_file(&self) -> Option<&Path> {
        self.diff_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn check_run_id(&self) -> Result<Option<CheckRunId>> {
        present(&self.check_run_id)
            .map(|raw| {
                raw.parse::<u64>().map(CheckRunId).map_err(|_| {
                    MarshalError::Configuration(format!(
                        "check-run-id must be a number, got '{raw}'"
                    ))
                })
            })
            .transpose()
    }

    pub fn dispatch_mode(&self) -> Result<DispatchMode> {
        Ok(match choice_or(&self.mode, "mode", ModeArg::Async)? {
            ModeArg::Async => DispatchMode::Async,
            ModeArg::Sync => DispatchMode::Sync,
        })
    }

    pub fn poll_config(&self) -> Result<PollConfig> {
        Ok(PollConfig::new(
            number_or(&self.resolve_attempts, "resolve-attempts", DEFAULT_RESOLVE_ATTEMPTS)?,
            number_or(&self.poll_attempts, "poll-attempts", DEFAULT_POLL_ATTEMPTS)?,
            Duration::from_millis(number_or(
                &self.poll_interval_ms,
                "poll-interval-ms",
                DEFAULT_INTERVAL_MS,
            )?),
        ))
    }

    /// The matching rule for Phase 1.
    ///
    /// Name matching needs a name only when resolution will actually run.
    pub fn match_by(&self) -> Result<MatchBy> {
        if choice_or(&self.match_by, "match-by", MatchByArg::Name)? == MatchByArg::StatusOnly {
            return Ok(MatchBy::StatusOnly);
        }

        let name = present(&self.check_name).or_else(|| present(&self.job));
        match name {
            Some(name) => Ok(MatchBy::Name(name.to_string())),
            None if self.needs_resolution()? => Err(MarshalError::Configuration(
                "check-name is required when match-by is name and GITHUB_JOB is not set"
                    .to_string(),
            )),
            None => Ok(MatchBy::StatusOnly),
        }
    }

    fn needs_resolution(&self) -> Result<bool> {
        Ok(self.dispatch_mode()? == DispatchMode::Async && self.check_run_id()?.is_none())
    }

    /// Load the pull request from the event payload file.
    pub fn pull_request(&self) -> Result<PullRequestInfo> {
        let path = self.event_path.as_deref().ok_or_else(|| {
            MarshalError::Configuration(
                "GITHUB_EVENT_PATH is not set; no pull_request context".to_string(),
            )
        })?;
        let payload = std::fs::read_to_string(path)?;
        PullRequestInfo::from_event_json(&payload)
    }

    /// Assemble the immutable run context.
    pub fn run_context(
        &self,
        repo: RepoRef,
        pull_request: PullRequestInfo,
        diff: String,
    ) -> Result<RunContext> {
        let prompt = resolve_prompt(present(&self.prompt), pull_request.body.as_deref());

        Ok(RunContext {
            repo,
            pull_request,
            diff,
            prompt,
            mode: self.dispatch_mode()?,
            match_by: self.match_by()?,
            check_run_id: self.check_run_id()?,
            poll: self.poll_config()?,
        })
    }
}
