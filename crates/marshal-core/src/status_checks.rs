//! Status-check service client
//!
//! [`StatusCheckClient`] is the seam the resolver and poller talk to.
//! [`GitHubClient`] implements it against the GitHub checks REST API and
//! also fetches pull-request diffs.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::check_run::{CheckRunId, CheckRunRecord, ListFilter, NewCheckRun, Revision};
use crate::context::RepoRef;
use crate::error::{MarshalError, Result};
use crate::http::{build_client, trim_base, truncate_body};

/// Default GitHub REST endpoint (`GITHUB_API_URL` on hosted runners).
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const GITHUB_JSON: &str = "application/vnd.github+json";
const GITHUB_DIFF: &str = "application/vnd.github.v3.diff";
const API_VERSION: &str = "2022-11-28";

/// Largest page GitHub serves for check-run listings.
const PER_PAGE: u32 = 100;

/// Read access to check runs, plus publishing a finished one.
#[async_trait]
pub trait StatusCheckClient: Send + Sync {
    /// List check runs on a revision, pre-filtered server-side.
    async fn list(&self, revision: &Revision, filter: &ListFilter) -> Result<Vec<CheckRunRecord>>;

    /// Fetch one check run by id.
    async fn get(&self, id: CheckRunId) -> Result<CheckRunRecord>;

    /// Create a check run. Used only to publish sync-mode verdicts.
    async fn create(&self, check: &NewCheckRun) -> Result<CheckRunRecord>;
}

#[derive(Deserialize)]
struct CheckRunList {
    #[serde(default)]
    total_count: u64,
    check_runs: Vec<CheckRunRecord>,
}

/// GitHub REST client scoped to one repository.
pub struct GitHubClient {
    api_base: String,
    token: String,
    repo: RepoRef,
    http_client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(api_base: &str, token: &str, repo: RepoRef) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(MarshalError::Configuration(
                "GitHub token is required".to_string(),
            ));
        }

        Ok(GitHubClient {
            api_base: trim_base(api_base).to_string(),
            token: token.to_string(),
            repo,
            http_client: build_client()?,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.repo.owner, self.repo.name, path
        )
    }

    fn request(&self, method: reqwest::Method, url: &str, accept: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Send a request and hand back the body of a 2xx response.
    async fn send(&self, builder: reqwest::RequestBuilder, what: &str) -> Result<String> {
        let response = builder
            .send()
            .await
            .map_err(|e| MarshalError::StatusCheck(format!("{what}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MarshalError::StatusCheck(format!("{what}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(MarshalError::StatusCheck(format!(
                "{what} returned {status}: {}",
                truncate_body(&body)
            )));
        }

        Ok(body)
    }

    fn parse<T: serde::de::DeserializeOwned>(body: &str, what: &str) -> Result<T> {
        serde_json::from_str(body)
            .map_err(|e| MarshalError::StatusCheck(format!("{what}: malformed response: {e}")))
    }

    /// Fetch the unified diff of a pull request.
    pub async fn pull_request_diff(&self, number: u64) -> Result<String> {
        let url = self.repo_url(&format!("pulls/{number}"));
        self.send(
            self.request(reqwest::Method::GET, &url, GITHUB_DIFF),
            &format!("fetch diff for pull request #{number}"),
        )
        .await
    }
}

#[async_trait]
impl StatusCheckClient for GitHubClient {
    async fn list(&self, revision: &Revision, filter: &ListFilter) -> Result<Vec<CheckRunRecord>> {
        let url = self.repo_url(&format!("commits/{revision}/check-runs"));

        let mut query: Vec<(&str, String)> = vec![("per_page", PER_PAGE.to_string())];
        if let Some(name) = &filter.name {
            query.push(("check_name", name.clone()));
        }
        if let Some(status) = filter.status {
            query.push(("status", status.as_str().to_string()));
        }

        let body = self
            .send(
                self.request(reqwest::Method::GET, &url, GITHUB_JSON).query(&query),
                "list check runs",
            )
            .await?;
        let list: CheckRunList = Self::parse(&body, "list check runs")?;

        debug!(
            revision = %revision,
            total = list.total_count,
            returned = list.check_runs.len(),
            "Listed check runs"
        );
        Ok(list.check_runs)
    }

    async fn get(&self, id: CheckRunId) -> Result<CheckRunRecord> {
        let url = self.repo_url(&format!("check-runs/{id}"));
        let what = format!("get check run {id}");
        let body = self
            .send(self.request(reqwest::Method::GET, &url, GITHUB_JSON), &what)
            .await?;
        Self::parse(&body, &what)
    }

    async fn create(&self, check: &NewCheckRun) -> Result<CheckRunRecord> {
        let url = self.repo_url("check-runs");
        let body = self
            .send(
                self.request(reqwest::Method::POST, &url, GITHUB_JSON).json(check),
                "create check run",
            )
            .await?;
        Self::parse(&body, "create check run")
    }
}
