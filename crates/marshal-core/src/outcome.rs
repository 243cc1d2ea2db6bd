//! Mapping terminal check state and inline verdicts to a pass/fail outcome.
//!
//! Everything here is pure: no I/O, same input, same outcome.

use crate::check_run::{
    CheckConclusion, CheckOutput, CheckRunRecord, CheckStatus, NewCheckRun, Revision,
};
use crate::dispatch::SyncVerdict;
use crate::error::{MarshalError, Result};

/// Check run name used when publishing sync-mode verdicts.
pub const REPORT_CHECK_NAME: &str = "marshal/validate";

/// Title of the published report.
pub const REPORT_TITLE: &str = "Marshal Validation Report";

/// Final verdict of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub passed: bool,
    /// Conclusion as reported by, or published to, the check run.
    pub conclusion: CheckConclusion,
    /// One-line summary for logs.
    pub summary: String,
    /// Long-form diagnostic text.
    pub detail: String,
}

impl ValidationOutcome {
    /// Single human-readable message: summary followed by the detail.
    pub fn message(&self) -> String {
        if self.detail.is_empty() {
            self.summary.clone()
        } else {
            format!("{}\n{}", self.summary, self.detail)
        }
    }

    /// `Ok` on pass, `ValidationFailed` carrying the message otherwise.
    pub fn into_result(self) -> Result<ValidationOutcome> {
        if self.passed {
            Ok(self)
        } else {
            Err(MarshalError::ValidationFailed(self.message()))
        }
    }

    /// The completed check run that reports this outcome on `revision`.
    pub fn to_check_run(&self, revision: &Revision) -> NewCheckRun {
        NewCheckRun {
            name: REPORT_CHECK_NAME.to_string(),
            head_sha: revision.to_string(),
            status: CheckStatus::Completed,
            conclusion: self.conclusion.clone(),
            output: CheckOutput {
                title: Some(REPORT_TITLE.to_string()),
                summary: Some(self.summary.clone()),
                text: Some(self.detail.clone()).filter(|t| !t.is_empty()),
            },
        }
    }
}

/// Builds [`ValidationOutcome`]s.
pub struct OutcomeReporter;

impl OutcomeReporter {
    /// Map a completed check run. Pass iff the conclusion is `success`.
    ///
    /// On failure the output title, summary and text are all carried in
    /// the detail so the caller can surface one diagnostic message.
    pub fn from_check(record: &CheckRunRecord) -> ValidationOutcome {
        let conclusion = record
            .conclusion
            .clone()
            .unwrap_or_else(|| CheckConclusion::Unknown("none".to_string()));
        let passed = conclusion.is_success();

        let parts: Vec<&str> = [
            record.output.title.as_deref(),
            record.output.summary.as_deref(),
            record.output.text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

        let summary = if passed {
            record
                .output
                .summary
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| format!("Check run '{}' succeeded", record.name))
        } else {
            format!("Check run '{}' concluded {}", record.name, conclusion)
        };

        ValidationOutcome {
            passed,
            conclusion,
            summary,
            detail: parts.join("\n\n"),
        }
    }

    /// Map an inline sync-mode verdict.
    pub fn from_verdict(verdict: &SyncVerdict) -> Result<ValidationOutcome> {
        let passed = verdict.passed().ok_or_else(|| {
            MarshalError::Dispatch("backend verdict has neither 'pass' nor 'status'".to_string())
        })?;

        let mut lines = Vec::new();
        if let Some(score) = verdict.score {
            lines.push(format!("**Semantic Score:** {score}"));
        }
        if let Some(tests) = &verdict.tests {
            let result = if tests.lint && tests.tests {
                "✔ Passed"
            } else {
                "❌ Issues"
            };
            lines.push(format!("**Tests:** {result}"));
        }
        if let Some(url) = &verdict.preview_url {
            lines.push(format!("**Preview:** {url}"));
        }
        if let Some(reason) = verdict.reason.as_deref().filter(|r| !r.trim().is_empty()) {
            lines.push(format!("**Reason:** {reason}"));
        }

        Ok(ValidationOutcome {
            passed,
            conclusion: if passed {
                CheckConclusion::Success
            } else {
                CheckConclusion::Failure
            },
            summary: if passed {
                "All checks passed".to_string()
            } else {
                "Validation failed".to_string()
            },
            detail: lines.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check_run::CheckRunId;
    use crate::dispatch::TestResults;

    fn completed_record(conclusion: CheckConclusion) -> CheckRunRecord {
        CheckRunRecord {
            id: CheckRunId(3),
            name: "build".to_string(),
            head_sha: "abc".to_string(),
            status: CheckStatus::Completed,
            conclusion: Some(conclusion),
            output: CheckOutput {
                title: Some("X".to_string()),
                summary: Some("Y".to_string()),
                text: Some("Z".to_string()),
            },
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_only_success_passes() {
        for conclusion in CheckConclusion::KNOWN {
            let outcome = OutcomeReporter::from_check(&completed_record(conclusion.clone()));
            assert_eq!(outcome.passed, conclusion == CheckConclusion::Success, "{conclusion}");
            assert_eq!(outcome.conclusion, conclusion);
        }
    }

    #[test]
    fn test_unknown_conclusion_fails() {
        let outcome = OutcomeReporter::from_check(&completed_record(CheckConclusion::Unknown(
            "flaky".into(),
        )));
        assert!(!outcome.passed);
        assert!(outcome.summary.contains("flaky"));
    }

    #[test]
    fn test_failure_message_carries_full_output() {
        for conclusion in CheckConclusion::KNOWN
            .into_iter()
            .filter(|c| !c.is_success())
        {
            let outcome = OutcomeReporter::from_check(&completed_record(conclusion.clone()));
            let message = outcome.message();
            assert!(message.contains(conclusion.as_str()));
            for part in ["X", "Y", "Z"] {
                assert!(message.contains(part), "{conclusion}: missing {part}");
            }
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let record = completed_record(CheckConclusion::TimedOut);
        assert_eq!(OutcomeReporter::from_check(&record), OutcomeReporter::from_check(&record));
    }

    #[test]
    fn test_success_summary_uses_output_summary() {
        let outcome = OutcomeReporter::from_check(&completed_record(CheckConclusion::Success));
        assert_eq!(outcome.summary, "Y");
        assert!(outcome.clone().into_result().is_ok());
    }

    #[test]
    fn test_missing_output_and_conclusion() {
        let mut record = completed_record(CheckConclusion::Failure);
        record.output = CheckOutput::default();
        record.conclusion = None;

        let outcome = OutcomeReporter::from_check(&record);
        assert!(!outcome.passed);
        assert!(outcome.detail.is_empty());
        assert_eq!(outcome.message(), "Check run 'build' concluded none");
    }

    #[test]
    fn test_into_result_on_failure() {
        let outcome = OutcomeReporter::from_check(&completed_record(CheckConclusion::Failure));
        match outcome.into_result() {
            Err(MarshalError::ValidationFailed(message)) => assert!(message.contains("Z")),
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_verdict_report_text() {
        let verdict = SyncVerdict {
            status: Some("pass".to_string()),
            score: Some(0.87),
            tests: Some(TestResults {
                lint: true,
                tests: true,
            }),
            preview_url: Some("https://preview.example.com/42".to_string()),
            ..Default::default()
        };

        let outcome = OutcomeReporter::from_verdict(&verdict).unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.summary, "All checks passed");
        assert_eq!(
            outcome.detail,
            "**Semantic Score:** 0.87\n**Tests:** ✔ Passed\n**Preview:** https://preview.example.com/42"
        );
    }

    #[test]
    fn test_verdict_failure_with_reason() {
        let verdict = SyncVerdict {
            pass: Some(false),
            score: Some(0.2),
            reason: Some("diff does not match the stated intent".to_string()),
            ..Default::default()
        };

        let outcome = OutcomeReporter::from_verdict(&verdict).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.conclusion, CheckConclusion::Failure);
        assert!(outcome.message().contains("does not match"));
    }

    #[test]
    fn test_verdict_without_result_is_dispatch_error() {
        let err = OutcomeReporter::from_verdict(&SyncVerdict::default()).unwrap_err();
        assert!(matches!(err, MarshalError::Dispatch(_)));
    }

    #[test]
    fn test_published_check_run() {
        let outcome = OutcomeReporter::from_verdict(&SyncVerdict {
            pass: Some(false),
            ..Default::default()
        })
        .unwrap();

        let check = outcome.to_check_run(&Revision::new("abc123"));
        assert_eq!(check.name, REPORT_CHECK_NAME);
        assert_eq!(check.head_sha, "abc123");
        assert_eq!(check.status, CheckStatus::Completed);
        assert_eq!(check.conclusion, CheckConclusion::Failure);
        assert_eq!(check.output.title.as_deref(), Some(REPORT_TITLE));
        assert_eq!(check.output.summary.as_deref(), Some("Validation failed"));
        assert!(check.output.text.is_none());
    }
}
