//! End-to-end reconciliation scenarios against in-memory fakes.

use marshal_core::fakes::{
    completed, record, RecordingSleeper, ScriptedBackend, ScriptedStatusChecks,
};
use marshal_core::{
    CheckConclusion, CheckOutput, CheckResolver, CheckRunId, CheckStatus, Dispatched,
    DispatchMode, ListFilter, MarshalError, MatchBy, PollConfig, PullRequestInfo, RepoRef,
    Revision, RunContext, ValidationOutcome, ValidationRun,
};
use std::time::Duration;

const SHA: &str = "9f2c1e4b7a0d3c5e8f1a2b3c4d5e6f708192a3b4";

fn context(mode: DispatchMode, match_by: MatchBy) -> RunContext {
    RunContext {
        repo: RepoRef::new("octo-org", "payments"),
        pull_request: PullRequestInfo {
            number: 42,
            revision: Revision::new(SHA),
            branch: Some("feature/refunds".to_string()),
            body: Some("Support partial refunds".to_string()),
        },
        diff: "diff --git a/src/refund.rs b/src/refund.rs\n+fn partial() {}\n".to_string(),
        prompt: "Support partial refunds".to_string(),
        mode,
        match_by,
        check_run_id: None,
        poll: PollConfig::default(),
    }
}

fn async_context() -> RunContext {
    context(DispatchMode::Async, MatchBy::Name("build".to_string()))
}

#[tokio::test]
async fn scenario_a_no_check_run_ever_appears() {
    let checks = ScriptedStatusChecks::new();
    let backend = ScriptedBackend::accepting();
    let sleeper = RecordingSleeper::new();

    let err = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&async_context())
        .await
        .unwrap_err();

    match &err {
        MarshalError::ResolutionTimeout { revision, attempts } => {
            assert_eq!(revision, SHA);
            assert_eq!(*attempts, 10);
        }
        other => panic!("expected ResolutionTimeout, got {:?}", other),
    }
    assert!(err.to_string().contains(SHA));
    assert_eq!(checks.list_calls().len(), 10);
    assert_eq!(sleeper.count(), 9);
    assert!(backend.requests().is_empty(), "resolution timeout must not dispatch");
    assert!(checks.get_calls().is_empty());
}

#[tokio::test]
async fn scenario_b_check_run_appears_on_third_attempt() {
    let checks = ScriptedStatusChecks::new();
    checks.push_list(vec![]);
    checks.push_list(vec![]);
    checks.push_list(vec![record(77, "build", CheckStatus::InProgress)]);
    checks.push_list(vec![record(78, "build", CheckStatus::InProgress)]);
    let sleeper = RecordingSleeper::new();

    let resolver = CheckResolver::new(&checks, &sleeper, PollConfig::default().resolve);
    let id = resolver
        .resolve(&Revision::new(SHA), &MatchBy::Name("build".to_string()))
        .await
        .unwrap();

    assert_eq!(id, CheckRunId(77));
    assert_eq!(sleeper.count(), 2);
    assert_eq!(sleeper.durations(), vec![Duration::from_secs(2); 2]);

    let calls = checks.list_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls
        .iter()
        .all(|(rev, filter)| rev.as_str() == SHA && *filter == ListFilter::by_name("build")));
}

#[tokio::test]
async fn scenario_c_async_run_passes_after_polling() {
    let checks = ScriptedStatusChecks::new();
    checks.push_list(vec![
        record(10, "lint", CheckStatus::InProgress),
        record(11, "build", CheckStatus::Queued),
    ]);
    for _ in 0..5 {
        checks.push_get(record(11, "build", CheckStatus::InProgress));
    }
    let mut done = completed(11, "build", CheckConclusion::Success, "Marshal Validation Report");
    done.output.summary = Some("All checks passed".to_string());
    checks.push_get(done);

    let backend = ScriptedBackend::accepting();
    let sleeper = RecordingSleeper::new();

    let outcome = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&async_context())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert!(outcome.passed);
    assert_eq!(outcome.summary, "All checks passed");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].check_run_id, Some(CheckRunId(11)));
    assert_eq!(requests[0].commit, SHA);
    assert_eq!(requests[0].owner, "octo-org");
    assert_eq!(requests[0].repo, "payments");
    assert_eq!(requests[0].branch.as_deref(), Some("feature/refunds"));

    assert_eq!(checks.get_calls(), vec![CheckRunId(11); 6]);
    assert_eq!(sleeper.count(), 5);
}

#[tokio::test]
async fn scenario_d_check_run_never_completes() {
    let checks = ScriptedStatusChecks::new();
    checks.push_list(vec![record(11, "build", CheckStatus::InProgress)]);
    checks.set_default_get(record(11, "build", CheckStatus::InProgress));
    let backend = ScriptedBackend::accepting();
    let sleeper = RecordingSleeper::new();

    let err = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&async_context())
        .await
        .unwrap_err();

    match err {
        MarshalError::PollTimeout {
            check_run_id,
            attempts,
        } => {
            assert_eq!(check_run_id, CheckRunId(11));
            assert_eq!(attempts, 30);
        }
        other => panic!("expected PollTimeout, got {:?}", other),
    }
    assert_eq!(checks.get_calls().len(), 30);
    assert_eq!(sleeper.count(), 29);
}

#[tokio::test]
async fn scenario_e_failed_conclusion_surfaces_full_output() {
    let checks = ScriptedStatusChecks::new();
    checks.push_list(vec![record(11, "build", CheckStatus::InProgress)]);
    let mut failed = record(11, "build", CheckStatus::Completed);
    failed.conclusion = Some(CheckConclusion::Failure);
    failed.output = CheckOutput {
        title: Some("X".to_string()),
        summary: Some("Y".to_string()),
        text: Some("Z".to_string()),
    };
    checks.push_get(failed);
    let backend = ScriptedBackend::accepting();
    let sleeper = RecordingSleeper::new();

    let outcome = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&async_context())
        .await
        .unwrap();
    assert!(!outcome.passed);

    let err = outcome.into_result().unwrap_err();
    assert!(matches!(err, MarshalError::ValidationFailed(_)));
    let message = err.to_string();
    for part in ["X", "Y", "Z"] {
        assert!(message.contains(part), "message missing {part}: {message}");
    }
}

#[tokio::test]
async fn supplied_check_run_id_skips_resolution() {
    let checks = ScriptedStatusChecks::new();
    checks.push_get(completed(555, "build", CheckConclusion::Success, "ok"));
    let backend = ScriptedBackend::accepting();
    let sleeper = RecordingSleeper::new();

    let mut ctx = async_context();
    ctx.check_run_id = Some(CheckRunId(555));

    let outcome = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&ctx)
        .await
        .unwrap();

    assert!(outcome.passed);
    assert!(checks.list_calls().is_empty());
    assert_eq!(backend.requests()[0].check_run_id, Some(CheckRunId(555)));
}

#[tokio::test]
async fn dispatch_failure_never_polls() {
    let checks = ScriptedStatusChecks::new();
    checks.push_list(vec![record(11, "build", CheckStatus::InProgress)]);
    let backend = ScriptedBackend::with_response(Err(MarshalError::Dispatch(
        "backend returned 500 Internal Server Error in async mode: boom".to_string(),
    )));
    let sleeper = RecordingSleeper::new();

    let err = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&async_context())
        .await
        .unwrap_err();

    assert!(matches!(err, MarshalError::Dispatch(_)));
    assert_eq!(backend.requests().len(), 1);
    assert!(checks.get_calls().is_empty());
}

#[tokio::test]
async fn status_only_matching_takes_first_pending_check() {
    let checks = ScriptedStatusChecks::new();
    checks.push_list(vec![
        completed(1, "lint", CheckConclusion::Success, "done"),
        record(2, "deploy-preview", CheckStatus::InProgress),
        record(3, "build", CheckStatus::InProgress),
    ]);
    checks.push_get(completed(2, "deploy-preview", CheckConclusion::Success, "ok"));
    let backend = ScriptedBackend::accepting();
    let sleeper = RecordingSleeper::new();

    let ctx = context(DispatchMode::Async, MatchBy::StatusOnly);
    ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&ctx)
        .await
        .unwrap();

    assert_eq!(checks.list_calls()[0].1, ListFilter::default());
    assert_eq!(backend.requests()[0].check_run_id, Some(CheckRunId(2)));
}

#[tokio::test]
async fn list_error_aborts_resolution() {
    let checks = ScriptedStatusChecks::new();
    checks.fail_list("list check runs returned 401 Unauthorized: Bad credentials");
    let backend = ScriptedBackend::accepting();
    let sleeper = RecordingSleeper::new();

    let err = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&async_context())
        .await
        .unwrap_err();

    assert!(matches!(err, MarshalError::StatusCheck(_)));
    assert_eq!(checks.list_calls().len(), 1);
    assert_eq!(sleeper.count(), 0);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn sync_mode_publishes_report_without_polling() {
    let checks = ScriptedStatusChecks::new();
    let verdict = ValidationOutcome {
        passed: false,
        conclusion: CheckConclusion::Failure,
        summary: "Validation failed".to_string(),
        detail: "**Semantic Score:** 0.31".to_string(),
    };
    let backend = ScriptedBackend::with_response(Ok(Dispatched::Completed(verdict.clone())));
    let sleeper = RecordingSleeper::new();

    let ctx = context(DispatchMode::Sync, MatchBy::Name("build".to_string()));
    let outcome = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&ctx)
        .await
        .unwrap();

    assert_eq!(outcome, verdict);
    assert!(checks.list_calls().is_empty());
    assert!(checks.get_calls().is_empty());
    assert_eq!(sleeper.count(), 0);
    assert_eq!(backend.requests()[0].check_run_id, None);

    let created = checks.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "marshal/validate");
    assert_eq!(created[0].head_sha, SHA);
    assert_eq!(created[0].conclusion, CheckConclusion::Failure);
    assert_eq!(created[0].output.text.as_deref(), Some("**Semantic Score:** 0.31"));
}

#[tokio::test]
async fn async_backend_answering_inline_is_rejected() {
    let checks = ScriptedStatusChecks::new();
    checks.push_list(vec![record(11, "build", CheckStatus::InProgress)]);
    let backend = ScriptedBackend::with_response(Ok(Dispatched::Completed(ValidationOutcome {
        passed: true,
        conclusion: CheckConclusion::Success,
        summary: "All checks passed".to_string(),
        detail: String::new(),
    })));
    let sleeper = RecordingSleeper::new();

    let err = ValidationRun::new(&checks, &backend, &sleeper)
        .execute(&async_context())
        .await
        .unwrap_err();

    assert!(matches!(err, MarshalError::Dispatch(_)));
    assert!(checks.get_calls().is_empty());
}

#[tokio::test]
async fn resolver_budget_is_respected_for_any_attempt_count() {
    for max_attempts in 1..=6u32 {
        let checks = ScriptedStatusChecks::new();
        let sleeper = RecordingSleeper::new();
        let policy = marshal_core::RetryPolicy::new(max_attempts, Duration::from_millis(10));

        let result = CheckResolver::new(&checks, &sleeper, policy)
            .resolve(&Revision::new(SHA), &MatchBy::StatusOnly)
            .await;

        assert!(matches!(result, Err(MarshalError::ResolutionTimeout { .. })));
        assert_eq!(checks.list_calls().len(), max_attempts as usize);
        assert_eq!(sleeper.count(), max_attempts as usize - 1);
    }
}
