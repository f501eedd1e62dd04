//! Integration tests for resumption, pause, cancel and the license ceiling
//!
//! These tests verify that:
//! - A paused run resumes after the last processed token, processing every token exactly once
//! - A progress record written for a different token sequence is rejected before any work
//! - Cancel discards progress while pause keeps it
//! - The license ceiling stops a run early and leaves its progress for a later run

mod common;

use burstline::adapters::hooks::NoopHooks;
use burstline::adapters::Sender;
use burstline::core::burst::{BurstRequest, RunMode, StopReason};
use burstline::core::control::ControlRequest;
use burstline::core::state::ResumptionStore;
use burstline::domain::{BurstError, Token};
use common::{collaborators, processed, statements_csv, Fixture, MarkerHooks, RecordingSender};
use std::sync::Arc;
use test_case::test_case;

#[test_case(1 ; "pause after the first token")]
#[test_case(2 ; "pause after the second token")]
#[test_case(4 ; "pause before the last token")]
#[tokio::test]
async fn test_resume_processes_each_token_exactly_once(k: usize) {
    let fixture = Fixture::new(&statements_csv(5));
    let sender = RecordingSender::delivering();

    let config = fixture.config("first");
    let hooks = MarkerHooks::new(
        &fixture.temp(),
        fixture.job(),
        &format!("c{k}"),
        ControlRequest::Pause,
    );
    let first = fixture
        .burst(
            config.clone(),
            collaborators(&config, vec![sender.clone() as Arc<dyn Sender>], hooks, 25),
        )
        .await
        .unwrap();

    assert_eq!(first.stop_reason, StopReason::Paused);
    assert_eq!(first.processed.len(), k);
    let record = fixture.store().load(&fixture.job()).unwrap().unwrap();
    assert_eq!(record.last_token_processed, Token::new(format!("c{k}")));
    assert_eq!(record.remaining_token_count, (5 - k) as i64);

    let config = fixture.config("second");
    let second = fixture
        .burst(
            config.clone(),
            collaborators(&config, vec![sender.clone() as Arc<dyn Sender>], Arc::new(NoopHooks), 25),
        )
        .await
        .unwrap();

    assert_eq!(second.stop_reason, StopReason::Completed);
    let expected: Vec<String> = (k + 1..=5).map(|i| format!("c{i}")).collect();
    assert_eq!(processed(&second), expected);

    // every token distributed exactly once across both runs
    assert_eq!(sender.tokens(), vec!["c1", "c2", "c3", "c4", "c5"]);
    assert!(fixture.store().load(&fixture.job()).unwrap().is_none());
}

#[test_case(statements_csv(4) ; "fewer tokens")]
#[test_case(statements_csv(6) ; "more tokens")]
#[test_case("id,name,email,skip\nc1,A,a@example.com,no\nc2,B,b@example.com,no\nc3,C,c@example.com,no\nc4,D,d@example.com,no\nc9,E,e@example.com,no\n".to_string() ; "different last token")]
#[tokio::test]
async fn test_drift_is_fatal_before_any_token(changed_input: String) {
    let fixture = Fixture::new(&statements_csv(5));
    let config = fixture.config("first");
    let hooks = MarkerHooks::new(&fixture.temp(), fixture.job(), "c2", ControlRequest::Pause);
    fixture
        .burst(config.clone(), collaborators(&config, vec![], hooks, 25))
        .await
        .unwrap();

    fixture.rewrite_input(&changed_input);
    let sender = RecordingSender::delivering();
    let config = fixture.config("second");
    let err = fixture
        .burst(
            config.clone(),
            collaborators(&config, vec![sender.clone() as Arc<dyn Sender>], Arc::new(NoopHooks), 25),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BurstError::ProgressMismatch { .. }), "{err}");
    assert!(err.is_fatal_configuration());
    assert!(sender.tokens().is_empty());
    assert!(!fixture.artifact("c3").exists());
    // the stale record is kept so the operator can inspect it
    assert!(fixture.store().load(&fixture.job()).unwrap().is_some());
}

#[tokio::test]
async fn test_pause_keeps_progress_at_current_token() {
    let fixture = Fixture::new(&statements_csv(5));
    let config = fixture.config("run");
    let hooks = MarkerHooks::new(&fixture.temp(), fixture.job(), "c3", ControlRequest::Pause);

    let outcome = fixture
        .burst(config.clone(), collaborators(&config, vec![], hooks, 25))
        .await
        .unwrap();

    assert_eq!(outcome.stop_reason, StopReason::Paused);
    assert_eq!(processed(&outcome), vec!["c1", "c2", "c3"]);

    let record = fixture.store().load(&fixture.job()).unwrap().unwrap();
    assert_eq!(record.last_token_processed, Token::new("c3"));
    assert_eq!(record.index_of_last_token_processed, 2);
    assert!(!fixture.temp().join("statements.pause").exists());
}

#[tokio::test]
async fn test_cancel_discards_progress() {
    let fixture = Fixture::new(&statements_csv(5));
    let config = fixture.config("run");
    let hooks = MarkerHooks::new(&fixture.temp(), fixture.job(), "c3", ControlRequest::Cancel);

    let outcome = fixture
        .burst(config.clone(), collaborators(&config, vec![], hooks, 25))
        .await
        .unwrap();

    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert_eq!(processed(&outcome), vec!["c1", "c2", "c3"]);
    assert!(fixture.store().load(&fixture.job()).unwrap().is_none());
    assert!(!fixture.temp().join("statements.cancel").exists());
}

#[tokio::test]
async fn test_marker_present_before_run_stops_before_first_token() {
    let fixture = Fixture::new(&statements_csv(3));
    burstline::core::control::CancellationSignal::request(
        &fixture.temp(),
        &fixture.job(),
        ControlRequest::Pause,
    )
    .unwrap();

    let config = fixture.config("run");
    let outcome = fixture
        .burst(config.clone(), collaborators(&config, vec![], Arc::new(NoopHooks), 25))
        .await
        .unwrap();

    assert_eq!(outcome.mode, RunMode::MultiRecord);
    assert_eq!(outcome.stop_reason, StopReason::Paused);
    assert!(outcome.processed.is_empty());
    assert!(!fixture.artifact("c1").exists());
}

#[tokio::test]
async fn test_license_ceiling_stops_early_and_keeps_progress() {
    let fixture = Fixture::new(&statements_csv(5));
    let config = fixture.config("demo");

    let outcome = fixture
        .burst(config.clone(), collaborators(&config, vec![], Arc::new(NoopHooks), 2))
        .await
        .unwrap();

    assert_eq!(outcome.stop_reason, StopReason::LicenseLimit);
    assert_eq!(processed(&outcome), vec!["c1", "c2"]);
    let record = fixture.store().load(&fixture.job()).unwrap().unwrap();
    assert_eq!(record.last_token_processed, Token::new("c2"));

    let config = fixture.config("licensed");
    let outcome = fixture
        .burst(config.clone(), collaborators(&config, vec![], Arc::new(NoopHooks), 100))
        .await
        .unwrap();

    assert_eq!(outcome.stop_reason, StopReason::Completed);
    assert_eq!(processed(&outcome), vec!["c3", "c4", "c5"]);
}

#[tokio::test]
async fn test_license_limit_equal_to_token_count_completes() {
    let fixture = Fixture::new(&statements_csv(3));
    let config = fixture.config("run");

    let outcome = fixture
        .burst(config.clone(), collaborators(&config, vec![], Arc::new(NoopHooks), 3))
        .await
        .unwrap();

    assert_eq!(outcome.stop_reason, StopReason::Completed);
    assert!(fixture.store().load(&fixture.job()).unwrap().is_none());
}

#[tokio::test]
async fn test_resume_request_restores_qa_parameters() {
    let fixture = Fixture::new(&statements_csv(5));
    let config = fixture.config("first");
    let hooks = MarkerHooks::new(&fixture.temp(), fixture.job(), "c2", ControlRequest::Pause);
    let request = BurstRequest::new(&fixture.input).with_qa(burstline::core::qa::QaRequest {
        test_tokens: vec![Token::new("c2"), Token::new("c4"), Token::new("c5")],
        ..Default::default()
    });

    let first = fixture
        .burst_request(config.clone(), collaborators(&config, vec![], hooks, 25), request)
        .await
        .unwrap();
    assert_eq!(processed(&first), vec!["c2"]);

    let record = fixture.store().load(&fixture.job()).unwrap().unwrap();
    assert_eq!(record.explicit_test_tokens, "c2,c4,c5");
    let resumed = BurstRequest::from_progress(fixture.job(), &record);

    let config = fixture.config("second");
    let second = fixture
        .burst_request(
            config.clone(),
            collaborators(&config, vec![], Arc::new(NoopHooks), 25),
            resumed,
        )
        .await
        .unwrap();

    assert_eq!(processed(&second), vec!["c4", "c5"]);
    assert!(ResumptionStore::new(fixture.temp())
        .load(&fixture.job())
        .unwrap()
        .is_none());
}
