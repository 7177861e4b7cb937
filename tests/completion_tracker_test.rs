//! Completion tracking: ordering independence, single observation of terminal
//! jobs, and deadline handling. Time is paused so sleeps resolve instantly.

mod common;

use common::*;
use multiqueue::config::TrackerConfig;
use multiqueue::error::MultiQueueError;
use multiqueue::messaging::Job;
use multiqueue::orchestration::{CompletionCheck, PollingTracker};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn tracker() -> PollingTracker {
    PollingTracker::new(TrackerConfig {
        poll_interval_ms: 1,
        max_poll_interval_ms: 20,
        backoff_multiplier: 2.0,
    })
}

fn as_jobs(scripted: &[Arc<ScriptedJob>]) -> Vec<Job> {
    scripted.iter().map(ScriptedJob::as_job).collect()
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_jobs_finishing_in_any_order() {
    let scripted = vec![
        ScriptedJob::succeeds_after(5, json!("a")),
        ScriptedJob::succeeds_after(0, json!("b")),
        ScriptedJob::fails_after(2, "boom"),
        ScriptedJob::succeeds_after(3, json!("d")),
    ];
    let jobs = as_jobs(&scripted);
    let ids: Vec<_> = jobs.iter().map(|j| j.id()).collect();

    let done = tracker()
        .await_all(jobs, Instant::now() + Duration::from_secs(60))
        .await
        .unwrap();

    // returned in submission order, untouched
    assert_eq!(done.iter().map(|j| j.id()).collect::<Vec<_>>(), ids);
    for job in &done {
        assert!(job.is_terminal().await.unwrap());
    }
}

#[tokio::test(start_paused = true)]
async fn test_terminal_jobs_are_never_polled_again() {
    let scripted = vec![
        ScriptedJob::succeeds_after(0, json!(1)),
        ScriptedJob::succeeds_after(4, json!(2)),
        ScriptedJob::fails_after(1, "nope"),
        ScriptedJob::succeeds_after(7, json!(4)),
    ];

    tracker()
        .await_all(as_jobs(&scripted), Instant::now() + Duration::from_secs(60))
        .await
        .unwrap();

    // a job that turns terminal on its (n+1)th query is queried exactly n+1 times
    let counts: Vec<usize> = scripted.iter().map(|j| j.poll_count()).collect();
    assert_eq!(counts, vec![1, 5, 2, 8]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_reports_exactly_the_pending_indices() {
    let scripted = vec![
        ScriptedJob::succeeds_after(0, json!(0)),
        ScriptedJob::never_finishes(),
        ScriptedJob::succeeds_after(2, json!(2)),
        ScriptedJob::never_finishes(),
    ];

    let err = tracker()
        .await_all(as_jobs(&scripted), Instant::now() + Duration::from_millis(100))
        .await
        .unwrap_err();

    match err {
        MultiQueueError::Timeout { pending, timeout } => {
            assert_eq!(pending, vec![1, 3]);
            assert_eq!(timeout, Duration::from_millis(100));
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert_eq!(scripted[0].poll_count(), 1);
    assert_eq!(scripted[2].poll_count(), 3);
    assert!(scripted[1].poll_count() > 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_timeout_sweeps_once() {
    let scripted = vec![
        ScriptedJob::succeeds_after(0, json!(0)),
        ScriptedJob::succeeds_after(1, json!(1)),
    ];

    let err = tracker()
        .await_all(as_jobs(&scripted), Instant::now())
        .await
        .unwrap_err();

    assert_eq!(err.pending_indices(), Some(&[1usize][..]));
    assert_eq!(scripted[0].poll_count(), 1);
    assert_eq!(scripted[1].poll_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_status_errors_are_retried() {
    let scripted = vec![ScriptedJob::flaky_then_succeeds(3, json!("late"))];

    tracker()
        .await_all(as_jobs(&scripted), Instant::now() + Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(scripted[0].poll_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_is_wall_clock_not_poll_count() {
    let scripted = vec![ScriptedJob::never_finishes()];
    let started = Instant::now();

    tracker()
        .await_all(as_jobs(&scripted), started + Duration::from_secs(2))
        .await
        .unwrap_err();

    // the last sleep is clipped to the deadline instead of a full backoff step
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_millis(2010), "overslept: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_unvalidated_backoff_still_polls_to_completion() {
    let scripted = vec![ScriptedJob::succeeds_after(3, json!("done"))];
    let tracker = PollingTracker::new(TrackerConfig {
        poll_interval_ms: 1,
        max_poll_interval_ms: 20,
        backoff_multiplier: f64::NAN,
    });

    tracker
        .await_all(as_jobs(&scripted), Instant::now() + Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(scripted[0].poll_count(), 4);
}

#[tokio::test]
async fn test_empty_batch_is_trivially_complete() {
    let done = tracker()
        .await_all(Vec::new(), Instant::now() + Duration::from_secs(1))
        .await
        .unwrap();
    assert!(done.is_empty());
}
