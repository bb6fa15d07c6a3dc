mod common;
use crate::common::builders::{MockHarness, WatchOptionsBuilder};
use crate::common::init_tracing;
use crate::common::recorder::CallbackRecorder;

use std::error::Error;
use std::io;
use std::time::Duration;

type TestResult = Result<(), Box<dyn Error>>;

const PATH: &str = "/srv/state/flaky.txt";

#[test]
fn transient_read_failures_are_retried_until_success() -> TestResult {
    init_tracing();

    let harness = MockHarness::new(
        WatchOptionsBuilder::new()
            .retry_after(Duration::from_millis(40))
            .build(),
    );
    harness.fs.write_lines(PATH, &["payload"]);
    harness
        .fs
        .fail_next_reads(PATH, 3, io::ErrorKind::PermissionDenied);

    let recorder = CallbackRecorder::new();
    let watched = harness
        .engine
        .watch_file_lines(PATH, recorder.on_changed(), recorder.on_error(), false)?;

    assert!(recorder.wait_for_errors(1, Duration::from_secs(1)));
    assert!(watched.is_pending(), "pending must hold while a retry waits");
    assert!(!watched.refresh(), "refresh during retry backoff must be dropped");

    assert!(recorder.wait_for_deliveries(1, Duration::from_secs(2)));
    assert!(!watched.is_pending());

    let errors = recorder.errors();
    assert_eq!(errors.len(), 3);
    assert!(
        errors
            .iter()
            .all(|e| e.kind == Some(io::ErrorKind::PermissionDenied) && !e.not_found)
    );
    assert_eq!(recorder.deliveries(), vec![vec!["payload".to_string()]]);
    assert_eq!(harness.fs.read_stats(PATH).reads, 4);
    Ok(())
}

#[test]
fn vanished_file_keeps_retrying_and_recovers_when_it_returns() -> TestResult {
    init_tracing();

    let harness = MockHarness::new(
        WatchOptionsBuilder::new()
            .retry_after(Duration::from_millis(25))
            .build(),
    );
    harness.fs.write_lines(PATH, &["first"]);

    let recorder = CallbackRecorder::new();
    harness
        .engine
        .watch_file_lines(PATH, recorder.on_changed(), recorder.on_error(), false)?;
    assert!(recorder.wait_for_deliveries(1, Duration::from_secs(1)));

    harness.fs.remove(PATH);
    assert_eq!(harness.engine.poll_now(), 1);

    assert!(recorder.wait_for_errors(4, Duration::from_secs(2)));
    assert!(recorder.errors().iter().all(|e| e.not_found));
    assert_eq!(recorder.deliveries().len(), 1);

    harness.fs.write_lines(PATH, &["second", "coming"]);
    let expected = vec!["second".to_string(), "coming".to_string()];
    assert!(recorder.wait_for_latest(&expected, Duration::from_secs(1)));
    Ok(())
}

#[test]
fn stat_failure_during_poll_is_reported_and_polling_continues() -> TestResult {
    init_tracing();

    let harness = MockHarness::new(WatchOptionsBuilder::new().build());
    harness.fs.write_lines("/srv/state/a.txt", &["a"]);
    harness.fs.write_lines("/srv/state/b.txt", &["b"]);

    let rec_a = CallbackRecorder::new();
    let rec_b = CallbackRecorder::new();
    harness.engine.watch_file_lines(
        "/srv/state/a.txt",
        rec_a.on_changed(),
        rec_a.on_error(),
        false,
    )?;
    harness.engine.watch_file_lines(
        "/srv/state/b.txt",
        rec_b.on_changed(),
        rec_b.on_error(),
        false,
    )?;
    assert!(rec_a.wait_for_deliveries(1, Duration::from_secs(1)));
    assert!(rec_b.wait_for_deliveries(1, Duration::from_secs(1)));

    harness
        .fs
        .fail_stats("/srv/state/a.txt", Some(io::ErrorKind::PermissionDenied));
    harness.fs.write_lines("/srv/state/b.txt", &["b2"]);

    assert_eq!(harness.engine.poll_now(), 1);

    assert!(rec_a.wait_for_errors(1, Duration::from_secs(1)));
    assert_eq!(
        rec_a.errors()[0].kind,
        Some(io::ErrorKind::PermissionDenied)
    );
    let expected = vec!["b2".to_string()];
    assert!(rec_b.wait_for_latest(&expected, Duration::from_secs(1)));
    assert!(rec_b.errors().is_empty());
    Ok(())
}
