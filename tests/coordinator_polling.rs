//! Poll-mode coordinator behaviour: satisfaction, progress-resetting
//! timeout, partial harvest, harvest ordering.
//!
//! These tests run under Tokio's paused clock, so the "seconds" below are
//! virtual and the tests complete instantly.

use std::sync::Arc;
use std::time::Duration;

use stagerun::errors::StagerunError;
use stagerun::fs::mock::MockFileSystem;
use stagerun::run::{RunCoordinator, RunOutcome};
use stagerun_test_utils::builders::RunSpecBuilder;
use stagerun_test_utils::fake_launcher::FakeLauncher;
use stagerun_test_utils::harvest::RecordingHarvester;
use stagerun_test_utils::init_tracing;

fn staging_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir("staging");
    fs
}

fn two_suffix_spec() -> stagerun::run::RunSpec {
    RunSpecBuilder::new("/opt/tool/stitch")
        .poll_mode()
        .expect_suffix("-a.tif")
        .expect_suffix("-b.tif")
        .poll_interval(Duration::from_secs(1))
        .per_item_timeout(Duration::from_secs(5))
        .build()
}

/// "-a.tif" at t=1.5, "-b.tif" at t=2.5 with timeout 5 =>
/// Satisfied, both harvested, bounded by poll granularity.
#[tokio::test(start_paused = true)]
async fn all_artifacts_in_time_is_satisfied() {
    init_tracing();
    let fs = staging_fs();
    let mut coordinator =
        RunCoordinator::new(FakeLauncher::detaches(), Arc::new(fs.clone()));

    {
        let fs = fs.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            fs.add_file("staging/out-a.tif", b"data".to_vec());
            tokio::time::sleep(Duration::from_millis(1000)).await;
            fs.add_file("staging/out-b.tif", b"data".to_vec());
        });
    }

    let mut harvester = RecordingHarvester::new();
    let calls = harvester.calls();
    let result = coordinator
        .start(two_suffix_spec(), &mut harvester)
        .await
        .unwrap();

    assert_eq!(result.outcome, RunOutcome::Satisfied);
    assert!(result.timed_out_matchers.is_empty());
    assert!(!result.cancelled);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].matcher_index, 0);
    assert_eq!(calls[1].matcher_index, 1);
}

/// Artifacts appearing out of matcher order are still harvested in matcher
/// order.
#[tokio::test(start_paused = true)]
async fn harvest_follows_matcher_order_not_discovery_order() {
    init_tracing();
    let fs = staging_fs();
    let mut coordinator =
        RunCoordinator::new(FakeLauncher::detaches(), Arc::new(fs.clone()));

    {
        let fs = fs.clone();
        tokio::spawn(async move {
            // "-b.tif" (matcher 1) lands before "-a.tif" (matcher 0).
            tokio::time::sleep(Duration::from_millis(500)).await;
            fs.add_file("staging/out-b.tif", b"data".to_vec());
            tokio::time::sleep(Duration::from_millis(2000)).await;
            fs.add_file("staging/out-a.tif", b"data".to_vec());
        });
    }

    let mut harvester = RecordingHarvester::new();
    let calls = harvester.calls();
    let result = coordinator
        .start(two_suffix_spec(), &mut harvester)
        .await
        .unwrap();

    assert_eq!(result.outcome, RunOutcome::Satisfied);
    let calls = calls.lock().unwrap();
    let order: Vec<usize> = calls.iter().map(|a| a.matcher_index).collect();
    assert_eq!(order, vec![0, 1]);
}

/// "-a.tif" appears, "-b.tif" never does => TimedOut once no
/// progress has happened for per_item_timeout, with the satisfied subset
/// harvested and the missing matcher named.
#[tokio::test(start_paused = true)]
async fn stalled_run_times_out_with_partial_harvest() {
    init_tracing();
    let fs = staging_fs();
    let mut coordinator =
        RunCoordinator::new(FakeLauncher::detaches(), Arc::new(fs.clone()));

    {
        let fs = fs.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            fs.add_file("staging/out-a.tif", b"data".to_vec());
        });
    }

    let mut harvester = RecordingHarvester::new();
    let calls = harvester.calls();
    let result = coordinator
        .start(two_suffix_spec(), &mut harvester)
        .await
        .unwrap();

    assert_eq!(result.outcome, RunOutcome::TimedOut);
    assert_eq!(result.timed_out_matchers, vec![1]);
    assert_eq!(result.artifacts.len(), 1);
    assert_eq!(result.artifacts[0].artifact.matcher_index, 0);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
}

/// A run where artifacts keep trickling in never times out as long as each
/// gap stays under per_item_timeout (progress resets the clock).
#[tokio::test(start_paused = true)]
async fn steady_progress_resets_the_timeout() {
    init_tracing();
    let fs = staging_fs();
    let spec = RunSpecBuilder::new("/opt/tool/stack")
        .poll_mode()
        .expect_suffix("-1.dng")
        .expect_suffix("-2.dng")
        .expect_suffix("-3.dng")
        .poll_interval(Duration::from_secs(1))
        .per_item_timeout(Duration::from_secs(4))
        .build();
    let mut coordinator =
        RunCoordinator::new(FakeLauncher::detaches(), Arc::new(fs.clone()));

    {
        let fs = fs.clone();
        tokio::spawn(async move {
            // Gaps of 3s each: under the 4s timeout individually, 9s total.
            for (delay_ms, name) in
                [(3000u64, "out-1.dng"), (3000, "out-2.dng"), (3000, "out-3.dng")]
            {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                fs.add_file(format!("staging/{name}"), b"data".to_vec());
            }
        });
    }

    let mut harvester = RecordingHarvester::new();
    let result = coordinator.start(spec, &mut harvester).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Satisfied);
    assert_eq!(result.artifacts.len(), 3);
}

/// One failing harvest must not block the others; the failure is recorded
/// against its artifact.
#[tokio::test(start_paused = true)]
async fn harvest_failure_is_isolated_per_artifact() {
    init_tracing();
    let fs = staging_fs();
    fs.add_file("staging/out-a.tif", b"data".to_vec());
    fs.add_file("staging/out-b.tif", b"data".to_vec());

    let mut coordinator =
        RunCoordinator::new(FakeLauncher::detaches(), Arc::new(fs.clone()));

    let mut harvester = RecordingHarvester::new().failing_for("out-a.tif");
    let calls = harvester.calls();
    let result = coordinator
        .start(two_suffix_spec(), &mut harvester)
        .await
        .unwrap();

    assert_eq!(result.outcome, RunOutcome::Satisfied);
    assert_eq!(result.artifacts.len(), 2);
    assert!(result.artifacts[0].harvest_error.is_some());
    assert!(result.artifacts[1].harvest_error.is_none());
    assert!(!result.is_success());

    // Both harvests were attempted despite the first failing.
    assert_eq!(calls.lock().unwrap().len(), 2);
}

/// The staging directory vanishing mid-run is fatal: the run aborts with
/// DirectoryUnavailable and nothing is harvested.
#[tokio::test(start_paused = true)]
async fn vanished_staging_dir_aborts_the_run() {
    init_tracing();
    let fs = staging_fs();
    let mut coordinator =
        RunCoordinator::new(FakeLauncher::detaches(), Arc::new(fs.clone()));

    {
        let fs = fs.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            fs.remove("staging");
        });
    }

    let mut harvester = RecordingHarvester::new();
    let calls = harvester.calls();
    let err = coordinator
        .start(two_suffix_spec(), &mut harvester)
        .await
        .unwrap_err();

    assert!(matches!(err, StagerunError::DirectoryUnavailable { .. }));
    assert!(calls.lock().unwrap().is_empty());
}
