//! Blocking-exit mode and launch/validation failure paths.

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

/// Clean exit resolves the expected artifacts with a single scan and
/// harvests them.
#[tokio::test]
async fn clean_exit_harvests_expected_artifacts() {
    init_tracing();
    let fs = staging_fs();
    fs.add_file("staging/pano.tif", b"data".to_vec());

    let spec = RunSpecBuilder::new("/opt/tool/stitch")
        .args(["--batch"])
        .expect(stagerun::staging::ArtifactMatcher::exact("pano.tif"))
        .build();

    let mut coordinator =
        RunCoordinator::new(FakeLauncher::exits_with(0), Arc::new(fs.clone()));
    let mut harvester = RecordingHarvester::new();
    let calls = harvester.calls();

    let result = coordinator.start(spec, &mut harvester).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Satisfied);
    assert!(result.is_success());
    assert_eq!(calls.lock().unwrap().len(), 1);
}

/// A clean exit with no expected artifacts is simply Satisfied; nothing to
/// harvest.
#[tokio::test]
async fn clean_exit_without_matchers() {
    init_tracing();
    let fs = staging_fs();
    let spec = RunSpecBuilder::new("/opt/tool/convert").build();

    let mut coordinator =
        RunCoordinator::new(FakeLauncher::exits_with(0), Arc::new(fs.clone()));
    let mut harvester = RecordingHarvester::new();

    let result = coordinator.start(spec, &mut harvester).await.unwrap();
    assert_eq!(result.outcome, RunOutcome::Satisfied);
    assert!(result.artifacts.is_empty());
}

/// Non-zero exit is ProcessFailed with the code attached; the tool's output
/// stays out of the import path.
#[tokio::test]
async fn failing_exit_code_is_process_failed() {
    init_tracing();
    let fs = staging_fs();
    // Output exists but must not be harvested after a failed exit.
    fs.add_file("staging/pano.tif", b"data".to_vec());

    let spec = RunSpecBuilder::new("/opt/tool/stitch")
        .expect(stagerun::staging::ArtifactMatcher::exact("pano.tif"))
        .build();

    let mut coordinator =
        RunCoordinator::new(FakeLauncher::exits_with(3), Arc::new(fs.clone()));
    let mut harvester = RecordingHarvester::new();
    let calls = harvester.calls();

    let result = coordinator.start(spec, &mut harvester).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::ProcessFailed(3));
    assert!(result.artifacts.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

/// A spawn failure short-circuits: launch_error carries the attempted
/// command line, nothing is harvested.
#[tokio::test]
async fn spawn_failure_sets_launch_error() {
    init_tracing();
    let fs = staging_fs();
    let spec = RunSpecBuilder::new("/missing/tool")
        .args(["--flag"])
        .build();

    let mut coordinator =
        RunCoordinator::new(FakeLauncher::fails_to_spawn(), Arc::new(fs.clone()));
    let mut harvester = RecordingHarvester::new();
    let calls = harvester.calls();

    let result = coordinator.start(spec, &mut harvester).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::LaunchFailed);
    let launch_error = result.launch_error.expect("launch error should be set");
    assert!(launch_error.contains("/missing/tool --flag"));
    assert!(result.artifacts.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

/// Poll mode with no expected artifacts is rejected before anything is
/// launched.
#[tokio::test]
async fn poll_mode_without_matchers_is_invalid_spec() {
    init_tracing();
    let fs = staging_fs();
    let spec = RunSpecBuilder::new("/opt/tool/stitch").poll_mode().build();

    let launcher = FakeLauncher::detaches();
    let launched = launcher.launched();
    let mut coordinator = RunCoordinator::new(launcher, Arc::new(fs));
    let mut harvester = RecordingHarvester::new();

    let err = coordinator.start(spec, &mut harvester).await.unwrap_err();
    assert!(matches!(err, StagerunError::InvalidSpec(_)));
    assert!(launched.lock().unwrap().is_empty());
}

/// Zero poll interval is structurally invalid too.
#[tokio::test]
async fn zero_poll_interval_is_invalid_spec() {
    init_tracing();
    let spec = RunSpecBuilder::new("/opt/tool/stitch")
        .poll_mode()
        .expect_suffix(".tif")
        .poll_interval(Duration::ZERO)
        .build();

    let mut coordinator =
        RunCoordinator::new(FakeLauncher::detaches(), Arc::new(staging_fs()));
    let mut harvester = RecordingHarvester::new();

    let err = coordinator.start(spec, &mut harvester).await.unwrap_err();
    assert!(matches!(err, StagerunError::InvalidSpec(_)));
}
