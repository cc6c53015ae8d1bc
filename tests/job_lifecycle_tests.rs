// tests/job_lifecycle_tests.rs
//! End-to-end job manager tests against the synthetic keypoint source
//!
//! Each test builds its own temporary output root and a set of small
//! placeholder files so input validation passes, then registers scripted
//! clips under the same paths.

use rom_core::config::{ScoringMode, SystemConfig};
use rom_core::error::{ResourceType, RomError};
use rom_core::jobs::{AnalysisRequest, CancelOutcome, JobId, JobManager, JobServices, JobSnapshot, JobState};
use rom_core::processing::Assessment;
use rom_core::report::{InMemoryRecordStore, SubjectRecord};
use rom_core::source::simulator::{SyntheticClip, SyntheticOpener, SyntheticProviderFactory, Trajectory};
use rom_core::source::View;
use rom_core::utils::{MockTimeProvider, SubjectFolders};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WAIT_LIMIT: Duration = Duration::from_secs(20);

struct Fixture {
    dir: TempDir,
    store: Arc<InMemoryRecordStore>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            store: Arc::new(InMemoryRecordStore::new()),
        }
    }

    fn output_root(&self) -> PathBuf {
        self.dir.path().join("patients")
    }

    fn video(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"synthetic").unwrap();
        path
    }

    fn config(&self, workers: usize, queue: usize) -> SystemConfig {
        let mut config = SystemConfig::default();
        config.jobs.worker_count = workers;
        config.jobs.queue_capacity = queue;
        config.output.root_dir = self.output_root();
        config
    }

    fn results_dir(&self, subject_id: &str, subject_name: &str) -> PathBuf {
        SubjectFolders::new(&self.output_root(), subject_id, subject_name).results
    }
}

fn angle_clip(frame_count: u64) -> SyntheticClip {
    SyntheticClip::new(
        30.0,
        frame_count,
        Trajectory::Ramp { from: 10.0, to: 150.0 },
        Trajectory::Ramp { from: 20.0, to: 120.0 },
    )
}

fn wrist_clip(frame_count: u64) -> SyntheticClip {
    SyntheticClip::new(
        30.0,
        frame_count,
        Trajectory::Ramp { from: 0.2, to: 0.8 },
        Trajectory::Ramp { from: 0.3, to: 0.7 },
    )
}

fn services(opener: SyntheticOpener, store: &Arc<InMemoryRecordStore>) -> JobServices {
    JobServices::new(Arc::new(SyntheticProviderFactory::new()), Arc::new(opener), store.clone())
}

fn wait_until(manager: &JobManager, id: JobId, done: impl Fn(&JobSnapshot) -> bool) -> JobSnapshot {
    let started = Instant::now();
    loop {
        let snapshot = manager.poll(id).unwrap();
        if done(&snapshot) {
            return snapshot;
        }
        assert!(started.elapsed() < WAIT_LIMIT, "job {} stuck in {}", id, snapshot.state);
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn wait_terminal(manager: &JobManager, id: JobId) -> JobSnapshot {
    wait_until(manager, id, |s| s.is_terminal())
}

fn three_view_request(fixture: &Fixture, subject_id: &str, name: &str) -> (AnalysisRequest, [PathBuf; 3]) {
    let paths = [
        fixture.video(&format!("{}_front.mp4", subject_id)),
        fixture.video(&format!("{}_side.mp4", subject_id)),
        fixture.video(&format!("{}_back.mp4", subject_id)),
    ];
    let request = AnalysisRequest::new(subject_id, name)
        .with_video(View::Front, &paths[0])
        .with_video(View::Side, &paths[1])
        .with_video(View::Back, &paths[2]);
    (request, paths)
}

fn chart_exists(dir: &Path, name: &str) -> bool {
    dir.join(format!("{}.json", name)).is_file()
}

#[test]
fn test_completed_job_produces_all_artifacts() {
    let fixture = Fixture::new();
    fixture.store.insert(SubjectRecord::new("42", "Ana"));
    let (request, [front, side, back]) = three_view_request(&fixture, "42", "Ana");
    let opener = SyntheticOpener::new()
        .with_clip(&front, angle_clip(60))
        .with_clip(&side, angle_clip(60))
        .with_clip(&back, wrist_clip(60));

    let manager = JobManager::new(fixture.config(2, 4), services(opener, &fixture.store)).unwrap();
    let id = manager.submit(request).unwrap();
    let snapshot = wait_terminal(&manager, id);

    assert_eq!(snapshot.state, JobState::Completed, "error: {:?}", snapshot.error);
    assert_eq!(snapshot.progress, 100.0);
    assert!(snapshot.started_at_ms.is_some());
    assert!(snapshot.finished_at_ms.is_some());
    let result = snapshot.result.expect("completed job carries a result");

    assert_eq!(result.record.views.len(), 3);
    assert!(result.data_file.is_file());
    assert!(result.document.as_ref().is_some_and(|p| p.is_file()));

    let results = fixture.results_dir("42", "Ana");
    assert!(chart_exists(&results, "front_angle_analysis"));
    assert!(chart_exists(&results, "side_acceleration_analysis"));
    assert!(chart_exists(&results, "back_wrist_height"));

    // Front and back report both sides; side view only the selected one
    assert_eq!(result.record.keyframes.len(), 5);
    for keyframe in &result.record.keyframes {
        let path = keyframe.path.as_ref().expect("still written");
        assert!(path.is_file(), "missing {}", path.display());
    }

    let front_peak = result
        .record
        .keyframes
        .iter()
        .find(|k| k.view == View::Front && k.label == "left_shoulder")
        .unwrap();
    assert_eq!(front_peak.frame, 59);
    assert!((front_peak.value - 150.0).abs() < 1e-6);

    let Assessment::Scored(score) = &result.record.assessment else {
        panic!("weighted scoring should produce a score");
    };
    assert!((0.0..=100.0).contains(&score.score));
    let stored = fixture.store.get("42").unwrap();
    assert_eq!(stored.ai_motion_score, Some(score.score));
    assert!(snapshot.warnings.is_empty(), "unexpected warnings: {:?}", snapshot.warnings);

    let data: serde_json::Value = serde_json::from_slice(&std::fs::read(&result.data_file).unwrap()).unwrap();
    assert_eq!(data["job_id"], id.to_string());
    assert!(data["views"]["back"].is_object());
}

#[test]
fn test_missing_view_is_skipped_with_warning() {
    let fixture = Fixture::new();
    fixture.store.insert(SubjectRecord::new("7", "Li"));
    let front = fixture.video("front.mp4");
    let back = fixture.video("back.mp4");
    let side = fixture.dir.path().join("does_not_exist.mp4");
    let opener = SyntheticOpener::new()
        .with_clip(&front, angle_clip(30))
        .with_clip(&back, wrist_clip(30));

    let request = AnalysisRequest::new("7", "Li")
        .with_video(View::Front, &front)
        .with_video(View::Side, &side)
        .with_video(View::Back, &back);

    let manager = JobManager::new(fixture.config(1, 4), services(opener, &fixture.store)).unwrap();
    let id = manager.submit(request).unwrap();
    let snapshot = wait_terminal(&manager, id);

    assert_eq!(snapshot.state, JobState::Completed, "error: {:?}", snapshot.error);
    let result = snapshot.result.unwrap();
    assert!(result.record.views.contains_key(&View::Front));
    assert!(result.record.views.contains_key(&View::Back));
    assert!(!result.record.views.contains_key(&View::Side));
    assert!(snapshot.warnings.iter().any(|w| w.contains("side view skipped")));
    assert!(result.record.warnings.iter().any(|w| w.contains("side view skipped")));
}

#[test]
fn test_job_with_no_usable_view_completes_empty() {
    let fixture = Fixture::new();
    let missing = fixture.dir.path().join("nowhere.mp4");
    let request = AnalysisRequest::new("9", "Kai").with_video(View::Front, &missing);

    let manager = JobManager::new(fixture.config(1, 4), services(SyntheticOpener::new(), &fixture.store)).unwrap();
    let id = manager.submit(request).unwrap();
    let snapshot = wait_terminal(&manager, id);

    assert_eq!(snapshot.state, JobState::Completed, "error: {:?}", snapshot.error);
    assert!(snapshot.error.is_none());
    assert!(snapshot.warnings.iter().any(|w| w.contains("front view skipped")));
    let result = snapshot.result.unwrap();
    assert!(result.views.is_empty());
    assert!(result.record.views.is_empty());
    assert!(result.record.keyframes.is_empty());
    assert!(result.record.charts.is_empty());
    assert!(result.data_file.is_file());

    let Assessment::Scored(score) = &result.record.assessment else {
        panic!("weighted scoring should produce a score");
    };
    assert_eq!(score.score, 0.0);
}

#[test]
fn test_score_ignores_front_view() {
    let fixture = Fixture::new();
    let front = fixture.video("front.mp4");
    let side = fixture.video("side.mp4");
    let side_clip = || {
        SyntheticClip::new(
            30.0,
            60,
            Trajectory::Ramp { from: 10.0, to: 90.0 },
            Trajectory::Ramp { from: 10.0, to: 60.0 },
        )
    };
    let opener = SyntheticOpener::new()
        .with_clip(&front, angle_clip(60))
        .with_clip(&side, side_clip());

    let manager = JobManager::new(fixture.config(1, 4), services(opener, &fixture.store)).unwrap();
    let both = manager
        .submit(AnalysisRequest::new("12", "Ana").with_video(View::Front, &front).with_video(View::Side, &side))
        .unwrap();
    let side_only = manager.submit(AnalysisRequest::new("13", "Bo").with_video(View::Side, &side)).unwrap();

    let score_of = |id: JobId| {
        let snapshot = wait_terminal(&manager, id);
        assert_eq!(snapshot.state, JobState::Completed, "error: {:?}", snapshot.error);
        let result = snapshot.result.unwrap();
        match &result.record.assessment {
            Assessment::Scored(score) => (score.score, result.record.views.len()),
            other => panic!("unexpected assessment {:?}", other),
        }
    };
    let (with_front, views_with_front) = score_of(both);
    let (without_front, views_without_front) = score_of(side_only);

    assert_eq!(views_with_front, 2);
    assert_eq!(views_without_front, 1);
    assert_eq!(with_front, without_front);
}

#[test]
fn test_provider_init_failure_marks_job_error() {
    let fixture = Fixture::new();
    let front = fixture.video("front.mp4");
    let opener = SyntheticOpener::new().with_clip(&front, angle_clip(30));
    let services = JobServices::new(
        Arc::new(SyntheticProviderFactory::failing("weights missing")),
        Arc::new(opener),
        fixture.store.clone(),
    );

    let manager = JobManager::new(fixture.config(1, 4), services).unwrap();
    let id = manager.submit(AnalysisRequest::new("3", "Mo").with_video(View::Front, &front)).unwrap();
    let snapshot = wait_terminal(&manager, id);

    assert_eq!(snapshot.state, JobState::Error);
    assert!(snapshot.error.as_deref().is_some_and(|e| e.contains("weights missing")));
    assert!(!fixture.results_dir("3", "Mo").exists());
}

#[test]
fn test_cancel_during_last_view_keeps_earlier_charts() {
    let fixture = Fixture::new();
    let (request, [front, side, back]) = three_view_request(&fixture, "11", "Eve");
    let delay = Duration::from_millis(3);
    let opener = SyntheticOpener::new()
        .with_clip(&front, angle_clip(40))
        .with_clip(&side, angle_clip(40))
        .with_clip(&back, wrist_clip(400).with_frame_delay(delay));

    let manager = JobManager::new(fixture.config(1, 4), services(opener, &fixture.store)).unwrap();
    let id = manager.submit(request).unwrap();
    wait_until(&manager, id, |s| s.current_view == Some(View::Back));

    assert_eq!(manager.cancel(id).unwrap(), CancelOutcome::Requested);
    let snapshot = wait_terminal(&manager, id);

    assert_eq!(snapshot.state, JobState::Stopped);
    assert!(snapshot.result.is_none());
    let results = fixture.results_dir("11", "Eve");
    assert!(chart_exists(&results, "front_angle_analysis"));
    assert!(chart_exists(&results, "side_angle_analysis"));
    assert!(!chart_exists(&results, "back_wrist_height"));
    assert!(!results.join("analysis_data.json").exists());
}

#[test]
fn test_cancel_while_queued_produces_nothing() {
    let fixture = Fixture::new();
    let slow = fixture.video("slow.mp4");
    let quick = fixture.video("quick.mp4");
    let opener = SyntheticOpener::new()
        .with_clip(&slow, angle_clip(2_000).with_frame_delay(Duration::from_millis(2)))
        .with_clip(&quick, angle_clip(30));

    let manager = JobManager::new(fixture.config(1, 4), services(opener, &fixture.store)).unwrap();
    let blocker = manager.submit(AnalysisRequest::new("1", "Slow").with_video(View::Front, &slow)).unwrap();
    wait_until(&manager, blocker, |s| s.state == JobState::Running);

    let queued = manager.submit(AnalysisRequest::new("2", "Quick").with_video(View::Front, &quick)).unwrap();
    assert_eq!(manager.poll(queued).unwrap().state, JobState::Queued);
    assert_eq!(manager.cancel(queued).unwrap(), CancelOutcome::Requested);
    manager.cancel(blocker).unwrap();

    let snapshot = wait_terminal(&manager, queued);
    assert_eq!(snapshot.state, JobState::Stopped);
    assert!(snapshot.result.is_none());
    assert!(!fixture.results_dir("2", "Quick").exists());
    assert_eq!(wait_terminal(&manager, blocker).state, JobState::Stopped);
}

#[test]
fn test_full_queue_rejects_submission() {
    let fixture = Fixture::new();
    let slow = fixture.video("slow.mp4");
    let opener =
        SyntheticOpener::new().with_clip(&slow, angle_clip(2_000).with_frame_delay(Duration::from_millis(2)));

    let manager = JobManager::new(fixture.config(1, 1), services(opener, &fixture.store)).unwrap();
    let request = AnalysisRequest::new("5", "Sam").with_video(View::Front, &slow);

    let running = manager.submit(request.clone()).unwrap();
    wait_until(&manager, running, |s| s.state == JobState::Running);
    let queued = manager.submit(request.clone()).unwrap();

    let err = manager.submit(request).unwrap_err();
    assert!(matches!(
        err,
        RomError::ResourceExhausted {
            resource: ResourceType::JobQueue,
            ..
        }
    ));
    assert_eq!(manager.job_count(), 2);
    let mut active = manager.active_jobs();
    active.sort();
    let mut expected = vec![running, queued];
    expected.sort();
    assert_eq!(active, expected);
}

#[test]
fn test_cancel_finished_and_unknown_jobs() {
    let fixture = Fixture::new();
    let front = fixture.video("front.mp4");
    let opener = SyntheticOpener::new().with_clip(&front, angle_clip(20));

    let manager = JobManager::new(fixture.config(1, 4), services(opener, &fixture.store)).unwrap();
    let id = manager.submit(AnalysisRequest::new("8", "Ola").with_video(View::Front, &front)).unwrap();
    let snapshot = wait_terminal(&manager, id);
    assert_eq!(snapshot.state, JobState::Completed);

    assert_eq!(
        manager.cancel(id).unwrap(),
        CancelOutcome::AlreadyTerminal(JobState::Completed)
    );
    assert_eq!(manager.poll(id).unwrap().state, JobState::Completed);

    let unknown = JobId::new();
    assert!(matches!(manager.poll(unknown), Err(RomError::JobNotFound { .. })));
    assert!(matches!(manager.cancel(unknown), Err(RomError::JobNotFound { .. })));
}

#[test]
fn test_take_result_and_retention() {
    let fixture = Fixture::new();
    let front = fixture.video("front.mp4");
    let slow = fixture.video("slow.mp4");
    let opener = SyntheticOpener::new()
        .with_clip(&front, angle_clip(20))
        .with_clip(&slow, angle_clip(2_000).with_frame_delay(Duration::from_millis(2)));
    let clock = Arc::new(MockTimeProvider::new(1_000_000_000));
    let services = services(opener, &fixture.store).with_time_provider(clock.clone());
    let mut config = fixture.config(1, 4);
    config.jobs.retention_secs = 60;

    let manager = JobManager::new(config, services).unwrap();

    let pending = manager.submit(AnalysisRequest::new("1", "Ana").with_video(View::Front, &slow)).unwrap();
    assert!(manager.take_result(pending).unwrap().is_none());
    manager.cancel(pending).unwrap();
    let taken = wait_terminal(&manager, pending);
    assert_eq!(taken.state, JobState::Stopped);
    let taken = manager.take_result(pending).unwrap().expect("terminal job is handed out");
    assert_eq!(taken.id, pending);
    assert!(matches!(manager.poll(pending), Err(RomError::JobNotFound { .. })));

    let done = manager.submit(AnalysisRequest::new("2", "Bo").with_video(View::Front, &front)).unwrap();
    wait_terminal(&manager, done);
    assert_eq!(manager.evict_expired(), 0);

    clock.advance_secs(61);
    assert_eq!(manager.evict_expired(), 1);
    assert_eq!(manager.job_count(), 0);
}

#[test]
fn test_read_only_store_leaves_job_completed() {
    let fixture = Fixture::new();
    fixture.store.insert(SubjectRecord::new("21", "Ivy"));
    fixture.store.set_read_only(true);
    let front = fixture.video("front.mp4");
    let opener = SyntheticOpener::new().with_clip(&front, angle_clip(30));

    let manager = JobManager::new(fixture.config(1, 4), services(opener, &fixture.store)).unwrap();
    let id = manager.submit(AnalysisRequest::new("21", "Ivy").with_video(View::Front, &front)).unwrap();
    let snapshot = wait_terminal(&manager, id);

    assert_eq!(snapshot.state, JobState::Completed);
    assert!(snapshot.warnings.iter().any(|w| w.contains("assessment not persisted")));
    assert_eq!(fixture.store.get("21").unwrap().ai_motion_score, None);

    let result = snapshot.result.unwrap();
    assert_eq!(result.record.warnings, snapshot.warnings);
    let data: serde_json::Value = serde_json::from_slice(&std::fs::read(&result.data_file).unwrap()).unwrap();
    let warnings = data["warnings"].as_array().unwrap();
    assert!(warnings.iter().any(|w| w.as_str().is_some_and(|w| w.contains("assessment not persisted"))));
}

#[test]
fn test_placeholder_scoring_skips_write_back() {
    let fixture = Fixture::new();
    fixture.store.insert(SubjectRecord::new("30", "Noa"));
    let side = fixture.video("side.mp4");
    let opener = SyntheticOpener::new().with_clip(&side, angle_clip(30));
    let mut config = fixture.config(1, 4);
    config.analysis.scoring_mode = ScoringMode::Placeholder;

    let manager = JobManager::new(config, services(opener, &fixture.store)).unwrap();
    let id = manager.submit(AnalysisRequest::new("30", "Noa").with_video(View::Side, &side)).unwrap();
    let snapshot = wait_terminal(&manager, id);

    assert_eq!(snapshot.state, JobState::Completed);
    let result = snapshot.result.unwrap();
    assert!(matches!(result.record.assessment, Assessment::Pending { .. }));
    assert_eq!(result.record.scoring_strategy, "placeholder");
    assert_eq!(fixture.store.get("30").unwrap().ai_motion_score, None);
}

#[test]
fn test_invalid_request_is_rejected_up_front() {
    let fixture = Fixture::new();
    let manager = JobManager::new(fixture.config(1, 4), services(SyntheticOpener::new(), &fixture.store)).unwrap();

    let err = manager.submit(AnalysisRequest::new("1", "Ana")).unwrap_err();
    assert!(matches!(err, RomError::InvalidData { .. }));
    assert_eq!(manager.job_count(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let fixture = Fixture::new();
    let mut config = fixture.config(1, 4);
    config.jobs.worker_count = 0;
    let result = JobManager::new(config, services(SyntheticOpener::new(), &fixture.store));
    assert!(matches!(result, Err(RomError::Configuration { .. })));
}
