// src/jobs/manager.rs
//! Job manager: status table, bounded queue and worker pool

use crate::config::constants::output;
use crate::config::SystemConfig;
use crate::error::{IntoRomError, ResourceType, RomErrorBuilder, RomResult};
use crate::jobs::cancel::CancellationToken;
use crate::jobs::state::{CancelOutcome, JobState};
use crate::jobs::types::{AnalysisRequest, JobId, JobResult, JobSnapshot};
use crate::jobs::worker;
use crate::report::sinks::{
    ChartRenderer, DocumentGenerator, JsonChartRenderer, MarkdownDocumentGenerator, PpmStillWriter, StillImageWriter,
};
use crate::report::store::RecordStore;
use crate::source::traits::{ProviderFactory, VideoOpener};
use crate::source::types::View;
use crate::utils::time::{SystemTimeProvider, TimeProvider};
use crossbeam::channel::{self, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// External collaborators a job runs against
#[derive(Clone)]
pub struct JobServices {
    pub provider_factory: Arc<dyn ProviderFactory>,
    pub video_opener: Arc<dyn VideoOpener>,
    pub record_store: Arc<dyn RecordStore>,
    pub chart_renderer: Arc<dyn ChartRenderer>,
    pub document_generator: Arc<dyn DocumentGenerator>,
    pub still_writer: Arc<dyn StillImageWriter>,
    pub time_provider: Arc<dyn TimeProvider>,
}

impl JobServices {
    /// Services with the bundled JSON, Markdown and PPM sinks
    pub fn new(
        provider_factory: Arc<dyn ProviderFactory>,
        video_opener: Arc<dyn VideoOpener>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            provider_factory,
            video_opener,
            record_store,
            chart_renderer: Arc::new(JsonChartRenderer),
            document_generator: Arc::new(MarkdownDocumentGenerator::new(output::REPORT_FILE_NAME)),
            still_writer: Arc::new(PpmStillWriter),
            time_provider: Arc::new(SystemTimeProvider),
        }
    }

    pub fn with_chart_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.chart_renderer = renderer;
        self
    }

    pub fn with_document_generator(mut self, generator: Arc<dyn DocumentGenerator>) -> Self {
        self.document_generator = generator;
        self
    }

    pub fn with_still_writer(mut self, writer: Arc<dyn StillImageWriter>) -> Self {
        self.still_writer = writer;
        self
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }
}

pub(crate) struct JobEntry {
    pub(crate) snapshot: JobSnapshot,
    pub(crate) cancel: CancellationToken,
}

pub(crate) type StatusTable = RwLock<HashMap<JobId, JobEntry>>;

/// Work item travelling through the queue
pub(crate) struct QueuedJob {
    pub(crate) id: JobId,
    pub(crate) request: AnalysisRequest,
    pub(crate) cancel: CancellationToken,
}

/// Write access to one job's status record, used by its worker.
///
/// All writes go through the table lock, and state changes are validated
/// against [`JobState::can_transition_to`] so a terminal record is never
/// overwritten.
pub(crate) struct JobHandle {
    id: JobId,
    table: Arc<StatusTable>,
    time: Arc<dyn TimeProvider>,
}

impl JobHandle {
    pub(crate) fn new(id: JobId, table: Arc<StatusTable>, time: Arc<dyn TimeProvider>) -> Self {
        Self { id, table, time }
    }

    pub(crate) fn id(&self) -> JobId {
        self.id
    }

    /// Move to `next`; returns false if the transition is not allowed
    pub(crate) fn transition(&self, next: JobState, message: &str) -> bool {
        self.update(next, message, |_| {})
    }

    /// Validate `next`, apply `fill` and change state under one write lock,
    /// so readers see either the old record or the finished one
    fn update(&self, next: JobState, message: &str, fill: impl FnOnce(&mut JobSnapshot)) -> bool {
        let now = self.time.now_millis();
        let mut table = self.table.write();
        let Some(entry) = table.get_mut(&self.id) else {
            return false;
        };
        let snapshot = &mut entry.snapshot;
        if !snapshot.state.can_transition_to(next) {
            debug!(job_id = %self.id, from = %snapshot.state, to = %next, "transition rejected");
            return false;
        }
        fill(snapshot);
        snapshot.state = next;
        snapshot.message = message.to_string();
        match next {
            JobState::Running => snapshot.started_at_ms = Some(now),
            state if state.is_terminal() => {
                snapshot.finished_at_ms = Some(now);
                snapshot.current_view = None;
            }
            _ => {}
        }
        true
    }

    pub(crate) fn progress(&self, progress: f64, current_view: Option<View>, message: String) {
        let mut table = self.table.write();
        if let Some(entry) = table.get_mut(&self.id) {
            if entry.snapshot.state == JobState::Running {
                entry.snapshot.progress = progress.clamp(0.0, 100.0);
                entry.snapshot.current_view = current_view;
                entry.snapshot.message = message;
            }
        }
    }

    pub(crate) fn warn(&self, warning: String) {
        warn!(job_id = %self.id, "{}", warning);
        if let Some(entry) = self.table.write().get_mut(&self.id) {
            entry.snapshot.warnings.push(warning);
        }
    }

    pub(crate) fn complete(&self, result: JobResult) -> bool {
        self.update(JobState::Completed, "analysis completed", |snapshot| {
            snapshot.result = Some(Arc::new(result));
            snapshot.progress = 100.0;
        })
    }

    pub(crate) fn fail(&self, error: String) -> bool {
        let message = error.clone();
        self.update(JobState::Error, &message, |snapshot| snapshot.error = Some(error))
    }
}

/// Owns the job status table and the worker pool.
///
/// Jobs are accepted into a bounded queue and executed start to finish by
/// one of `jobs.worker_count` worker threads. Dropping the manager cancels
/// outstanding jobs and joins the workers.
pub struct JobManager {
    table: Arc<StatusTable>,
    sender: Option<Sender<QueuedJob>>,
    workers: Vec<JoinHandle<()>>,
    config: Arc<SystemConfig>,
    services: JobServices,
}

impl JobManager {
    pub fn new(config: SystemConfig, services: JobServices) -> RomResult<Self> {
        config.validate_consistency().map_err(|errors| {
            RomErrorBuilder::new("job_manager", "new").configuration(&errors.join("; "))
        })?;

        let config = Arc::new(config);
        let table: Arc<StatusTable> = Arc::new(RwLock::new(HashMap::new()));
        let (sender, receiver) = channel::bounded::<QueuedJob>(config.jobs.queue_capacity);

        let mut workers = Vec::with_capacity(config.jobs.worker_count);
        for index in 0..config.jobs.worker_count {
            let receiver = receiver.clone();
            let table = Arc::clone(&table);
            let config = Arc::clone(&config);
            let services = services.clone();
            let handle = std::thread::Builder::new()
                .name(format!("rom-worker-{}", index))
                .spawn(move || worker::worker_loop(receiver, table, config, services))
                .rom_err("job_manager", "spawn_worker")?;
            workers.push(handle);
        }

        info!(
            workers = config.jobs.worker_count,
            queue_capacity = config.jobs.queue_capacity,
            "job manager started"
        );

        Ok(Self {
            table,
            sender: Some(sender),
            workers,
            config,
            services,
        })
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Accept a job; fails when the request is invalid or the queue is full
    pub fn submit(&self, request: AnalysisRequest) -> RomResult<JobId> {
        request.validate()?;
        self.evict_expired();

        let Some(sender) = &self.sender else {
            return Err(RomErrorBuilder::new("job_manager", "submit").resource_exhausted(ResourceType::Workers, 0, 1));
        };

        let id = JobId::new();
        let cancel = CancellationToken::new();
        let now = self.services.time_provider.now_millis();
        let subject_id = request.subject_id.clone();
        let views: Vec<View> = request.videos.keys().copied().collect();

        self.table.write().insert(
            id,
            JobEntry {
                snapshot: JobSnapshot::queued(id, &subject_id, now),
                cancel: cancel.clone(),
            },
        );

        match sender.try_send(QueuedJob { id, request, cancel }) {
            Ok(()) => {
                info!(job_id = %id, subject = %subject_id, ?views, "job submitted");
                Ok(id)
            }
            Err(TrySendError::Full(_)) => {
                self.table.write().remove(&id);
                let capacity = self.config.jobs.queue_capacity;
                warn!(job_id = %id, capacity, "job queue full");
                Err(RomErrorBuilder::new("job_manager", "submit").resource_exhausted(
                    ResourceType::JobQueue,
                    capacity,
                    capacity + 1,
                ))
            }
            Err(TrySendError::Disconnected(_)) => {
                self.table.write().remove(&id);
                Err(RomErrorBuilder::new("job_manager", "submit").resource_exhausted(ResourceType::Workers, 0, 1))
            }
        }
    }

    /// Current status of a job
    pub fn poll(&self, id: JobId) -> RomResult<JobSnapshot> {
        self.table
            .read()
            .get(&id)
            .map(|entry| entry.snapshot.clone())
            .ok_or_else(|| RomErrorBuilder::new("job_manager", "poll").job_not_found(id))
    }

    /// Request cooperative cancellation. A finished job is left untouched.
    pub fn cancel(&self, id: JobId) -> RomResult<CancelOutcome> {
        let table = self.table.read();
        let entry = table
            .get(&id)
            .ok_or_else(|| RomErrorBuilder::new("job_manager", "cancel").job_not_found(id))?;

        if entry.snapshot.state.is_terminal() {
            debug!(job_id = %id, state = %entry.snapshot.state, "cancel ignored for finished job");
            return Ok(CancelOutcome::AlreadyTerminal(entry.snapshot.state));
        }
        entry.cancel.cancel();
        info!(job_id = %id, "cancellation requested");
        Ok(CancelOutcome::Requested)
    }

    /// Hand out a finished job's snapshot and forget the job. `None` while
    /// the job is still queued or running.
    pub fn take_result(&self, id: JobId) -> RomResult<Option<JobSnapshot>> {
        let mut table = self.table.write();
        let entry = table
            .get(&id)
            .ok_or_else(|| RomErrorBuilder::new("job_manager", "take_result").job_not_found(id))?;
        if !entry.snapshot.state.is_terminal() {
            return Ok(None);
        }
        Ok(table.remove(&id).map(|entry| entry.snapshot))
    }

    /// Drop finished jobs older than the retention period; returns how many
    pub fn evict_expired(&self) -> usize {
        let now = self.services.time_provider.now_millis();
        let retention_ms = self.config.jobs.retention().as_millis() as u64;
        let mut table = self.table.write();
        let before = table.len();
        table.retain(|_, entry| match entry.snapshot.finished_at_ms {
            Some(finished) if entry.snapshot.state.is_terminal() => now.saturating_sub(finished) < retention_ms,
            _ => true,
        });
        let evicted = before - table.len();
        if evicted > 0 {
            debug!(evicted, "expired jobs evicted");
        }
        evicted
    }

    /// Number of jobs in the status table
    pub fn job_count(&self) -> usize {
        self.table.read().len()
    }

    /// Ids of jobs not yet finished
    pub fn active_jobs(&self) -> Vec<JobId> {
        self.table
            .read()
            .iter()
            .filter(|(_, entry)| !entry.snapshot.state.is_terminal())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Cancel outstanding jobs, close the queue and join the workers
    pub fn shutdown(&mut self) {
        if self.sender.is_none() && self.workers.is_empty() {
            return;
        }
        for entry in self.table.read().values() {
            if !entry.snapshot.state.is_terminal() {
                entry.cancel.cancel();
            }
        }
        self.sender = None;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        info!("job manager stopped");
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::scoring::{Assessment, PLACEHOLDER_NOTICE};
    use crate::report::mapping::SubjectRecord;
    use crate::report::record::ReportRecord;
    use crate::source::types::Side;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn empty_result(id: JobId) -> JobResult {
        JobResult {
            record: ReportRecord {
                job_id: id.to_string(),
                subject: SubjectRecord::new("1", "Ana"),
                generated_at_ms: 0,
                selected_side: Side::Left,
                views: BTreeMap::new(),
                scoring_strategy: "placeholder".to_string(),
                assessment: Assessment::Pending {
                    notice: PLACEHOLDER_NOTICE.to_string(),
                },
                keyframes: Vec::new(),
                charts: Vec::new(),
                warnings: Vec::new(),
            },
            views: BTreeMap::new(),
            data_file: PathBuf::from("analysis_data.json"),
            document: None,
        }
    }

    fn running_handle(table: &Arc<StatusTable>) -> JobHandle {
        let id = JobId::new();
        table.write().insert(
            id,
            JobEntry {
                snapshot: JobSnapshot::queued(id, "1", 0),
                cancel: CancellationToken::new(),
            },
        );
        let handle = JobHandle::new(id, Arc::clone(table), Arc::new(SystemTimeProvider));
        assert!(handle.transition(JobState::Running, "running"));
        handle
    }

    fn is_torn(snapshot: &JobSnapshot) -> bool {
        let has_outcome = snapshot.result.is_some() || snapshot.error.is_some();
        match snapshot.state {
            JobState::Queued | JobState::Running => has_outcome,
            JobState::Completed => snapshot.result.is_none() || snapshot.finished_at_ms.is_none(),
            JobState::Error => snapshot.error.is_none() || snapshot.finished_at_ms.is_none(),
            JobState::Stopped => snapshot.finished_at_ms.is_none(),
        }
    }

    #[test]
    fn test_terminal_update_is_atomic_for_readers() {
        let table: Arc<StatusTable> = Arc::new(RwLock::new(HashMap::new()));
        let done = AtomicBool::new(false);
        let torn = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let count = table.read().values().filter(|e| is_torn(&e.snapshot)).count();
                        torn.fetch_add(count, Ordering::Relaxed);
                    }
                });
            }

            for i in 0..2_000 {
                let handle = running_handle(&table);
                if i % 2 == 0 {
                    assert!(handle.complete(empty_result(handle.id())));
                } else {
                    assert!(handle.fail("provider crashed".to_string()));
                }
            }
            done.store(true, Ordering::Release);
        });

        assert_eq!(torn.load(Ordering::Relaxed), 0);
        let table = table.read();
        assert!(table.values().all(|e| e.snapshot.state.is_terminal() && !is_torn(&e.snapshot)));
    }

    #[test]
    fn test_terminal_record_is_not_overwritten() {
        let table: Arc<StatusTable> = Arc::new(RwLock::new(HashMap::new()));
        let handle = running_handle(&table);

        assert!(handle.fail("first".to_string()));
        assert!(!handle.complete(empty_result(handle.id())));
        assert!(!handle.fail("second".to_string()));

        let table = table.read();
        let snapshot = &table[&handle.id()].snapshot;
        assert_eq!(snapshot.state, JobState::Error);
        assert_eq!(snapshot.error.as_deref(), Some("first"));
        assert!(snapshot.result.is_none());
    }
}
