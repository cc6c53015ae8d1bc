// src/jobs/worker.rs
//! Worker loop executing one analysis job at a time

use crate::config::constants::output;
use crate::config::SystemConfig;
use crate::error::{PipelineStage, RomError, RomErrorBuilder, RomResult};
use crate::error_context;
use crate::jobs::cancel::CancellationToken;
use crate::jobs::manager::{JobHandle, JobServices, QueuedJob, StatusTable};
use crate::jobs::state::JobState;
use crate::jobs::types::{AnalysisRequest, JobResult};
use crate::processing::keyframe::{extract_still, select_keyframes};
use crate::processing::pipeline::{ViewAnalysisResult, ViewPipeline};
use crate::report::charts::view_charts;
use crate::report::mapping::{ScoreWriteBack, SubjectRecord};
use crate::report::record::{KeyframeEntry, ReportRecord, ViewReport};
use crate::source::adapter::KeypointSource;
use crate::source::types::View;
use crate::utils::paths::SubjectFolders;
use crate::utils::validation::validate_video_file;
use crossbeam::channel::Receiver;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

// Share of the progress bar spent in the per-view frame loops
const FRAME_PROGRESS_SHARE: f64 = 90.0;

/// Claim jobs until the queue is closed and drained
pub(crate) fn worker_loop(
    receiver: Receiver<QueuedJob>,
    table: Arc<StatusTable>,
    config: Arc<SystemConfig>,
    services: JobServices,
) {
    while let Ok(job) = receiver.recv() {
        let handle = JobHandle::new(job.id, Arc::clone(&table), Arc::clone(&services.time_provider));
        if !handle.transition(JobState::Running, "running") {
            // Evicted or otherwise no longer tracked
            continue;
        }
        info!(job_id = %job.id, "job claimed");

        let runner = JobRunner {
            handle: &handle,
            request: &job.request,
            cancel: &job.cancel,
            config: &config,
            services: &services,
        };

        match runner.run() {
            Ok(result) => {
                handle.complete(result);
                info!(job_id = %job.id, "job completed");
            }
            Err(e) if e.is_cancellation() => {
                handle.transition(JobState::Stopped, "analysis stopped");
                info!(job_id = %job.id, error = %e, "job stopped");
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "job failed");
                handle.fail(e.to_string());
            }
        }
    }
}

struct JobRunner<'a> {
    handle: &'a JobHandle,
    request: &'a AnalysisRequest,
    cancel: &'a CancellationToken,
    config: &'a SystemConfig,
    services: &'a JobServices,
}

impl JobRunner<'_> {
    fn run(&self) -> RomResult<JobResult> {
        let job_id = self.handle.id();
        self.cancel.checkpoint(PipelineStage::ProviderInit)?;
        let provider = self.services.provider_factory.create()?;
        let mut source = KeypointSource::new(
            provider,
            self.request.config.thresholds(self.config.analysis.min_keypoint_confidence),
        );

        let folders = SubjectFolders::new(
            &self.config.output.root_dir,
            &self.request.subject_id,
            &self.request.subject_name,
        );
        let mut warnings = Vec::new();
        let mut views = BTreeMap::new();
        let mut charts = Vec::new();
        let total_views = self.request.videos.len();

        for (index, (&view, path)) in self.request.videos.iter().enumerate() {
            self.cancel.checkpoint(PipelineStage::ViewStart)?;
            let base = FRAME_PROGRESS_SHARE * index as f64 / total_views as f64;
            self.handle.progress(base, Some(view), format!("analysing {} view", view));
            info!(job_id = %job_id, view = %view, path = %path.display(), "view started");

            let result = match self.analyse_view(view, path, &mut source, index, total_views) {
                Ok(result) => result,
                Err(e) if e.is_cancellation() || e.is_fatal() => return Err(e),
                Err(e) => {
                    self.record_warning(&mut warnings, format!("{} view skipped: {}", view, e));
                    continue;
                }
            };

            self.cancel.checkpoint(PipelineStage::Charts)?;
            charts.extend(self.render_charts(&result, &folders.results, &mut warnings));
            views.insert(view, result);
        }

        // A job whose views were all skipped still completes with an empty report
        self.cancel.checkpoint(PipelineStage::Scoring)?;
        self.handle.progress(FRAME_PROGRESS_SHARE + 2.0, None, "scoring".to_string());
        let subject = match self.services.record_store.load_subject(&self.request.subject_id) {
            Ok(subject) => subject,
            Err(e) => {
                self.record_warning(&mut warnings, format!("subject record unavailable: {}", e));
                SubjectRecord::new(self.request.subject_id.clone(), self.request.subject_name.clone())
            }
        };
        let view_reports: BTreeMap<View, ViewReport> =
            views.iter().map(|(&view, result)| (view, ViewReport::from_result(result))).collect();
        let strategy = self.config.analysis.scoring_mode.strategy();
        let assessment = strategy.assess(&ReportRecord::contributions(&view_reports));

        self.cancel.checkpoint(PipelineStage::Keyframes)?;
        self.handle.progress(FRAME_PROGRESS_SHARE + 5.0, None, "extracting keyframes".to_string());
        let keyframes = self.extract_keyframes(&views, &folders.results, &mut warnings);

        self.cancel.checkpoint(PipelineStage::Report)?;
        self.handle.progress(FRAME_PROGRESS_SHARE + 8.0, None, "writing report".to_string());
        folders.create_all().map_err(|e| RomError::Output {
            path: folders.root.clone(),
            reason: e.to_string(),
            context: error_context!("worker", "create_folders"),
        })?;

        let mut record = ReportRecord {
            job_id: job_id.to_string(),
            subject,
            generated_at_ms: self.services.time_provider.now_millis(),
            selected_side: self.request.config.selected_side,
            views: view_reports,
            scoring_strategy: strategy.name().to_string(),
            assessment,
            keyframes,
            charts,
            warnings: warnings.clone(),
        };
        let document = match self.services.document_generator.generate(&record, &folders.reports) {
            Ok(path) => Some(path),
            Err(e) => {
                self.record_warning(&mut warnings, format!("report document not generated: {}", e));
                None
            }
        };

        self.cancel.checkpoint(PipelineStage::Persistence)?;
        if let Some(write_back) = ScoreWriteBack::from_assessment(&record.assessment) {
            if let Err(e) = self
                .services
                .record_store
                .write_assessment(&self.request.subject_id, &write_back)
            {
                let err = RomError::from(e);
                self.record_warning(&mut warnings, format!("assessment not persisted: {}", err));
            }
        }

        // Written last so it carries every warning raised above
        record.warnings = warnings;
        let data_file = self.write_data_file(&record, &folders.results)?;

        Ok(JobResult {
            record,
            views,
            data_file,
            document,
        })
    }

    fn analyse_view(
        &self,
        view: View,
        path: &Path,
        source: &mut KeypointSource,
        index: usize,
        total_views: usize,
    ) -> RomResult<ViewAnalysisResult> {
        let unavailable = |reason: String| {
            RomErrorBuilder::new("worker", "open_video").input_not_found(view, path, &reason)
        };

        if self.config.input.validate_files {
            validate_video_file(path, &self.config.input).map_err(|e| unavailable(e.to_string()))?;
        }
        let mut video = self
            .services
            .video_opener
            .open(path)
            .map_err(|e| unavailable(e.to_string()))?;

        let pipeline = ViewPipeline::new(view, self.request.config.window(view))
            .with_progress_interval(self.config.analysis.progress_interval_frames);
        let run = pipeline.run(video.as_mut(), source, self.cancel, |p| {
            let fraction = if p.frames_total == 0 {
                1.0
            } else {
                p.frames_processed as f64 / p.frames_total as f64
            };
            let progress = FRAME_PROGRESS_SHARE * (index as f64 + fraction) / total_views as f64;
            self.handle.progress(
                progress,
                Some(view),
                format!("{} view: frame {}/{}", view, p.frames_processed, p.frames_total),
            );
        });
        // An unusable container aborts this view only
        run.map_err(|e| match e {
            RomError::InvalidData { reason, .. } => unavailable(reason),
            other => other,
        })
    }

    fn render_charts(&self, result: &ViewAnalysisResult, dir: &Path, warnings: &mut Vec<String>) -> Vec<PathBuf> {
        let charts = view_charts(result, self.config.analysis.smoothing_window);
        if charts.is_empty() {
            return Vec::new();
        }
        if let Err(e) = std::fs::create_dir_all(dir) {
            self.record_warning(warnings, format!("{} charts not rendered: {}", result.view, e));
            return Vec::new();
        }
        charts
            .iter()
            .filter_map(|chart| match self.services.chart_renderer.render(chart, dir) {
                Ok(path) => Some(path),
                Err(e) => {
                    self.record_warning(warnings, format!("chart {} not rendered: {}", chart.name, e));
                    None
                }
            })
            .collect()
    }

    fn extract_keyframes(
        &self,
        views: &BTreeMap<View, ViewAnalysisResult>,
        dir: &Path,
        warnings: &mut Vec<String>,
    ) -> Vec<KeyframeEntry> {
        let mut entries = Vec::new();
        for (view, result) in views {
            let keyframes = select_keyframes(result, self.request.config.selected_side);
            if keyframes.is_empty() {
                continue;
            }
            let Some(path) = self.request.videos.get(view) else {
                continue;
            };
            let mut video = match self.services.video_opener.open(path) {
                Ok(video) => Some(video),
                Err(e) => {
                    self.record_warning(warnings, format!("{} keyframes not extracted: {}", view, e));
                    None
                }
            };

            for keyframe in keyframes {
                let still = video.as_mut().and_then(|video| {
                    let written = extract_still(video.as_mut(), &keyframe)
                        .map_err(|e| e.to_string())
                        .and_then(|frame| {
                            std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
                            self.services
                                .still_writer
                                .write_still(&frame, dir, &keyframe.file_stem())
                                .map_err(|e| e.to_string())
                        });
                    match written {
                        Ok(path) => Some(path),
                        Err(reason) => {
                            self.record_warning(
                                warnings,
                                format!("keyframe {} not saved: {}", keyframe.file_stem(), reason),
                            );
                            None
                        }
                    }
                });
                entries.push(KeyframeEntry {
                    view: keyframe.view,
                    label: keyframe.label,
                    frame: keyframe.frame,
                    value: keyframe.value,
                    path: still,
                });
            }
        }
        entries
    }

    fn write_data_file(&self, record: &ReportRecord, dir: &Path) -> RomResult<PathBuf> {
        let path = dir.join(output::DATA_FILE_NAME);
        let body = record
            .to_rounded_json(self.config.output.decimal_places)
            .map_err(|e| RomError::Output {
                path: path.clone(),
                reason: e.to_string(),
                context: error_context!("worker", "serialize_report"),
            })?;
        std::fs::write(&path, body).map_err(|e| RomError::Output {
            path: path.clone(),
            reason: e.to_string(),
            context: error_context!("worker", "write_report"),
        })?;
        Ok(path)
    }

    fn record_warning(&self, warnings: &mut Vec<String>, warning: String) {
        warnings.push(warning.clone());
        self.handle.warn(warning);
    }
}
