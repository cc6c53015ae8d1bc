// src/report/sinks.rs
//! Result sinks: chart renderer, document generator and still-image writer

use crate::report::charts::ChartSpec;
use crate::report::record::{ReportRecord, SideSummary};
use crate::source::types::Frame;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Result sink errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("I/O failure on {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
    #[error("encoding failed: {0}")]
    Encode(String),
}

impl SinkError {
    fn io(path: &Path, err: std::io::Error) -> Self {
        SinkError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

/// Saves one file per chart
pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &ChartSpec, dir: &Path) -> Result<PathBuf, SinkError>;
}

/// Turns a report record into a document file
pub trait DocumentGenerator: Send + Sync {
    fn generate(&self, record: &ReportRecord, dir: &Path) -> Result<PathBuf, SinkError>;
}

/// Saves an extracted frame
pub trait StillImageWriter: Send + Sync {
    fn write_still(&self, frame: &Frame, dir: &Path, stem: &str) -> Result<PathBuf, SinkError>;
}

fn write_file(path: PathBuf, bytes: &[u8]) -> Result<PathBuf, SinkError> {
    std::fs::write(&path, bytes).map_err(|e| SinkError::io(&path, e))?;
    Ok(path)
}

/// Writes the chart series as JSON for an external plotting front end
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartRenderer;

impl ChartRenderer for JsonChartRenderer {
    fn render(&self, chart: &ChartSpec, dir: &Path) -> Result<PathBuf, SinkError> {
        let body = serde_json::to_vec_pretty(chart).map_err(|e| SinkError::Encode(e.to_string()))?;
        write_file(dir.join(format!("{}.json", chart.name)), &body)
    }
}

/// Markdown report
#[derive(Debug, Clone)]
pub struct MarkdownDocumentGenerator {
    file_stem: String,
}

impl MarkdownDocumentGenerator {
    pub fn new(file_stem: impl Into<String>) -> Self {
        Self { file_stem: file_stem.into() }
    }

    pub fn render(record: &ReportRecord) -> String {
        let mut doc = String::new();
        let subject = &record.subject;
        // Writing to a String cannot fail
        let _ = writeln!(doc, "# Shoulder Range-of-Motion Report\n");
        let _ = writeln!(doc, "- Subject: {} ({})", subject.username, subject.id);
        if let Some(age) = subject.age {
            let _ = writeln!(doc, "- Age: {}", age);
        }
        if let Some(symptoms) = &subject.symptoms {
            let _ = writeln!(doc, "- Diagnosis: {}", symptoms);
        }
        let _ = writeln!(doc, "- Job: {}", record.job_id);
        let _ = writeln!(doc, "- Selected side: {}\n", record.selected_side);

        let _ = writeln!(doc, "## Assessment\n");
        let _ = writeln!(doc, "{}\n", record.assessment.summary_text());
        if let Some(score) = record.assessment.score() {
            for recommendation in &score.recommendations {
                let _ = writeln!(doc, "- {}", recommendation);
            }
            doc.push('\n');
        }

        for (view, report) in &record.views {
            let _ = writeln!(doc, "## {} view\n", view);
            let _ = writeln!(
                doc,
                "{} samples at {:.2} fps, frames {}..{} ({} skipped)\n",
                report.samples, report.fps, report.span.start, report.span.end, report.frames_skipped
            );
            for (label, summary) in [("left", &report.left), ("right", &report.right)] {
                match summary {
                    Some(SideSummary::Angle(s)) => {
                        let _ = writeln!(
                            doc,
                            "- {}: max {:.2} deg, min {:.2} deg, mean {:.2} deg, range {:.2} deg, peak velocity {:.2} deg/s",
                            label, s.max_angle, s.min_angle, s.mean_angle, s.range, s.max_velocity
                        );
                        let stages: Vec<String> = s.velocity_stages.iter().map(|v| format!("{:.2}", v)).collect();
                        let _ = writeln!(doc, "  - stage velocities: {}", stages.join(" / "));
                    }
                    Some(SideSummary::Wrist(s)) => {
                        let _ = writeln!(
                            doc,
                            "- {} wrist: max {:.2}, min {:.2}, mean {:.2}, range {:.2}",
                            label, s.max_height, s.min_height, s.mean_height, s.range
                        );
                    }
                    None => {
                        let _ = writeln!(doc, "- {}: no data", label);
                    }
                }
            }
            doc.push('\n');
        }

        if !record.keyframes.is_empty() {
            let _ = writeln!(doc, "## Keyframes\n");
            for keyframe in &record.keyframes {
                let _ = writeln!(
                    doc,
                    "- {} {}: frame {} (value {:.2})",
                    keyframe.view, keyframe.label, keyframe.frame, keyframe.value
                );
            }
            doc.push('\n');
        }

        if !record.warnings.is_empty() {
            let _ = writeln!(doc, "## Warnings\n");
            for warning in &record.warnings {
                let _ = writeln!(doc, "- {}", warning);
            }
        }
        doc
    }
}

impl DocumentGenerator for MarkdownDocumentGenerator {
    fn generate(&self, record: &ReportRecord, dir: &Path) -> Result<PathBuf, SinkError> {
        let body = Self::render(record);
        write_file(dir.join(format!("{}.md", self.file_stem)), body.as_bytes())
    }
}

/// Binary PPM (P6) writer
#[derive(Debug, Clone, Copy, Default)]
pub struct PpmStillWriter;

impl PpmStillWriter {
    pub fn encode(frame: &Frame) -> Result<Vec<u8>, SinkError> {
        let expected = frame.width as usize * frame.height as usize * 3;
        if frame.pixels.len() != expected {
            return Err(SinkError::Encode(format!(
                "frame {} has {} bytes, expected {}",
                frame.index,
                frame.pixels.len(),
                expected
            )));
        }
        let mut out = format!("P6\n{} {}\n255\n", frame.width, frame.height).into_bytes();
        out.extend_from_slice(&frame.pixels);
        Ok(out)
    }
}

impl StillImageWriter for PpmStillWriter {
    fn write_still(&self, frame: &Frame, dir: &Path, stem: &str) -> Result<PathBuf, SinkError> {
        let bytes = Self::encode(frame)?;
        write_file(dir.join(format!("{}.ppm", stem)), &bytes)
    }
}
