// src/report/mod.rs
//! Downstream result handling: charts, report record, documents, stills and
//! the subject record store

pub mod charts;
pub mod mapping;
pub mod record;
pub mod sinks;
pub mod store;

pub use charts::{view_charts, ChartSeries, ChartSpec};
pub use mapping::{ScoreWriteBack, SubjectRecord, FIELD_MAP};
pub use record::{KeyframeEntry, ReportRecord, SideSummary, ViewReport};
pub use sinks::{
    ChartRenderer, DocumentGenerator, JsonChartRenderer, MarkdownDocumentGenerator, PpmStillWriter, SinkError,
    StillImageWriter,
};
pub use store::{InMemoryRecordStore, RecordStore, StoreError};
