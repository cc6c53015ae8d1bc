// src/report/store.rs
//! Persistent record store boundary and an in-memory implementation

use crate::report::mapping::{ScoreWriteBack, SubjectRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Record store errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("subject {0} not found")]
    NotFound(String),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Subject attribute storage read before scoring and written after it
pub trait RecordStore: Send + Sync {
    fn load_subject(&self, subject_id: &str) -> Result<SubjectRecord, StoreError>;
    fn write_assessment(&self, subject_id: &str, write_back: &ScoreWriteBack) -> Result<(), StoreError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<String, SubjectRecord>>,
    read_only: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: SubjectRecord) {
        self.records.lock().insert(record.id.clone(), record);
    }

    pub fn get(&self, subject_id: &str) -> Option<SubjectRecord> {
        self.records.lock().get(subject_id).cloned()
    }

    /// Reject every write while set
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load_subject(&self, subject_id: &str) -> Result<SubjectRecord, StoreError> {
        self.get(subject_id)
            .ok_or_else(|| StoreError::NotFound(subject_id.to_string()))
    }

    fn write_assessment(&self, subject_id: &str, write_back: &ScoreWriteBack) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("store is read-only".to_string()));
        }
        let mut records = self.records.lock();
        let record = records
            .get_mut(subject_id)
            .ok_or_else(|| StoreError::NotFound(subject_id.to_string()))?;
        record.apply(write_back);
        Ok(())
    }
}
