// src/utils/paths.rs
//! Per-subject output folder layout

use crate::config::constants::output;
use std::path::{Path, PathBuf};

/// Keep only alphanumeric characters, `-` and `_`
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Directories owned by one subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectFolders {
    pub root: PathBuf,
    pub results: PathBuf,
    pub reports: PathBuf,
}

impl SubjectFolders {
    /// `{root}/{id}-{name}` with unsafe characters removed
    pub fn new(root: &Path, subject_id: &str, subject_name: &str) -> Self {
        let folder = sanitize_component(&format!("{}-{}", subject_id, subject_name));
        let root = root.join(folder);
        Self {
            results: root.join(output::RESULTS_DIR_NAME),
            reports: root.join(output::REPORTS_DIR_NAME),
            root,
        }
    }

    pub fn create_all(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.results)?;
        std::fs::create_dir_all(&self.reports)
    }
}
