// src/report/mapping.rs
//! Subject records and the external/internal field name table

use crate::processing::scoring::Assessment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// External API name paired with the internal record field it maps to.
/// Fields not listed keep their name on both sides.
pub const FIELD_MAP: [(&str, &str); 3] = [
    ("name", "username"),
    ("diagnosis", "symptoms"),
    ("notes", "treatment"),
];

pub fn to_internal_key(external: &str) -> &str {
    FIELD_MAP
        .iter()
        .find(|(ext, _)| *ext == external)
        .map(|(_, int)| *int)
        .unwrap_or(external)
}

pub fn to_external_key(internal: &str) -> &str {
    FIELD_MAP
        .iter()
        .find(|(_, int)| *int == internal)
        .map(|(ext, _)| *ext)
        .unwrap_or(internal)
}

fn rename_keys(map: Map<String, Value>, rename: fn(&str) -> &str) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (rename(&k).to_string(), v)).collect()
}

/// Subject attributes as held by the record store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub ai_motion_score: Option<f64>,
    #[serde(default)]
    pub ai_motion_report: Option<String>,
    #[serde(default)]
    pub ai_comprehensive_score: Option<f64>,
    #[serde(default)]
    pub ai_comprehensive_report: Option<String>,
}

impl SubjectRecord {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    /// Parse an API payload using external field names
    pub fn from_external(payload: Value) -> Result<Self, serde_json::Error> {
        let value = match payload {
            Value::Object(map) => Value::Object(rename_keys(map, to_internal_key)),
            other => other,
        };
        serde_json::from_value(value)
    }

    /// Render with external field names
    pub fn to_external(&self) -> Result<Value, serde_json::Error> {
        Ok(match serde_json::to_value(self)? {
            Value::Object(map) => Value::Object(rename_keys(map, to_external_key)),
            other => other,
        })
    }

    pub fn apply(&mut self, write_back: &ScoreWriteBack) {
        self.ai_motion_score = Some(write_back.ai_motion_score);
        self.ai_motion_report = Some(write_back.ai_motion_report.clone());
        self.ai_comprehensive_score = Some(write_back.ai_comprehensive_score);
        self.ai_comprehensive_report = Some(write_back.ai_comprehensive_report.clone());
    }
}

/// Fields written back to the subject after a scored analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWriteBack {
    pub ai_motion_score: f64,
    pub ai_motion_report: String,
    pub ai_comprehensive_score: f64,
    pub ai_comprehensive_report: String,
}

impl ScoreWriteBack {
    /// `None` unless the assessment carries a score
    pub fn from_assessment(assessment: &Assessment) -> Option<Self> {
        let score = assessment.score()?;
        Some(Self {
            ai_motion_score: score.score,
            ai_motion_report: score.description.clone(),
            ai_comprehensive_score: score.score,
            ai_comprehensive_report: score.description.clone(),
        })
    }
}
