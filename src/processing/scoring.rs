// src/processing/scoring.rs
//! Composite function scoring strategies

use crate::config::constants::scoring::{
    ANGLE_CEILING, ANGLE_FULL_SCALE_DEG, MILD_THRESHOLD, NORMAL_THRESHOLD, VELOCITY_CEILING,
    VELOCITY_FULL_SCALE,
};
use crate::source::types::{Side, View};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peak statistics of one side of one angle view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideContribution {
    pub view: View,
    pub side: Side,
    pub max_angle: f64,
    pub max_velocity: f64,
}

/// Qualitative band of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Normal,
    MildLimitation,
    MarkedLimitation,
}

impl Tier {
    pub fn from_score(score: f64) -> Self {
        if score >= NORMAL_THRESHOLD {
            Tier::Normal
        } else if score >= MILD_THRESHOLD {
            Tier::MildLimitation
        } else {
            Tier::MarkedLimitation
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tier::Normal => "Shoulder motor function is normal with good range of motion and no obvious abnormality.",
            Tier::MildLimitation => {
                "Shoulder motor function is largely normal with slight limitation of motion; further observation is advised."
            }
            Tier::MarkedLimitation => {
                "Shoulder motor function is abnormal with marked limitation of motion; prompt medical attention is advised."
            }
        }
    }

    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            Tier::Normal => &[
                "Keep up the current exercise routine",
                "Do regular shoulder care exercises",
                "Maintain correct posture during exercise",
            ],
            Tier::MildLimitation => &[
                "Practise shoulder flexibility training",
                "Avoid overusing the shoulder joint",
                "Schedule regular functional assessments",
            ],
            Tier::MarkedLimitation => &[
                "Stop strenuous exercise immediately",
                "Consult a specialist for a detailed examination",
                "Set up a personalised rehabilitation plan",
            ],
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Normal => write!(f, "normal"),
            Tier::MildLimitation => write!(f, "mild limitation"),
            Tier::MarkedLimitation => write!(f, "marked limitation"),
        }
    }
}

/// Score in `[0, 100]` with its qualitative assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub score: f64,
    pub tier: Tier,
    pub description: String,
    pub recommendations: Vec<String>,
}

impl CompositeScore {
    pub fn new(score: f64) -> Self {
        let tier = Tier::from_score(score);
        Self {
            score,
            tier,
            description: tier.description().to_string(),
            recommendations: tier.recommendations().iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Outcome of a scoring strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Assessment {
    Scored(CompositeScore),
    Pending { notice: String },
}

impl Assessment {
    pub fn score(&self) -> Option<&CompositeScore> {
        match self {
            Assessment::Scored(score) => Some(score),
            Assessment::Pending { .. } => None,
        }
    }

    /// Human-readable assessment text
    pub fn summary_text(&self) -> String {
        match self {
            Assessment::Scored(s) => format!("{} ({}): {}", s.score, s.tier, s.description),
            Assessment::Pending { notice } => notice.clone(),
        }
    }
}

/// Interchangeable scoring strategy
pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn assess(&self, contributions: &[SideContribution]) -> Assessment;
}

/// Weighted angle/velocity scorer.
///
/// Each contribution yields an angle sub-score capped at 30 and a velocity
/// sub-score capped at 35. Velocities are in degrees per second, so the
/// velocity sub-score saturates for any real movement.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer;

impl WeightedScorer {
    pub fn score(contributions: &[SideContribution]) -> f64 {
        if contributions.is_empty() {
            return 0.0;
        }
        let earned: f64 = contributions
            .iter()
            .map(|c| {
                let angle = (c.max_angle / ANGLE_FULL_SCALE_DEG * ANGLE_CEILING).clamp(0.0, ANGLE_CEILING);
                let velocity = (c.max_velocity / VELOCITY_FULL_SCALE * VELOCITY_CEILING).clamp(0.0, VELOCITY_CEILING);
                angle + velocity
            })
            .sum();
        let possible = contributions.len() as f64 * (ANGLE_CEILING + VELOCITY_CEILING);
        (earned / possible * 1000.0).round() / 10.0
    }
}

impl ScoringStrategy for WeightedScorer {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn assess(&self, contributions: &[SideContribution]) -> Assessment {
        Assessment::Scored(CompositeScore::new(Self::score(contributions)))
    }
}

/// Strategy used while the scoring model is not released
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderScorer;

pub const PLACEHOLDER_NOTICE: &str = "feature under development";

impl ScoringStrategy for PlaceholderScorer {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn assess(&self, _contributions: &[SideContribution]) -> Assessment {
        Assessment::Pending {
            notice: PLACEHOLDER_NOTICE.to_string(),
        }
    }
}
