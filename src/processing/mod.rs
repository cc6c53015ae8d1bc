// src/processing/mod.rs
//! Kinematic analysis: geometry, time-series derivation, keyframes and scoring

pub mod geometry;
pub mod keyframe;
pub mod kinematics;
pub mod pipeline;
pub mod scoring;
pub mod windowing;

pub use geometry::{measure, three_point_angle, SideValues};
pub use keyframe::{select_keyframes, Keyframe};
pub use kinematics::{AngleSummary, StageVector, WristSummary, STAGE_BOUNDS};
pub use pipeline::*;
pub use scoring::*;
pub use windowing::*;
