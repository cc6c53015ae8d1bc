// src/source/mod.rs
//! Keypoint source boundary: provider traits, frame types and the adapter the
//! pipeline calls through

pub mod adapter;
pub mod simulator;
pub mod traits;
pub mod types;

pub use adapter::*;
pub use traits::*;
pub use types::*;
