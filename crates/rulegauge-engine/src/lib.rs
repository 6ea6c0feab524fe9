//! # rulegauge-engine
//!
//! Orchestration layer for Rulegauge: approximation configuration,
//! metric result types, the exact and estimated metric visitors, and
//! the [`MetricEngine`] entry point.
//!
//! ## Modules
//!
//! - [`config`] - Sampling and stopping configuration
//! - [`metric`] - Support and PCA-confidence result types
//! - [`engine`] - The [`MetricEngine`] entry point

pub mod config;
pub mod engine;
pub mod metric;

mod visitor;

// Re-export commonly used types
pub use config::{ApproximationConfig, ConfidenceMode, SampleSelection};
pub use engine::MetricEngine;
pub use metric::{
    pca_confidence, EstimatedMetric, EstimatedPcaConfidence, EstimatedSupport, Exact,
    PcaConfidence, Support,
};
