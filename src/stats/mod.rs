//! Statistics and metrics for the voting server

pub mod metrics;

pub use metrics::{ServerMetrics, ServerStats};
