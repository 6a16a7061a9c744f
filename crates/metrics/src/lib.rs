//! Metrics collection and export for switchyard.
//!
//! Library crates record through the `metrics` facade macros re-exported
//! here, behind their own optional `metrics` feature. When the `prometheus`
//! feature is enabled, [`init_metrics`] installs a Prometheus recorder.
//!
//! ```rust,ignore
//! use switchyard_metrics::{counter, dispatch};
//!
//! counter!(dispatch::REQUESTS_EMITTED_TOTAL, "adapter" => "slack").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

pub use metrics::{counter, gauge, histogram};
