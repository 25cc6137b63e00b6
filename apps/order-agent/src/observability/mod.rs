//! Observability module for metrics and logging.
//!
//! This module provides instrumentation for the order agent, including
//! Prometheus metrics export and structured log setup.

mod logging;
mod metrics;

pub use logging::{DEFAULT_FILTER, LoggingConfig, LoggingError, init_logging};
pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_governor_sleep, record_loop_error,
    record_order_cancelled, record_order_filled, record_order_opened, record_order_placed,
    record_rate_limit_rejection, record_stale_order_reopened,
};
