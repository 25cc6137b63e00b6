//! Prometheus metrics for the order agent.
//!
//! Counters for order lifecycle events and placements, rate-limit feedback
//! and loop failures, plus a histogram of governor throttling sleeps.
//!
//! # Example
//!
//! ```ignore
//! use order_agent::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config)?;
//!
//! record_order_placed("buy", "market");
//! ```

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for governor sleeps (in seconds).
    pub sleep_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            // Sleep buckets from 10ms to the strictest tier's 5s spacing
            sleep_buckets: vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.sleep_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Order Lifecycle Metrics
// ============================================================================

/// Record a newly detected fill.
///
/// # Arguments
///
/// * `side` - Order side (`"buy"`, `"sell"`, `"unknown"`)
pub fn record_order_filled(side: &str) {
    counter!("orders_filled_total", "side" => side.to_string()).increment(1);
}

/// Record a detected cancellation.
pub fn record_order_cancelled() {
    counter!("orders_cancelled_total").increment(1);
}

/// Record a newly opened order.
pub fn record_order_opened() {
    counter!("orders_opened_total").increment(1);
}

/// Record an order placed by the engine.
///
/// # Arguments
///
/// * `side` - Order side
/// * `order_type` - `"market"`, `"limit"` or `"conditional"`
pub fn record_order_placed(side: &str, order_type: &str) {
    counter!(
        "orders_placed_total",
        "side" => side.to_string(),
        "type" => order_type.to_string()
    )
    .increment(1);
}

/// Record a stale order that was cancelled and reopened.
pub fn record_stale_order_reopened() {
    counter!("stale_orders_reopened_total").increment(1);
}

// ============================================================================
// Governor and Loop Metrics
// ============================================================================

/// Record a rate-limit rejection.
///
/// # Arguments
///
/// * `path` - Normalized endpoint path
pub fn record_rate_limit_rejection(path: &str) {
    counter!("rate_limit_rejections_total", "path" => path.to_string()).increment(1);
}

/// Record a throttling sleep.
pub fn record_governor_sleep(seconds: f64) {
    histogram!("governor_sleep_seconds").record(seconds);
}

/// Record a failed loop step.
///
/// # Arguments
///
/// * `step` - `"settings"`, `"fills"`, `"open"` or `"sweep"`
pub fn record_loop_error(step: &str) {
    counter!("loop_errors_total", "step" => step.to_string()).increment(1);
}

// ============================================================================
// Tests
// ============================================================================
