//! Metrics collection for observability
//!
//! Prometheus metrics for dispatched operations, kept in a private registry
//! so several stores can live in one process.
//!
//! # Metrics
//!
//! - `trade_ledger_operations_total{operation}` - Invocations per operation
//! - `trade_ledger_errors_total{operation,kind}` - Failed invocations by error kind
//! - `trade_ledger_operation_duration_seconds{operation}` - Invocation latency

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Invocations per operation
    pub operations_total: IntCounterVec,

    /// Failures per operation and error kind
    pub errors_total: IntCounterVec,

    /// Invocation latency
    pub operation_duration: HistogramVec,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounterVec::new(
            Opts::new("trade_ledger_operations_total", "Invocations per operation"),
            &["operation"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new(
                "trade_ledger_errors_total",
                "Failed invocations by operation and error kind",
            ),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "trade_ledger_operation_duration_seconds",
                "Histogram of invocation latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            operations_total,
            errors_total,
            operation_duration,
            registry,
        })
    }

    /// Record one invocation
    pub fn record_operation(&self, operation: &str, duration_seconds: f64) {
        self.operations_total.with_label_values(&[operation]).inc();
        self.operation_duration
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// Record a failed invocation
    pub fn record_error(&self, operation: &str, kind: &str) {
        self.errors_total.with_label_values(&[operation, kind]).inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of everything recorded so far
    pub fn encode_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
