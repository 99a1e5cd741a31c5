//! Prometheus metrics for the swap coordinator.
//!
//! All metrics follow the naming convention `swap_<subsystem>_<metric>_total`.
//! Metrics live in a private registry built once on first use; recording is a
//! no-op if construction failed, and [`register_metrics`] reports the failure.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

/// Every counter the coordinator records.
pub struct SwapMetrics {
    registry: Registry,
    /// Intents accepted, labelled by side (buy/sell).
    pub intents_submitted: IntCounterVec,
    /// Matched trades emitted by the matching engine.
    pub trades_matched: IntCounter,
    /// Locks escrowed, labelled by chain.
    pub locks_created: IntCounterVec,
    /// Terminal lock transitions, labelled by chain and outcome.
    pub lock_settlements: IntCounterVec,
    /// Multisig executions, labelled by inner call outcome.
    pub multisig_executions: IntCounterVec,
    /// Batches that started with insufficient custody balance.
    pub liquidity_shortfalls: IntCounter,
    /// Operator API requests, labelled by method and outcome.
    pub operator_requests: IntCounterVec,
}

impl SwapMetrics {
    fn build() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let intents_submitted = IntCounterVec::new(
            Opts::new("swap_intents_submitted_total", "Intents accepted by the ledger"),
            &["side"],
        )?;
        let trades_matched = IntCounter::new(
            "swap_matching_trades_total",
            "Matched trades emitted by the matching engine",
        )?;
        let locks_created = IntCounterVec::new(
            Opts::new("swap_htlc_locks_created_total", "Locks escrowed on chain"),
            &["chain"],
        )?;
        let lock_settlements = IntCounterVec::new(
            Opts::new(
                "swap_htlc_settlements_total",
                "Terminal lock transitions (withdrawn/refunded)",
            ),
            &["chain", "outcome"],
        )?;
        let multisig_executions = IntCounterVec::new(
            Opts::new(
                "swap_multisig_executions_total",
                "Executed multisig transactions by inner outcome",
            ),
            &["outcome"],
        )?;
        let liquidity_shortfalls = IntCounter::new(
            "swap_bridge_liquidity_shortfalls_total",
            "Batches opened with custody balance below requirement",
        )?;
        let operator_requests = IntCounterVec::new(
            Opts::new("swap_operator_requests_total", "Operator API requests"),
            &["method", "outcome"],
        )?;

        registry.register(Box::new(intents_submitted.clone()))?;
        registry.register(Box::new(trades_matched.clone()))?;
        registry.register(Box::new(locks_created.clone()))?;
        registry.register(Box::new(lock_settlements.clone()))?;
        registry.register(Box::new(multisig_executions.clone()))?;
        registry.register(Box::new(liquidity_shortfalls.clone()))?;
        registry.register(Box::new(operator_requests.clone()))?;

        Ok(Self {
            registry,
            intents_submitted,
            trades_matched,
            locks_created,
            lock_settlements,
            multisig_executions,
            liquidity_shortfalls,
            operator_requests,
        })
    }
}

lazy_static! {
    static ref METRICS: Result<SwapMetrics, String> =
        SwapMetrics::build().map_err(|e| e.to_string());
}

/// The global metrics, if they could be built.
pub fn metrics() -> Option<&'static SwapMetrics> {
    METRICS.as_ref().ok()
}

/// Handle proving the registry was built.
pub struct MetricsHandle {
    _registry: &'static Registry,
}

/// Build the registry eagerly so a construction failure surfaces at startup.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    match METRICS.as_ref() {
        Ok(m) => Ok(MetricsHandle {
            _registry: &m.registry,
        }),
        Err(e) => Err(TelemetryError::MetricsInit(e.clone())),
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let m = metrics().ok_or_else(|| TelemetryError::MetricsInit("registry unavailable".into()))?;
    let encoder = TextEncoder::new();
    let metric_families = m.registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Count an accepted intent.
pub fn record_intent_submitted(side: &str) {
    if let Some(m) = metrics() {
        m.intents_submitted.with_label_values(&[side]).inc();
    }
}

/// Count matched trades.
pub fn record_trades_matched(count: usize) {
    if let Some(m) = metrics() {
        m.trades_matched.inc_by(count as u64);
    }
}

/// Count an escrowed lock.
pub fn record_lock_created(chain: &str) {
    if let Some(m) = metrics() {
        m.locks_created.with_label_values(&[chain]).inc();
    }
}

/// Count a terminal lock transition.
pub fn record_lock_settled(chain: &str, outcome: &str) {
    if let Some(m) = metrics() {
        m.lock_settlements.with_label_values(&[chain, outcome]).inc();
    }
}

/// Count a multisig execution by its inner outcome.
pub fn record_multisig_execution(success: bool) {
    if let Some(m) = metrics() {
        let outcome = if success { "success" } else { "failure" };
        m.multisig_executions.with_label_values(&[outcome]).inc();
    }
}

/// Count a batch opened short of liquidity.
pub fn record_liquidity_shortfall() {
    if let Some(m) = metrics() {
        m.liquidity_shortfalls.inc();
    }
}

/// Count an operator API request.
pub fn record_operator_request(method: &str, success: bool) {
    if let Some(m) = metrics() {
        let outcome = if success { "ok" } else { "error" };
        m.operator_requests.with_label_values(&[method, outcome]).inc();
    }
}
