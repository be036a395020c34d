//! Prometheus metrics for trading negotiation and settlement
//!
//! Metrics are recorded through the `metrics` facade; without an installed
//! recorder every call is a no-op, so the helpers are safe in tests.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Initialize the Prometheus metrics exporter
///
/// This starts an HTTP listener on the specified port that exposes metrics
/// at the `/metrics` endpoint.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Outcome label for a single method negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcomeLabel {
    Succeeded,
    Failed,
}

impl NegotiationOutcomeLabel {
    fn as_str(&self) -> &'static str {
        match self {
            NegotiationOutcomeLabel::Succeeded => "succeeded",
            NegotiationOutcomeLabel::Failed => "failed",
        }
    }
}

/// Settlement-side metrics
///
/// # Metrics
///
/// * `negotiations_total{side,method,outcome}` - Method negotiations by outcome
/// * `negotiation_duration_seconds{side,method}` - Time spent negotiating one method
/// * `negotiation_options_total{side,method}` - Trading options surfaced
/// * `settlements_confirmed_total{side}` - Settlement documents persisted
/// * `settlements_failed_total{side}` - Failed persistence attempts
#[derive(Debug, Clone)]
pub struct SettlementMetrics {
    side: String,
}

impl SettlementMetrics {
    /// Create metrics for one settlement side ("receipt" or "payment")
    pub fn new(side: &str) -> Self {
        Self {
            side: side.to_string(),
        }
    }

    /// Record a finished negotiation for one method
    pub fn record_negotiation(
        &self,
        method: &str,
        outcome: NegotiationOutcomeLabel,
        duration: Duration,
        option_count: usize,
    ) {
        counter!(
            "negotiations_total",
            "side" => self.side.clone(),
            "method" => method.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        histogram!(
            "negotiation_duration_seconds",
            "side" => self.side.clone(),
            "method" => method.to_string()
        )
        .record(duration.as_secs_f64());
        counter!(
            "negotiation_options_total",
            "side" => self.side.clone(),
            "method" => method.to_string()
        )
        .increment(option_count as u64);
    }

    /// Record a persisted settlement document
    pub fn settlement_confirmed(&self) {
        counter!("settlements_confirmed_total", "side" => self.side.clone()).increment(1);
    }

    /// Record a failed persistence attempt
    pub fn settlement_failed(&self) {
        counter!("settlements_failed_total", "side" => self.side.clone()).increment(1);
    }

    /// Get the side label
    pub fn side(&self) -> &str {
        &self.side
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let metrics = SettlementMetrics::new("receipt");
        metrics.record_negotiation(
            "TM_CASH",
            NegotiationOutcomeLabel::Succeeded,
            Duration::from_millis(3),
            1,
        );
        metrics.settlement_confirmed();
        metrics.settlement_failed();
        assert_eq!(metrics.side(), "receipt");
    }
}
