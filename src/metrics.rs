//! Prometheus counters for relay calls.

use std::time::Duration;

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Relay call metrics, exposed at `/metrics`.
#[derive(Clone)]
pub struct RelayMetrics {
    registry: Registry,
    requests: IntCounterVec,
    duration: HistogramVec,
}

impl RelayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("relay_requests_total", "Relay calls by operation and outcome"),
            &["operation", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "relay_request_duration_seconds",
                "Wall time of relay calls to the backing server",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            duration,
        })
    }

    /// Record one finished relay call.
    pub fn observe(&self, operation: &str, outcome: &str, elapsed: Duration) {
        self.requests
            .with_label_values(&[operation, outcome])
            .inc();
        self.duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    pub fn request_count(&self, operation: &str, outcome: &str) -> u64 {
        self.requests
            .with_label_values(&[operation, outcome])
            .get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_counts_by_outcome() {
        let metrics = RelayMetrics::new().unwrap();
        metrics.observe("generate", "success", Duration::from_millis(5));
        metrics.observe("generate", "success", Duration::from_millis(7));
        metrics.observe("generate", "timeout", Duration::from_secs(1));

        assert_eq!(metrics.request_count("generate", "success"), 2);
        assert_eq!(metrics.request_count("generate", "timeout"), 1);
        assert_eq!(metrics.request_count("pull", "success"), 0);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = RelayMetrics::new().unwrap();
        metrics.observe("pull", "success", Duration::from_millis(1));
        let text = metrics.render().unwrap();
        assert!(text.contains("relay_requests_total"));
        assert!(text.contains("operation=\"pull\""));
        assert!(text.contains("relay_request_duration_seconds"));
    }
}
