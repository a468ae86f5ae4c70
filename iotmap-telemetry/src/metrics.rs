//! ## iotmap-telemetry::metrics
//! **Prometheus recorder for modelling runs**
//!
//! ### Components:
//! - counters: transmissions ingested, records dropped, edges created
//! - histogram: rebuild wall time per layer

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: prometheus::Registry,
    pub transmissions_total: prometheus::Counter,
    pub records_dropped: prometheus::Counter,
    pub edges_created: prometheus::Counter,
    pub rebuild_seconds: prometheus::Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let transmissions_total = Counter::new(
            "iotmap_transmissions_total",
            "Total transmissions ingested from the feed",
        )
        .unwrap();
        let records_dropped = Counter::new(
            "iotmap_records_dropped_total",
            "Feed records dropped as malformed or unresolvable",
        )
        .unwrap();
        let edges_created = Counter::new(
            "iotmap_edges_created_total",
            "Graph edges created across rebuilds",
        )
        .unwrap();

        let rebuild_seconds = Histogram::with_opts(
            HistogramOpts::new("iotmap_rebuild_seconds", "Layer rebuild wall time")
                .buckets(vec![0.001, 0.01, 0.1, 1.0, 10.0]),
        )
        .unwrap();

        registry
            .register(Box::new(transmissions_total.clone()))
            .unwrap();
        registry.register(Box::new(records_dropped.clone())).unwrap();
        registry.register(Box::new(edges_created.clone())).unwrap();
        registry.register(Box::new(rebuild_seconds.clone())).unwrap();

        Self {
            registry,
            transmissions_total,
            records_dropped,
            edges_created,
            rebuild_seconds,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    pub fn record_ingest(&self, transmissions: usize, dropped: usize) {
        self.transmissions_total.inc_by(transmissions as f64);
        self.records_dropped.inc_by(dropped as f64);
    }

    pub fn record_rebuild(&self, edges: usize, dropped: usize, seconds: f64) {
        self.edges_created.inc_by(edges as f64);
        self.records_dropped.inc_by(dropped as f64);
        self.rebuild_seconds.observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_gathered_text() {
        let metrics = MetricsRecorder::new();
        metrics.record_ingest(10, 2);
        metrics.record_rebuild(5, 0, 0.02);

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("iotmap_transmissions_total 10"));
        assert!(text.contains("iotmap_records_dropped_total 2"));
        assert!(text.contains("iotmap_edges_created_total 5"));
    }
}
