//! Prometheus metrics for the anomaly server

use once_cell::sync::Lazy;
use prometheus::{Counter, CounterVec, Encoder, Histogram, IntGaugeVec, Opts, TextEncoder};

pub static EVENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    let c = CounterVec::new(
        Opts::new("pawtrack_events_total", "Event mutations applied"),
        &["op"],
    )
    .expect("valid metric");
    prometheus::register(Box::new(c.clone())).expect("metric registered once");
    c
});

pub static RECOMPUTE_TOTAL: Lazy<Counter> = Lazy::new(|| {
    let c = Counter::new("pawtrack_recompute_total", "Total alert recomputations")
        .expect("valid metric");
    prometheus::register(Box::new(c.clone())).expect("metric registered once");
    c
});

pub static ALERTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    let c = CounterVec::new(
        Opts::new("pawtrack_alerts_total", "Alerts produced by recomputations"),
        &["metric", "kind", "severity"],
    )
    .expect("valid metric");
    prometheus::register(Box::new(c.clone())).expect("metric registered once");
    c
});

pub static DROPPED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    let c = Counter::new(
        "pawtrack_dropped_total",
        "Requests rejected due to shard backpressure",
    )
    .expect("valid metric");
    prometheus::register(Box::new(c.clone())).expect("metric registered once");
    c
});

pub static RECOMPUTE_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    let h = Histogram::with_opts(prometheus::HistogramOpts::new(
        "pawtrack_recompute_duration_seconds",
        "Histogram of recompute latency",
    ))
    .expect("valid metric");
    prometheus::register(Box::new(h.clone())).expect("metric registered once");
    h
});

pub static CACHED_SUBJECTS: Lazy<IntGaugeVec> = Lazy::new(|| {
    let g = IntGaugeVec::new(
        Opts::new("pawtrack_cached_subjects", "Subjects with a cached alert set"),
        &["shard"],
    )
    .expect("valid metric");
    prometheus::register(Box::new(g.clone())).expect("metric registered once");
    g
});

/// Force registration so every series shows up before first use
pub fn init() {
    let _ = &*EVENTS_TOTAL;
    let _ = &*RECOMPUTE_TOTAL;
    let _ = &*ALERTS_TOTAL;
    let _ = &*DROPPED_TOTAL;
    let _ = &*RECOMPUTE_LATENCY;
    let _ = &*CACHED_SUBJECTS;
}

/// Text exposition of the default registry
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
