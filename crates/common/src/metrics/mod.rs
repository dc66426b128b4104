//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming for tool invocations,
//! cache effectiveness, and pipeline outcomes.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all ScholarMatch metrics
pub const METRICS_PREFIX: &str = "scholarmatch";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_tool_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total tool gateway invocations"
    );

    describe_counter!(
        format!("{}_tool_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Tool invocations degraded to empty results"
    );

    describe_histogram!(
        format!("{}_tool_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Tool invocation latency in seconds"
    );

    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    describe_counter!(
        format!("{}_pipeline_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Matching pipeline runs by terminal status"
    );

    describe_histogram!(
        format!("{}_pipeline_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end matching pipeline latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Record a tool gateway invocation
pub fn record_tool_call(service: &str, operation: &str, duration_secs: f64, success: bool) {
    counter!(
        format!("{}_tool_calls_total", METRICS_PREFIX),
        "service" => service.to_string(),
        "operation" => operation.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_tool_call_duration_seconds", METRICS_PREFIX),
        "service" => service.to_string()
    )
    .record(duration_secs);

    if !success {
        counter!(
            format!("{}_tool_failures_total", METRICS_PREFIX),
            "service" => service.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }
}

/// Record cache effectiveness
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

/// Record a terminal pipeline outcome
pub fn record_pipeline(status: &str, duration_secs: f64) {
    counter!(
        format!("{}_pipeline_runs_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_pipeline_duration_seconds", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorders_run_without_a_registered_exporter() {
        register_metrics();
        record_tool_call("scholar", "search_scholar", 0.12, true);
        record_tool_call("search", "search_web", 0.05, false);
        record_cache(true, "professor");
        record_pipeline("completed", 42.0);
    }
}
