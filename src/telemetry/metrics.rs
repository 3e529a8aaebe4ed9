//! Prometheus metrics setup and metric definitions

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> PrometheusHandle {
    // Default histogram buckets (seconds) for HTTP latency metrics.
    let buckets = vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .expect("failed to set histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus
/// output includes HELP/TYPE lines for all metrics from startup.
pub fn describe_metrics() {
    // HTTP metrics
    describe_counter!(
        "mailgate_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "mailgate_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "mailgate_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    // Gate metrics
    describe_counter!(
        "mailgate_resend_evaluations_total",
        "Resend gate evaluations by result"
    );
    describe_counter!(
        "mailgate_resend_admitted_total",
        "Admitted resend requests by client-supplied reason"
    );

    // Delivery queue metrics
    describe_counter!(
        "mailgate_email_queue_added_total",
        "Jobs accepted into the delivery queue"
    );
    describe_counter!(
        "mailgate_email_queue_overflow_total",
        "Enqueue attempts rejected because the queue was at capacity"
    );
    describe_counter!(
        "mailgate_email_delivered_total",
        "Jobs delivered successfully"
    );
    describe_counter!(
        "mailgate_email_retry_total",
        "Delivery attempts that failed and were rescheduled"
    );
    describe_counter!(
        "mailgate_email_failed_total",
        "Jobs that exhausted their retries and were dead-lettered"
    );
    describe_gauge!("mailgate_email_queue_depth", "Live jobs in the queue");
    describe_gauge!(
        "mailgate_dead_letters",
        "Dead-lettered jobs currently retained"
    );

    // Housekeeping metrics
    describe_counter!(
        "mailgate_attempt_records_swept_total",
        "Expired attempt records removed by the periodic sweep"
    );

    // Audit metrics
    describe_counter!(
        "mailgate_audit_events_total",
        "Audit events by event name and severity"
    );

    // Emit initial zero values for counters gated behind specific code
    // paths so HELP/TYPE lines appear in output from startup.
    counter!("mailgate_resend_evaluations_total", "result" => "admitted").absolute(0);
    counter!("mailgate_resend_evaluations_total", "result" => "rate_limited").absolute(0);
    counter!("mailgate_resend_evaluations_total", "result" => "locked_out").absolute(0);
    counter!("mailgate_resend_evaluations_total", "result" => "validation_error").absolute(0);
    counter!("mailgate_email_queue_added_total", "kind" => "verification").absolute(0);
    counter!("mailgate_email_delivered_total", "kind" => "verification").absolute(0);
    counter!("mailgate_email_retry_total", "kind" => "verification").absolute(0);
    counter!("mailgate_email_failed_total", "kind" => "verification").absolute(0);
    counter!("mailgate_email_queue_overflow_total").absolute(0);
    counter!("mailgate_attempt_records_swept_total").absolute(0);
    counter!("mailgate_audit_events_total", "event" => "resend.lockout", "severity" => "warning")
        .absolute(0);
    gauge!("mailgate_http_requests_in_flight").set(0.0);
    gauge!("mailgate_email_queue_depth").set(0.0);
    gauge!("mailgate_dead_letters").set(0.0);
}
