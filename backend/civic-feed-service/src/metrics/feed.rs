use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Histogram,
    HistogramVec, IntCounterVec,
};

lazy_static! {
    /// Feed requests by outcome (served, empty, tenant_not_found, error).
    pub static ref FEED_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "civic_feed_requests_total",
        "Feed requests segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register civic_feed_requests_total");

    /// Time spent assembling a feed page.
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "civic_feed_request_duration_seconds",
        "Feed assembly duration segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register civic_feed_request_duration_seconds");

    /// Items returned per feed page.
    pub static ref FEED_ITEMS_RETURNED: Histogram = register_histogram!(
        "civic_feed_items_returned",
        "Number of items returned per feed page",
        vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0]
    )
    .expect("failed to register civic_feed_items_returned");

    /// Interaction writes by kind and resulting action.
    pub static ref INTERACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "civic_interactions_total",
        "Interaction writes segmented by kind and action",
        &["kind", "action"]
    )
    .expect("failed to register civic_interactions_total");

    /// Cross-tenant accesses that were blocked (write path or feed re-validation).
    pub static ref TENANT_ISOLATION_VIOLATIONS: IntCounterVec = register_int_counter_vec!(
        "civic_tenant_isolation_violations_total",
        "Blocked cross-tenant accesses segmented by source",
        &["source"]
    )
    .expect("failed to register civic_tenant_isolation_violations_total");
}
