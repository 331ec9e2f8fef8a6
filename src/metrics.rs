use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, HistogramVec, register_counter, register_counter_vec,
    register_histogram_vec,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: CounterVec = register_counter_vec!(
        "memezy_requests_total",
        "Total number of requests",
        &["route"]
    )
    .unwrap();
    pub static ref REQUEST_ERRORS: CounterVec = register_counter_vec!(
        "memezy_request_errors_total",
        "Requests answered with an error body",
        &["route"]
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: HistogramVec = register_histogram_vec!(
        "memezy_upstream_latency_seconds",
        "Time until the upstream answered, in seconds",
        &["service"]
    )
    .unwrap();
    pub static ref FRAGMENTS_RELAYED: Counter = register_counter!(
        "memezy_fragments_relayed_total",
        "Chat text fragments forwarded to clients"
    )
    .unwrap();
    pub static ref CAPTIONS_GENERATED: Counter = register_counter!(
        "memezy_captions_generated_total",
        "Captions returned to clients"
    )
    .unwrap();
}
