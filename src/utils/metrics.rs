//! OpenTelemetry counters, compiled in with the `metrics` feature.

#[cfg(feature = "metrics")]
mod otel {
    use once_cell::sync::Lazy;
    use opentelemetry::KeyValue;
    use opentelemetry::global;
    use opentelemetry::metrics::Counter;

    static LEASES_GENERATED: Lazy<Counter<u64>> = Lazy::new(|| {
        global::meter("disposable-sms")
            .u64_counter("disposable_sms.leases_generated")
            .with_description("Phone leases acquired by sessions")
            .build()
    });

    static GENERATION_FAILURES: Lazy<Counter<u64>> = Lazy::new(|| {
        global::meter("disposable-sms")
            .u64_counter("disposable_sms.generation_failures")
            .with_description("Lease requests that failed")
            .build()
    });

    static POLL_FAILURES: Lazy<Counter<u64>> = Lazy::new(|| {
        global::meter("disposable-sms")
            .u64_counter("disposable_sms.poll_failures")
            .with_description("Inbox fetches that failed and were skipped")
            .build()
    });

    pub(crate) fn lease_generated(country: &str) {
        LEASES_GENERATED.add(1, &[KeyValue::new("country", country.to_string())]);
    }

    pub(crate) fn generation_failed(country: &str) {
        GENERATION_FAILURES.add(1, &[KeyValue::new("country", country.to_string())]);
    }

    pub(crate) fn poll_failed() {
        POLL_FAILURES.add(1, &[]);
    }
}

#[cfg(feature = "metrics")]
pub(crate) use otel::{generation_failed, lease_generated, poll_failed};

#[cfg(not(feature = "metrics"))]
pub(crate) fn lease_generated(_country: &str) {}

#[cfg(not(feature = "metrics"))]
pub(crate) fn generation_failed(_country: &str) {}

#[cfg(not(feature = "metrics"))]
pub(crate) fn poll_failed() {}
