//! Prometheus collectors, registered on the default registry and exposed on `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter_vec, Histogram, IntCounterVec};

pub static DOCUMENTS_GENERATED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "customs_documents_generated_total",
        "Customs documents generated, by form kind",
        &["form_kind"]
    )
    .expect("documents_generated metric registers once")
});

pub static GENERATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "customs_document_generation_failures_total",
        "Customs documents that failed to stamp, render or merge, by form kind",
        &["form_kind"]
    )
    .expect("generation_failures metric registers once")
});

pub static UPLOAD_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "customs_document_upload_failures_total",
        "Generated documents the carrier rejected on upload or association, by form kind",
        &["form_kind"]
    )
    .expect("upload_failures metric registers once")
});

pub static RENDER_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "customs_item_table_render_seconds",
        "Time spent printing the invoice item table",
        vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("render_duration metric registers once")
});

/// Forces registration so every series shows up on the first scrape.
pub fn init() {
    Lazy::force(&DOCUMENTS_GENERATED);
    Lazy::force(&GENERATION_FAILURES);
    Lazy::force(&UPLOAD_FAILURES);
    Lazy::force(&RENDER_DURATION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_labelled_by_form_kind() {
        init();
        let before = DOCUMENTS_GENERATED.with_label_values(&["TSCA"]).get();
        DOCUMENTS_GENERATED.with_label_values(&["TSCA"]).inc();
        assert_eq!(DOCUMENTS_GENERATED.with_label_values(&["TSCA"]).get(), before + 1);

        let names: Vec<String> = prometheus::gather().iter().map(|f| f.get_name().to_string()).collect();
        assert!(names.iter().any(|n| n == "customs_documents_generated_total"));
    }
}
