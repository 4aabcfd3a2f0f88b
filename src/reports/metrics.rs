//! Prometheus counters for report generation.

use prometheus::{IntCounterVec, Opts, Registry};

use super::types::ReportType;
use super::{PdfResult, ReportError};

#[derive(Clone)]
pub struct ReportMetrics {
    generations: IntCounterVec,
}

impl ReportMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let generations = IntCounterVec::new(
            Opts::new(
                "report_generations_total",
                "Report generation attempts by report type and outcome",
            ),
            &["report_type", "outcome"],
        )?;
        Ok(Self { generations })
    }

    /// Register the counters so they show up on `/metrics`.
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.generations.clone()))
    }

    pub fn record(&self, report_type: ReportType, result: &Result<PdfResult, ReportError>) {
        let outcome = match result {
            Ok(pdf) if pdf.persist_error.is_some() => "persist_failed",
            Ok(_) => "success",
            Err(err) => err.error_code(),
        };
        self.generations
            .with_label_values(&[report_type.as_str(), outcome])
            .inc();
    }

    pub fn count(&self, report_type: ReportType, outcome: &str) -> u64 {
        self.generations
            .with_label_values(&[report_type.as_str(), outcome])
            .get()
    }
}
