//! Traits for report template standardization.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::ReportType;
use super::ReportError;

/// Values injected into every template so rendering stays deterministic.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub institution_name: String,
    pub generated_at: DateTime<Utc>,
}

impl TemplateContext {
    pub fn new(institution_name: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            institution_name: institution_name.into(),
            generated_at,
        }
    }
}

/// Output of the template step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHtml {
    pub html: String,
    /// Human-readable identifier used to name the output file.
    pub identifier: String,
    /// Document title, shown in the PDF page header.
    pub title: String,
}

/// A report template: typed payload in, complete HTML document out.
pub trait ReportTemplate: Send + Sync {
    fn report_type(&self) -> ReportType;

    /// Render the payload. Must not read the clock or any other ambient state.
    fn render(&self, payload: &Value, ctx: &TemplateContext) -> Result<RenderedHtml, ReportError>;
}

/// Deserialize a JSON payload into the template's typed data.
pub fn parse_payload<T: DeserializeOwned>(
    report_type: ReportType,
    payload: &Value,
) -> Result<T, ReportError> {
    T::deserialize(payload).map_err(|err| ReportError::InvalidPayload {
        report_type,
        message: err.to_string(),
    })
}
