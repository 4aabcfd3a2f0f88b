//! Reports module - turns typed school data into PDF documents.
//!
//! Each report type has a template that renders Khmer-localized HTML, which the
//! engine prints to PDF through a headless Chromium:
//! - `StudentRegistration` - student registration form
//! - `StudentReportCard` - per-term report card
//! - `AttendanceReport` - class attendance register
//!
//! The remaining report types are registered but not implemented yet.

pub mod common;
pub mod engine;
pub mod handlers;
pub mod manager;
pub mod metrics;
pub mod options;
pub mod registry;
pub mod storage;
pub mod templates;
pub mod traits;
pub mod types;

pub use engine::{BrowserLauncher, BrowserSession, ChromiumLauncher, HtmlToPdfEngine, PdfLayout};
pub use manager::ReportManager;
pub use metrics::ReportMetrics;
pub use options::merge_report_options;
pub use registry::{RegistryEntry, ReportRegistry};
pub use traits::{RenderedHtml, ReportTemplate, TemplateContext};
pub use types::{
    MarginOverrides, Margins, Orientation, PageFormat, RenderOptions, ReportMetadata,
    ReportOptions, ReportRequest, ReportType,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unknown report type: {0}")]
    UnknownReportType(String),
    #[error("report type '{0}' is not yet implemented")]
    NotImplemented(ReportType),
    #[error("invalid payload for {report_type}: {message}")]
    InvalidPayload {
        report_type: ReportType,
        message: String,
    },
    #[error("invalid render options: {0}")]
    InvalidOptions(String),
    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),
    #[error("failed to load page content: {0}")]
    PageLoad(String),
    #[error("PDF export failed: {0}")]
    PdfExport(String),
    #[error("failed to persist PDF: {0}")]
    Persist(#[source] std::io::Error),
}

impl ReportError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ReportError::UnknownReportType(_) => "UnknownReportType",
            ReportError::NotImplemented(_) => "NotImplemented",
            ReportError::InvalidPayload { .. } => "InvalidPayload",
            ReportError::InvalidOptions(_) => "InvalidOptions",
            ReportError::BrowserLaunch(_) => "BrowserLaunch",
            ReportError::PageLoad(_) => "PageLoad",
            ReportError::PdfExport(_) => "PdfExport",
            ReportError::Persist(_) => "Persist",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ReportError::UnknownReportType(_) => 404,
            ReportError::NotImplemented(_) => 501,
            ReportError::InvalidPayload { .. } | ReportError::InvalidOptions(_) => 400,
            ReportError::BrowserLaunch(_)
            | ReportError::PageLoad(_)
            | ReportError::PdfExport(_)
            | ReportError::Persist(_) => 500,
        }
    }
}

/// Result of a successful report generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfResult {
    #[serde(skip)]
    pub buffer: Vec<u8>,
    pub filename: String,
    pub file_path: Option<String>,
    pub size: usize,
    pub generated_at: DateTime<Utc>,
    /// Set when the PDF rendered but could not be written to disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

/// A [`PdfResult`] with the report's static metadata attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfResultWithMetadata {
    #[serde(flatten)]
    pub result: PdfResult,
    pub report_type: ReportType,
    pub metadata: &'static ReportMetadata,
}
