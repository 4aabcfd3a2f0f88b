//! Report manager - the single entry point for report generation.
//!
//! Resolves the template for a report type, renders HTML, prints it to PDF
//! and optionally saves it. Configuration is injected at construction and
//! snapshotted at the start of each generation, so `update_config` never
//! changes a report that is already in flight.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::common::generate_safe_filename_at;
use super::engine::HtmlToPdfEngine;
use super::metrics::ReportMetrics;
use super::options::merge_report_options;
use super::registry::ReportRegistry;
use super::storage::save_pdf;
use super::traits::{RenderedHtml, TemplateContext};
use super::types::{ReportMetadata, ReportOptions, ReportRequest, ReportType};
use super::{PdfResult, PdfResultWithMetadata, ReportError};
use crate::config::{ReportConfig, ReportConfigUpdate};

pub struct ReportManager {
    registry: ReportRegistry,
    engine: HtmlToPdfEngine,
    config: RwLock<ReportConfig>,
    metrics: Option<ReportMetrics>,
}

impl ReportManager {
    /// Manager with the built-in templates.
    pub fn new(config: ReportConfig, engine: HtmlToPdfEngine) -> Self {
        Self::with_registry(config, engine, ReportRegistry::with_builtin_templates())
    }

    pub fn with_registry(config: ReportConfig, engine: HtmlToPdfEngine, registry: ReportRegistry) -> Self {
        Self {
            registry,
            engine,
            config: RwLock::new(config),
            metrics: None,
        }
    }

    /// Count every generation in `metrics`.
    pub fn with_metrics(mut self, metrics: ReportMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Manager printing through a local Chromium as configured.
    pub fn from_config(config: ReportConfig) -> Self {
        let engine = HtmlToPdfEngine::chromium(
            config.chromium_path.as_ref().map(PathBuf::from),
            config.settle_delay(),
        );
        Self::new(config, engine)
    }

    /// Snapshot of the current configuration.
    pub fn get_config(&self) -> ReportConfig {
        self.config.read().clone()
    }

    /// Apply a partial update and return the resulting configuration.
    /// A rejected update leaves the configuration unchanged.
    pub fn update_config(&self, update: ReportConfigUpdate) -> Result<ReportConfig, ReportError> {
        let mut config = self.config.write();
        config.apply(update).map_err(|err| {
            warn!("Rejected report configuration update: {}", err);
            err
        })?;
        info!("Report configuration updated");
        Ok(config.clone())
    }

    pub fn list_available_report_types(&self) -> Vec<ReportType> {
        self.registry.available()
    }

    pub fn get_metadata(&self, report_type: ReportType) -> &'static ReportMetadata {
        report_type.metadata()
    }

    /// Metadata by wire name. Fails for names outside [`ReportType`].
    pub fn metadata_for(&self, name: &str) -> Result<&'static ReportMetadata, ReportError> {
        let report_type: ReportType = name.parse()?;
        Ok(report_type.metadata())
    }

    /// Run only the template step and return the HTML.
    pub fn preview_html(&self, report_type: ReportType, payload: &Value) -> Result<String, ReportError> {
        let config = self.get_config();
        self.render_template(report_type, payload, &config, Utc::now())
            .map(|rendered| rendered.html)
    }

    pub async fn generate(
        &self,
        report_type: ReportType,
        payload: &Value,
        options: Option<&ReportOptions>,
    ) -> Result<PdfResult, ReportError> {
        self.generate_at(report_type, payload, options, Utc::now()).await
    }

    pub async fn generate_request(&self, request: ReportRequest) -> Result<PdfResult, ReportError> {
        self.generate(request.report_type, &request.payload, request.options.as_ref())
            .await
    }

    pub async fn generate_with_metadata(
        &self,
        report_type: ReportType,
        payload: &Value,
        options: Option<&ReportOptions>,
    ) -> Result<PdfResultWithMetadata, ReportError> {
        let result = self.generate(report_type, payload, options).await?;
        Ok(PdfResultWithMetadata {
            result,
            report_type,
            metadata: report_type.metadata(),
        })
    }

    /// [`generate`](Self::generate) with an explicit generation time.
    pub async fn generate_at(
        &self,
        report_type: ReportType,
        payload: &Value,
        options: Option<&ReportOptions>,
        generated_at: DateTime<Utc>,
    ) -> Result<PdfResult, ReportError> {
        let result = self
            .run_generation(report_type, payload, options, generated_at)
            .await;
        if let Some(metrics) = &self.metrics {
            metrics.record(report_type, &result);
        }
        result
    }

    async fn run_generation(
        &self,
        report_type: ReportType,
        payload: &Value,
        options: Option<&ReportOptions>,
        generated_at: DateTime<Utc>,
    ) -> Result<PdfResult, ReportError> {
        let config = self.get_config();
        info!("Generating {} report", report_type);

        let rendered = self.render_template(report_type, payload, &config, generated_at)?;
        let options = merge_report_options(options, &config.default_options);

        let buffer = self
            .engine
            .with_settle_delay(config.settle_delay())
            .render(&rendered.html, &options, &rendered.title)
            .await
            .map_err(|err| {
                error!("{} report failed at render step: {}", report_type, err);
                err
            })?;

        let filename = generate_safe_filename_at(
            &config.filename_prefix,
            &rendered.identifier,
            "pdf",
            config.include_timestamp.then_some(generated_at),
        );

        let (file_path, persist_error) = if config.save_to_disk {
            match save_pdf(Path::new(&config.output_dir), &filename, &buffer).await {
                Ok(path) => (Some(path.display().to_string()), None),
                Err(err) => {
                    warn!(
                        "{} report rendered but could not be saved as {}: {}",
                        report_type, filename, err
                    );
                    (None, Some(err.to_string()))
                }
            }
        } else {
            (None, None)
        };

        info!(
            "Generated {} report {} ({} bytes)",
            report_type,
            filename,
            buffer.len()
        );

        Ok(PdfResult {
            size: buffer.len(),
            buffer,
            filename,
            file_path,
            generated_at,
            persist_error,
        })
    }

    fn render_template(
        &self,
        report_type: ReportType,
        payload: &Value,
        config: &ReportConfig,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedHtml, ReportError> {
        let template = self.registry.resolve(report_type).map_err(|err| {
            warn!("Rejected {} report: {}", report_type, err);
            err
        })?;

        let ctx = TemplateContext::new(config.institution_name.clone(), generated_at);
        template.render(payload, &ctx).map_err(|err| {
            error!("{} report failed at template step: {}", report_type, err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::engine::testing::{FailAt, RecordingLauncher, FAKE_PDF};
    use crate::reports::types::{Margins, RenderOptions};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_config() -> ReportConfig {
        ReportConfig {
            institution_name: "វិទ្យាល័យសន្តិភាព".to_string(),
            include_timestamp: false,
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    fn manager(config: ReportConfig, fail_at: FailAt) -> (ReportManager, RecordingLauncher) {
        let launcher = RecordingLauncher::new(fail_at);
        let shared = RecordingLauncher {
            counters: launcher.counters.clone(),
            fail_at,
            last_html: launcher.last_html.clone(),
        };
        let engine = HtmlToPdfEngine::new(Arc::new(shared), Duration::ZERO);
        (ReportManager::new(config, engine), launcher)
    }

    fn report_card() -> Value {
        json!({
            "studentId": "STU-7",
            "studentName": "លី ស្រីនិច",
            "studentNameLatin": "Ly Sreynich",
            "grade": "8",
            "schoolYear": "2024-2025",
            "grades": [
                { "subject": "Mathematics", "score": 88 },
                { "subject": "Biology", "score": 74 },
                { "subject": "English", "score": 95 }
            ],
            "attendance": { "total": 20, "present": 18, "absent": 1, "late": 1 }
        })
    }

    #[tokio::test]
    async fn test_generate_report_card_end_to_end() {
        let (manager, launcher) = manager(test_config(), FailAt::Nothing);

        let result = manager
            .generate(ReportType::StudentReportCard, &report_card(), None)
            .await
            .unwrap();

        assert_eq!(result.buffer, FAKE_PDF);
        assert_eq!(result.size, FAKE_PDF.len());
        assert_eq!(result.filename, "report-stu-7-ly-sreynich.pdf");
        assert!(result.file_path.is_none());

        let html = launcher.last_html.lock().clone().unwrap();
        assert!(html.contains("90%"));
        for subject in ["Mathematics", "Biology", "English"] {
            assert!(html.contains(subject));
        }
        assert!(html.contains("វិទ្យាល័យសន្តិភាព"));
        assert_eq!(launcher.counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stub_types_fail_without_launching() {
        let (manager, launcher) = manager(test_config(), FailAt::Nothing);
        let available = manager.list_available_report_types();

        for report_type in ReportType::ALL {
            if available.contains(&report_type) {
                continue;
            }
            let err = manager
                .generate(report_type, &json!({}), None)
                .await
                .unwrap_err();
            assert!(matches!(err, ReportError::NotImplemented(t) if t == report_type));
            assert!(err.to_string().contains(report_type.as_str()));
        }
        assert_eq!(launcher.counters.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unregistered_type_is_unknown() {
        let launcher = RecordingLauncher::new(FailAt::Nothing);
        let engine = HtmlToPdfEngine::new(Arc::new(launcher), Duration::ZERO);
        let manager = ReportManager::with_registry(test_config(), engine, ReportRegistry::empty());

        let err = manager
            .generate(ReportType::GradeReport, &json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::UnknownReportType(_)));
        assert!(manager.metadata_for("id-card").is_err());
        assert_eq!(
            manager.metadata_for("grade-report").unwrap().title,
            ReportType::GradeReport.metadata().title
        );
    }

    #[tokio::test]
    async fn test_malformed_options_close_browser_once() {
        let (manager, launcher) = manager(test_config(), FailAt::Nothing);
        let options = ReportOptions {
            margins: Some(crate::reports::types::MarginOverrides {
                left: Some("lots".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let err = manager
            .generate(ReportType::StudentReportCard, &report_card(), Some(&options))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidOptions(_)));
        assert_eq!(launcher.counters.launches.load(Ordering::SeqCst), 1);
        assert_eq!(launcher.counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_saves_to_output_dir_with_timestamp() {
        let temp = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            save_to_disk: true,
            include_timestamp: true,
            output_dir: temp.path().join("out").display().to_string(),
            filename_prefix: "card".to_string(),
            ..test_config()
        };
        let (manager, _launcher) = manager(config, FailAt::Nothing);
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 15, 0).unwrap();

        let result = manager
            .generate_at(ReportType::StudentReportCard, &report_card(), None, at)
            .await
            .unwrap();

        assert_eq!(result.filename, "card-stu-7-ly-sreynich-2024-05-02T09-15-00-000Z.pdf");
        let path = result.file_path.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), FAKE_PDF);
        assert_eq!(result.generated_at, at);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_buffer() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("occupied");
        std::fs::write(&blocker, b"x").unwrap();
        let config = ReportConfig {
            save_to_disk: true,
            output_dir: blocker.display().to_string(),
            ..test_config()
        };
        let (manager, _launcher) = manager(config, FailAt::Nothing);

        let result = manager
            .generate(ReportType::StudentReportCard, &report_card(), None)
            .await
            .unwrap();
        assert_eq!(result.buffer, FAKE_PDF);
        assert!(result.file_path.is_none());
        assert!(result.persist_error.is_some());
    }

    #[tokio::test]
    async fn test_render_failure_propagates() {
        let (manager, launcher) = manager(test_config(), FailAt::Print);
        let err = manager
            .generate(ReportType::StudentReportCard, &report_card(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::PdfExport(_)));
        assert_eq!(launcher.counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_with_metadata() {
        let (manager, _launcher) = manager(test_config(), FailAt::Nothing);
        let result = manager
            .generate_with_metadata(ReportType::StudentReportCard, &report_card(), None)
            .await
            .unwrap();
        assert_eq!(result.report_type, ReportType::StudentReportCard);
        assert_eq!(result.metadata, ReportType::StudentReportCard.metadata());
        assert!(!result.result.buffer.is_empty());
    }

    #[test]
    fn test_update_config_is_visible_to_later_snapshots() {
        let (manager, _launcher) = manager(test_config(), FailAt::Nothing);
        let before = manager.get_config();

        let after = manager
            .update_config(ReportConfigUpdate {
                institution_name: Some("New School".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(before.institution_name, "វិទ្យាល័យសន្តិភាព");
        assert_eq!(after.institution_name, "New School");
        assert_eq!(manager.get_config(), after);
        assert_eq!(after.default_options, RenderOptions::default());
        assert_eq!(after.default_options.margins, Margins::default());
    }

    #[tokio::test]
    async fn test_rejected_margin_update_keeps_generation_working() {
        let (manager, launcher) = manager(test_config(), FailAt::Nothing);
        let err = manager
            .update_config(ReportConfigUpdate {
                default_options: Some(ReportOptions {
                    margins: Some(crate::reports::types::MarginOverrides {
                        left: Some("lots".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(manager.get_config(), test_config());

        for _ in 0..3 {
            manager
                .generate(ReportType::StudentReportCard, &report_card(), None)
                .await
                .unwrap();
        }
        assert_eq!(launcher.counters.prints.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_generations_are_counted_by_outcome() {
        let (manager, _launcher) = manager(test_config(), FailAt::Nothing);
        let metrics = ReportMetrics::new().unwrap();
        let manager = manager.with_metrics(metrics.clone());

        manager
            .generate(ReportType::StudentReportCard, &report_card(), None)
            .await
            .unwrap();
        manager
            .generate(ReportType::FinancialReport, &json!({}), None)
            .await
            .unwrap_err();

        assert_eq!(metrics.count(ReportType::StudentReportCard, "success"), 1);
        assert_eq!(metrics.count(ReportType::FinancialReport, "NotImplemented"), 1);
    }

    #[test]
    fn test_preview_html_runs_template_only() {
        let (manager, launcher) = manager(test_config(), FailAt::Nothing);
        let html = manager
            .preview_html(ReportType::StudentReportCard, &report_card())
            .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(launcher.counters.launches.load(Ordering::SeqCst), 0);
    }
}
