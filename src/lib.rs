use actix_cors::Cors;
use actix_web::middleware::{Compress, Logger};
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use prometheus::Registry;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod reports;

use crate::config::ReportConfig;
use crate::reports::{ReportManager, ReportMetrics};

const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://localhost:8080",
];

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::reports::handlers::list_report_types,
        crate::reports::handlers::get_report_metadata,
        crate::reports::handlers::generate_report,
        crate::reports::handlers::preview_report,
        crate::reports::handlers::generate_report_document,
        crate::reports::handlers::get_report_config,
        crate::reports::handlers::update_report_config
    ),
    components(
        schemas(
            reports::types::ReportType,
            reports::types::ReportOptions,
            reports::types::MarginOverrides,
            reports::types::RenderOptions,
            reports::types::Margins,
            reports::types::PageFormat,
            reports::types::Orientation,
            reports::handlers::ReportTypeInfo,
            reports::handlers::ReportMetadataResponse,
            reports::handlers::GenerateReportBody,
            reports::handlers::ReportDocumentResponse,
            config::ReportConfig,
            config::ReportConfigUpdate,
            config::PdfQuality,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Reports", description = "School report PDF generation endpoints.")
    )
)]
pub struct ApiDoc;

/// Report routes under `/api`, with JSON errors for malformed bodies and
/// unmatched paths.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(4 * 1024 * 1024)
        .error_handler(|err, _req| {
            let response = HttpResponse::BadRequest().json(ErrorResponse::bad_request(&err.to_string()));
            actix_web::error::InternalError::from_response(err, response).into()
        });

    cfg.app_data(json_config).service(
        web::scope("/api")
            .configure(reports::handlers::config)
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(ErrorResponse::not_found("No such endpoint"))
            })),
    );
}

/// Browser origins allowed by CORS, from a comma-separated list.
/// Falls back to local development origins when unset or empty.
pub fn allowed_origins(raw: Option<&str>) -> Vec<String> {
    let origins: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() {
        DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()
    } else {
        origins
    }
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ReportConfig::from_env()?;
    log::info!(
        "Report output: {} (save to disk: {})",
        config.output_dir,
        config.save_to_disk
    );

    let registry = Registry::new();
    let metrics = ReportMetrics::new()?;
    metrics.register(&registry)?;
    let prometheus = PrometheusMetricsBuilder::new("school_reports")
        .registry(registry)
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {}", e))?;

    let manager = web::Data::new(ReportManager::from_config(config).with_metrics(metrics));

    let origins = allowed_origins(std::env::var("CORS_ALLOWED_ORIGINS").ok().as_deref());
    log::info!("CORS allowed origins: {}", origins.join(", "));

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => raw.parse()?,
        Err(_) => 8080,
    };

    log::info!("Starting server at http://{}:{}", host, port);

    HttpServer::new(move || {
        let prometheus = prometheus.clone();
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(Logger::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(manager.clone())
            .configure(configure_app)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins_from_env_list() {
        assert_eq!(
            allowed_origins(Some(" https://school.example.kh , http://localhost:5173,")),
            vec!["https://school.example.kh", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_allowed_origins_default_to_local_dev() {
        let origins = allowed_origins(None);
        assert_eq!(origins, allowed_origins(Some("  ")));
        assert!(origins.iter().all(|o| o.starts_with("http://localhost")));
        assert!(!origins.iter().any(|o| o == "*"));
    }
}
