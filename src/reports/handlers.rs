use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse, Responder};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::config::{ReportConfig, ReportConfigUpdate};
use crate::reports::types::{ReportMetadata, ReportOptions, ReportType};
use crate::reports::{ReportError, ReportManager};
use crate::ErrorResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadataResponse {
    pub title: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub data_source: String,
}

impl From<&ReportMetadata> for ReportMetadataResponse {
    fn from(meta: &ReportMetadata) -> Self {
        Self {
            title: meta.title.to_string(),
            description: meta.description.to_string(),
            version: meta.version.to_string(),
            author: meta.author.to_string(),
            data_source: meta.data_source.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportTypeInfo {
    pub report_type: ReportType,
    pub metadata: ReportMetadataResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateReportBody {
    #[schema(value_type = Object)]
    pub payload: Value,
    #[serde(default)]
    pub options: Option<ReportOptions>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocumentResponse {
    pub report_type: ReportType,
    pub filename: String,
    pub file_path: Option<String>,
    pub size: usize,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
    /// PDF bytes, base64-encoded.
    pub content: String,
    pub metadata: ReportMetadataResponse,
}

fn error_response(err: &ReportError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        log::error!("Report request failed: {}", err);
    }
    HttpResponse::build(status).json(ErrorResponse::new(err.error_code(), &err.to_string()))
}

fn parse_report_type(raw: &str) -> Result<ReportType, HttpResponse> {
    raw.parse::<ReportType>().map_err(|err| error_response(&err))
}

#[utoipa::path(
    get,
    path = "/api/reports/types",
    tag = "Reports",
    responses(
        (status = 200, description = "Report types with a working template", body = Vec<ReportTypeInfo>)
    )
)]
pub async fn list_report_types(manager: web::Data<ReportManager>) -> impl Responder {
    let types: Vec<ReportTypeInfo> = manager
        .list_available_report_types()
        .into_iter()
        .map(|report_type| ReportTypeInfo {
            report_type,
            metadata: manager.get_metadata(report_type).into(),
        })
        .collect();
    HttpResponse::Ok().json(types)
}

#[utoipa::path(
    get,
    path = "/api/reports/{report_type}/metadata",
    tag = "Reports",
    params(
        ("report_type" = String, Path, description = "Report type, e.g. student-report-card")
    ),
    responses(
        (status = 200, description = "Report metadata", body = ReportMetadataResponse),
        (status = 404, description = "Unknown report type", body = ErrorResponse)
    )
)]
pub async fn get_report_metadata(
    manager: web::Data<ReportManager>,
    path: web::Path<String>,
) -> impl Responder {
    match manager.metadata_for(&path.into_inner()) {
        Ok(meta) => HttpResponse::Ok().json(ReportMetadataResponse::from(meta)),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/reports/{report_type}",
    tag = "Reports",
    params(
        ("report_type" = String, Path, description = "Report type to generate")
    ),
    request_body = GenerateReportBody,
    responses(
        (status = 200, description = "Generated PDF", content_type = "application/pdf"),
        (status = 400, description = "Invalid payload or options", body = ErrorResponse),
        (status = 404, description = "Unknown report type", body = ErrorResponse),
        (status = 501, description = "Report type not implemented", body = ErrorResponse),
        (status = 500, description = "Rendering failed", body = ErrorResponse)
    )
)]
pub async fn generate_report(
    manager: web::Data<ReportManager>,
    path: web::Path<String>,
    body: web::Json<GenerateReportBody>,
) -> impl Responder {
    let report_type = match parse_report_type(&path.into_inner()) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let body = body.into_inner();

    match manager
        .generate(report_type, &body.payload, body.options.as_ref())
        .await
    {
        Ok(result) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", result.filename),
            ))
            .body(result.buffer),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/reports/{report_type}/preview",
    tag = "Reports",
    params(
        ("report_type" = String, Path, description = "Report type to preview")
    ),
    request_body = GenerateReportBody,
    responses(
        (status = 200, description = "Rendered HTML", content_type = "text/html"),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "Unknown report type", body = ErrorResponse),
        (status = 501, description = "Report type not implemented", body = ErrorResponse)
    )
)]
pub async fn preview_report(
    manager: web::Data<ReportManager>,
    path: web::Path<String>,
    body: web::Json<GenerateReportBody>,
) -> impl Responder {
    let report_type = match parse_report_type(&path.into_inner()) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match manager.preview_html(report_type, &body.payload) {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/reports/{report_type}/document",
    tag = "Reports",
    params(
        ("report_type" = String, Path, description = "Report type to generate")
    ),
    request_body = GenerateReportBody,
    responses(
        (status = 200, description = "Generated PDF with metadata", body = ReportDocumentResponse),
        (status = 400, description = "Invalid payload or options", body = ErrorResponse),
        (status = 404, description = "Unknown report type", body = ErrorResponse),
        (status = 501, description = "Report type not implemented", body = ErrorResponse),
        (status = 500, description = "Rendering failed", body = ErrorResponse)
    )
)]
pub async fn generate_report_document(
    manager: web::Data<ReportManager>,
    path: web::Path<String>,
    body: web::Json<GenerateReportBody>,
) -> impl Responder {
    let report_type = match parse_report_type(&path.into_inner()) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let body = body.into_inner();

    match manager
        .generate_with_metadata(report_type, &body.payload, body.options.as_ref())
        .await
    {
        Ok(doc) => HttpResponse::Ok().json(ReportDocumentResponse {
            report_type: doc.report_type,
            content: STANDARD.encode(&doc.result.buffer),
            filename: doc.result.filename,
            file_path: doc.result.file_path,
            size: doc.result.size,
            generated_at: doc.result.generated_at.to_rfc3339(),
            persist_error: doc.result.persist_error,
            metadata: doc.metadata.into(),
        }),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/api/reports/config",
    tag = "Reports",
    responses(
        (status = 200, description = "Current report configuration", body = ReportConfig)
    )
)]
pub async fn get_report_config(manager: web::Data<ReportManager>) -> impl Responder {
    HttpResponse::Ok().json(manager.get_config())
}

#[utoipa::path(
    put,
    path = "/api/reports/config",
    tag = "Reports",
    request_body = ReportConfigUpdate,
    responses(
        (status = 200, description = "Updated report configuration", body = ReportConfig),
        (status = 400, description = "Invalid update, configuration unchanged", body = ErrorResponse)
    )
)]
pub async fn update_report_config(
    manager: web::Data<ReportManager>,
    item: web::Json<ReportConfigUpdate>,
) -> impl Responder {
    match manager.update_config(item.into_inner()) {
        Ok(config) => HttpResponse::Ok().json(config),
        Err(err) => error_response(&err),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reports/types").route(web::get().to(list_report_types)),
    )
    .service(
        web::resource("/reports/config")
            .route(web::get().to(get_report_config))
            .route(web::put().to(update_report_config)),
    )
    .service(
        web::resource("/reports/{report_type}/metadata")
            .route(web::get().to(get_report_metadata)),
    )
    .service(
        web::resource("/reports/{report_type}/preview").route(web::post().to(preview_report)),
    )
    .service(
        web::resource("/reports/{report_type}/document")
            .route(web::post().to(generate_report_document)),
    )
    .service(web::resource("/reports/{report_type}").route(web::post().to(generate_report)));
}
