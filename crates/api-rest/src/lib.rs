//! # API REST
//!
//! REST API implementation for the forms service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, PDF download headers, CORS)
//!
//! Uses `api-shared` for transport types and `forms-core` for everything else.

#![warn(rust_2018_idioms)]

use api_shared::{ErrorRes, HealthRes, HealthService, ListParams};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use forms_core::{
    BulkReport, BulkRowError, CoreConfig, DocumentId, DocumentKind, FormDocument, FormService,
    FormsError, GeneratedDocument, ListQuery, Medication, NomncNotice, OutputSpool,
    PatientConsent, SocPacket,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Request bodies carry base64 signatures and bulk imports, so the default limit is raised.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Header carrying the id of the document a PDF was rendered from.
pub const DOCUMENT_ID_HEADER: &str = "x-document-id";

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorRes>);

/// Application state for the REST API server.
///
/// One service per form kind, plus the spool rendered PDFs pass through.
#[derive(Clone)]
pub struct AppState {
    spool: OutputSpool,
    soc: FormService<SocPacket>,
    nomnc: FormService<NomncNotice>,
    consent: FormService<PatientConsent>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            spool: OutputSpool::from_config(&cfg),
            soc: FormService::new(cfg.clone()),
            nomnc: FormService::new(cfg.clone()),
            consent: FormService::new(cfg),
        }
    }
}

/// Runs `$body` with `$service` bound to the form service for `$kind`.
macro_rules! with_service {
    ($state:expr, $kind:expr, $service:ident => $body:expr) => {
        match $kind {
            DocumentKind::Soc => {
                let $service = &$state.soc;
                $body
            }
            DocumentKind::Nomnc => {
                let $service = &$state.nomnc;
                $body
            }
            DocumentKind::Consent => {
                let $service = &$state.consent;
                $body
            }
        }
    };
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_document,
        list_documents,
        bulk_create,
        get_document,
        update_document,
        download_pdf,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        SocPacket,
        Medication,
        NomncNotice,
        PatientConsent,
        BulkReport,
        BulkRowError,
    ))
)]
pub struct ApiDoc;

/// Builds the application router with Swagger UI and a permissive CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/:kind", get(list_documents).post(create_document))
        .route("/api/:kind/bulk", post(bulk_create))
        .route("/api/:kind/:id", get(get_document).put(update_document))
        .route("/api/:kind/:id/pdf", get(download_pdf))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/{kind}",
    params(("kind" = String, Path, description = "Form kind: soc, nomnc or consent")),
    request_body(
        content = Object,
        description = "Form fields: SocPacket, NomncNotice or PatientConsent depending on kind"
    ),
    responses(
        (status = 200, description = "Document stored and rendered", content_type = "application/pdf"),
        (status = 400, description = "Missing required fields or invalid input", body = ErrorRes),
        (status = 404, description = "Unknown form kind", body = ErrorRes),
        (status = 500, description = "Template missing or render failure", body = ErrorRes)
    )
)]
/// Create a document and return its rendered PDF.
///
/// The new document id is returned in the `X-Document-Id` header.
#[axum::debug_handler]
async fn create_document(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let body = extract_json(body)?;
    with_service!(state, kind, service => {
        let data = deserialize_form(body)?;
        let generated = service.generate(data).map_err(api_error)?;
        pdf_response(&state.spool, generated)
    })
}

#[utoipa::path(
    get,
    path = "/api/{kind}",
    params(
        ("kind" = String, Path, description = "Form kind: soc, nomnc or consent"),
        ListParams
    ),
    responses(
        (status = 200, description = "Page of stored documents: { items, total, page, limit, totalPages }"),
        (status = 404, description = "Unknown form kind", body = ErrorRes)
    )
)]
/// List stored documents, newest first.
#[axum::debug_handler]
async fn list_documents(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let query = ListQuery {
        page: params.page,
        limit: params.limit,
        search: params.search,
    };
    Ok(with_service!(state, kind, service => Json(service.list(&query)).into_response()))
}

#[utoipa::path(
    post,
    path = "/api/{kind}/bulk",
    params(("kind" = String, Path, description = "Form kind: soc, nomnc or consent")),
    request_body(content = Vec<Object>, description = "One form object per row"),
    responses(
        (status = 200, description = "Rows imported; failures listed per row", body = BulkReport),
        (status = 400, description = "Empty or oversized request", body = ErrorRes),
        (status = 404, description = "Unknown form kind", body = ErrorRes)
    )
)]
/// Import many documents at once. Failing rows do not fail the request.
#[axum::debug_handler]
async fn bulk_create(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    rows: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Json<BulkReport>, ApiError> {
    let kind = parse_kind(&kind)?;
    let rows = extract_json(rows)?;
    let report = with_service!(state, kind, service => service.bulk_create(rows));
    report.map(Json).map_err(api_error)
}

#[utoipa::path(
    get,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Form kind: soc, nomnc or consent"),
        ("id" = String, Path, description = "Document id (32 lowercase hex characters)")
    ),
    responses(
        (status = 200, description = "Stored document with id, createdAt and updatedAt"),
        (status = 400, description = "Invalid document id", body = ErrorRes),
        (status = 404, description = "Document not found", body = ErrorRes)
    )
)]
/// Fetch a stored document.
#[axum::debug_handler]
async fn get_document(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    with_service!(state, kind, service => {
        let document = service.get(id).map_err(api_error)?;
        Ok(Json(document).into_response())
    })
}

#[utoipa::path(
    put,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Form kind: soc, nomnc or consent"),
        ("id" = String, Path, description = "Document id (32 lowercase hex characters)")
    ),
    request_body(content = Object, description = "Fields to overwrite; other fields are kept"),
    responses(
        (status = 200, description = "Document updated and re-rendered", content_type = "application/pdf"),
        (status = 400, description = "Invalid id, invalid input or missing required fields", body = ErrorRes),
        (status = 404, description = "Document not found", body = ErrorRes),
        (status = 500, description = "Template missing or render failure", body = ErrorRes)
    )
)]
/// Merge changes into a stored document and return the re-rendered PDF.
#[axum::debug_handler]
async fn update_document(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    patch: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let patch = extract_json(patch)?;
    with_service!(state, kind, service => {
        let generated = service.update(id, patch).map_err(api_error)?;
        pdf_response(&state.spool, generated)
    })
}

#[utoipa::path(
    get,
    path = "/api/{kind}/{id}/pdf",
    params(
        ("kind" = String, Path, description = "Form kind: soc, nomnc or consent"),
        ("id" = String, Path, description = "Document id (32 lowercase hex characters)")
    ),
    responses(
        (status = 200, description = "Rendered PDF", content_type = "application/pdf"),
        (status = 400, description = "Invalid document id", body = ErrorRes),
        (status = 404, description = "Document not found", body = ErrorRes),
        (status = 500, description = "Template missing or render failure", body = ErrorRes)
    )
)]
/// Render a stored document again.
#[axum::debug_handler]
async fn download_pdf(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    with_service!(state, kind, service => {
        let generated = service.render(id).map_err(api_error)?;
        pdf_response(&state.spool, generated)
    })
}

fn parse_kind(raw: &str) -> Result<DocumentKind, ApiError> {
    raw.parse().map_err(|_| {
        tracing::error!("Unknown form kind: {}", raw);
        (
            StatusCode::NOT_FOUND,
            Json(ErrorRes::new(format!("unknown form kind '{}'", raw))),
        )
    })
}

fn parse_id(raw: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw).map_err(|e| api_error(e.into()))
}

/// Unwraps an extracted JSON body, turning axum's rejection into a 400 `ErrorRes`.
fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| api_error(FormsError::InvalidInput(rejection.body_text())))
}

fn deserialize_form<T: FormDocument>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| api_error(FormsError::InvalidInput(e.to_string())))
}

/// Maps a core error onto a status code and JSON body, logging it.
///
/// Server-side failures get a generic message; details stay in the log.
fn api_error(e: FormsError) -> ApiError {
    tracing::error!("Request error: {:?}", e);
    let message = e.to_string();
    match e {
        FormsError::MissingFields(fields) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::missing(
                message,
                fields.into_iter().map(String::from).collect(),
            )),
        ),
        FormsError::InvalidInput(_) | FormsError::InvalidId(_) => {
            (StatusCode::BAD_REQUEST, Json(ErrorRes::new(message)))
        }
        FormsError::NotFound { .. } => (StatusCode::NOT_FOUND, Json(ErrorRes::new(message))),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorRes::new("Internal error")),
        ),
    }
}

/// Spools the PDF, schedules its removal and builds the attachment response.
fn pdf_response<T>(spool: &OutputSpool, generated: GeneratedDocument<T>) -> Result<Response, ApiError> {
    let GeneratedDocument {
        document,
        pdf,
        file_name,
    } = generated;

    let path = spool.write(document.id, &file_name, &pdf).map_err(api_error)?;
    schedule_removal(path, spool.ttl());

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
        (
            HeaderName::from_static(DOCUMENT_ID_HEADER),
            document.id.to_string(),
        ),
    ];
    Ok((headers, pdf).into_response())
}

fn schedule_removal(path: PathBuf, ttl: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        OutputSpool::remove(&path);
    });
}
