//! Request handlers for the Bespoke Model API.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ModelError;
use crate::excel::reader::{has_allowed_extension, FILL_EXTENSIONS, PROJECTION_EXTENSIONS};
use crate::excel::{generate_model, generate_projection};
use crate::types::ProjectionReport;

use super::server::AppState;

/// Error payload; every failure maps to an HTTP status plus this body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Wrapper turning `ModelError` into an HTTP response at the request boundary.
pub struct ApiError(ModelError);

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ModelError::Input(_) => StatusCode::BAD_REQUEST,
            ModelError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = ErrorResponse {
            success: false,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// GET / - service info
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub status: String,
    pub template_exists: bool,
}

pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(RootResponse {
        name: "Bespoke Financial Model API".to_string(),
        version: state.version.clone(),
        status: "running".to_string(),
        template_exists: state.config.template_path.exists(),
    })
}

/// GET /health
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// GET /version
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(VersionResponse {
        version: state.version.clone(),
        features: vec!["process".to_string(), "project".to_string()],
    })
}

/// A validated multipart upload.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Pull the `file` field out of a multipart body and run the shared checks:
/// filename present, extension allowed, body non-empty.
async fn read_upload(mut multipart: Multipart, allowed: &[&str]) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ModelError::Input(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ModelError::Input("No filename provided".to_string()))?;

        if !has_allowed_extension(&filename, allowed) {
            return Err(ModelError::Input(format!(
                "Invalid file type '{}'. Supported extensions: {}",
                filename,
                allowed.join(", ")
            ))
            .into());
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ModelError::Input(format!("Failed to read upload: {}", e)))?
            .to_vec();
        if bytes.is_empty() {
            return Err(ModelError::Input("Uploaded file is empty".to_string()).into());
        }

        return Ok(Upload { filename, bytes });
    }

    Err(ModelError::Input("No file provided".to_string()).into())
}

/// Stash the upload in the temp dir so the spreadsheet readers can open it
/// by path. Keeps the original extension so format detection works.
fn stage_upload(state: &AppState, upload: &Upload) -> Result<std::path::PathBuf, ApiError> {
    let ext = std::path::Path::new(&upload.filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("xlsx")
        .to_ascii_lowercase();
    let staged = state
        .config
        .temp_dir
        .join(format!("upload_{}.{}", Uuid::new_v4(), ext));
    std::fs::write(&staged, &upload.bytes).map_err(ModelError::from)?;
    Ok(staged)
}

/// POST /api/process - fill the Bespoke Model from a sales input sheet
#[derive(Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub download_filename: String,
    pub message: String,
}

pub async fn process(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let upload = read_upload(multipart, FILL_EXTENSIONS).await?;
    info!(
        "Processing input sheet: {} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    let staged = stage_upload(&state, &upload)?;

    let template_ext = state
        .config
        .template_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("xlsm");
    let output_filename = format!(
        "Bespoke Model_{}.{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        template_ext
    );
    let output_path = state.config.temp_dir.join(&output_filename);

    let result = generate_model(&staged, &state.config.template_path, &output_path);
    let _ = std::fs::remove_file(&staged);
    result?;

    info!("Generated model: {}", output_filename);
    Ok(Json(ProcessResponse {
        success: true,
        download_filename: output_filename,
        message: "Bespoke Model generated successfully".to_string(),
    }))
}

/// POST /api/project - ten-year projection from tabular building data
#[derive(Serialize)]
pub struct ProjectResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ProjectionReport,
    pub download_filename: String,
    pub message: String,
}

pub async fn project(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProjectResponse>, ApiError> {
    let upload = read_upload(multipart, PROJECTION_EXTENSIONS).await?;
    info!(
        "Projecting from: {} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    let staged = stage_upload(&state, &upload)?;

    let output_filename = format!(
        "ROI Projection_{}.xlsx",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let output_path = state.config.temp_dir.join(&output_filename);

    let result = generate_projection(&staged, &output_path);
    let _ = std::fs::remove_file(&staged);
    let report = result?;

    info!("Generated projection workbook: {}", output_filename);
    Ok(Json(ProjectResponse {
        success: true,
        report,
        download_filename: output_filename,
        message: "Projection generated successfully".to_string(),
    }))
}

/// Reject anything that could escape the temp directory.
pub fn validate_download_filename(filename: &str) -> Result<(), ModelError> {
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
    {
        return Err(ModelError::Input("Invalid filename".to_string()));
    }
    Ok(())
}

fn content_type_for(filename: &str) -> &'static str {
    if filename.to_ascii_lowercase().ends_with(".xlsm") {
        "application/vnd.ms-excel.sheet.macroEnabled.12"
    } else {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    }
}

/// GET /api/download/:filename - fetch a generated file from the temp dir
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    validate_download_filename(&filename)?;

    let path = state.config.temp_dir.join(&filename);
    if !path.exists() {
        return Err(ModelError::NotFound("File not found or has expired".to_string()).into());
    }

    let bytes = std::fs::read(&path).map_err(ModelError::from)?;
    info!("Downloading file: {}", filename);

    let headers = [
        (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, bytes).into_response())
}
