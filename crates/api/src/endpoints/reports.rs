//! Report endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
};
use greenwatch_common::{AppError, AppResult};
use greenwatch_core::report::{SubmitReportInput, UploadedPhoto};
use greenwatch_db::{entities::report::ReportStatus, repositories::ReportFilter};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, ReportView},
};

/// Query parameters for the report listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// 1-indexed page number.
    pub page: Option<u64>,
    pub status: Option<ReportStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// One page of reports.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListResponse {
    pub reports: Vec<ReportView>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// Submit a new report (multipart: text fields plus an optional photo).
async fn submit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<ReportView>> {
    let mut title = None;
    let mut description = None;
    let mut category = None;
    let mut latitude = None;
    let mut longitude = None;
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        match name.as_str() {
            "title" => title = Some(read_text(field, "title").await?),
            "description" => description = Some(read_text(field, "description").await?),
            "category" => category = Some(read_text(field, "category").await?),
            "latitude" => latitude = Some(read_coord(field, "latitude").await?),
            "longitude" => longitude = Some(read_coord(field, "longitude").await?),
            "photo" => {
                let file_name = field.file_name().unwrap_or("photo").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read photo: {e}")))?;
                photo = Some(UploadedPhoto {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let input = SubmitReportInput {
        title: title.ok_or_else(|| AppError::Validation("title is required".to_string()))?,
        description: description
            .ok_or_else(|| AppError::Validation("description is required".to_string()))?,
        category: category
            .ok_or_else(|| AppError::Validation("category is required".to_string()))?,
        latitude,
        longitude,
    };

    let report = state.report_service.submit(&user.id, input, photo).await?;

    Ok(ApiResponse::ok(report.into()))
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("failed to read {name}: {e}")))
}

async fn read_coord(field: axum::extract::multipart::Field<'_>, name: &str) -> AppResult<f64> {
    let text = read_text(field, name).await?;
    text.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{name} must be a number")))
}

/// List reports, newest first.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<ReportListResponse>> {
    let filter = ReportFilter {
        status: query.status,
        category: query.category,
        search: query.search,
    };

    let page = state
        .report_service
        .list(&filter, query.page.unwrap_or(1))
        .await?;

    Ok(ApiResponse::ok(ReportListResponse {
        total_pages: page.total_pages(),
        reports: page.reports.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Fetch one report.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state.report_service.get(&id).await?;
    Ok(ApiResponse::ok(report.into()))
}

/// Moderation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateRequest {
    pub status: ReportStatus,
}

/// Change a report's status. Authority, NGO and admin roles only.
async fn moderate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ModerateRequest>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state
        .report_service
        .moderate(&user, &id, req.status)
        .await?;

    Ok(ApiResponse::ok(report.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit).get(list))
        .route("/{id}", get(show))
        .route("/{id}/status", post(moderate))
}
