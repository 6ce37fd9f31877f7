//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use greenwatch_db::entities::{report, user};
use serde::Serialize;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.error.is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::OK
        };
        (status, Json(self)).into_response()
    }
}

/// Public view of a user. The password hash never leaves the entity, but
/// this view also drops contact details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub role: user::Role,
    pub location: Option<String>,
    pub points: i32,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
            location: user.location,
            points: user.points,
            created_at: user.created_at,
        }
    }
}

/// Public view of a report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub predicted_category: Option<String>,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: report::ReportStatus,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<report::Model> for ReportView {
    fn from(report: report::Model) -> Self {
        Self {
            id: report.id,
            user_id: report.user_id,
            title: report.title,
            description: report.description,
            category: report.category,
            predicted_category: report.predicted_category,
            image_url: report.image_url,
            latitude: report.latitude,
            longitude: report.longitude,
            status: report.status,
            created_at: report.created_at,
        }
    }
}
