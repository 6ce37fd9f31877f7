//! Report service: submission, classification, listing and moderation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use greenwatch_classifier::Classifier;
use greenwatch_common::{
    AppError, AppResult, ClassifierConfig, StorageBackend, generate_storage_key,
};
use greenwatch_db::{
    entities::{report, report::ReportStatus, user, user::Role},
    repositories::{ReportFilter, ReportPage, ReportRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Points credited to the reporter for each accepted submission.
pub const SUBMISSION_AWARD: i32 = 10;

/// Reports per listing page.
pub const PAGE_SIZE: u64 = 10;

/// Input for submitting a report. The photo travels separately as raw bytes.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 8192))]
    pub description: String,
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// An uploaded photo, decoded from the multipart request.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Aggregate report counts for the dashboard.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total: u64,
    pub pending: u64,
    pub verified: u64,
    pub rejected: u64,
}

/// Report service.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    storage: Arc<dyn StorageBackend>,
    classifier: Option<Arc<Classifier>>,
    categories: Vec<String>,
    inference_timeout: Duration,
}

impl ReportService {
    /// Create a new report service.
    ///
    /// `classifier` is `None` when no model is configured; submissions then
    /// skip classification entirely and land as pending.
    #[must_use]
    pub fn new(
        report_repo: ReportRepository,
        storage: Arc<dyn StorageBackend>,
        classifier: Option<Arc<Classifier>>,
        config: &ClassifierConfig,
    ) -> Self {
        Self {
            report_repo,
            storage,
            classifier,
            categories: config.labels.clone(),
            inference_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Submit a report on behalf of a user.
    ///
    /// The report row and the reporter's points credit are written in one
    /// transaction. Classification runs first and is advisory: any failure
    /// (no model, bad image, timeout) downgrades the report to pending
    /// instead of failing the submission.
    pub async fn submit(
        &self,
        user_id: &str,
        input: SubmitReportInput,
        photo: Option<UploadedPhoto>,
    ) -> AppResult<report::Model> {
        input.validate()?;

        if !self.categories.contains(&input.category) {
            return Err(AppError::Validation(format!(
                "unknown category: {}",
                input.category
            )));
        }

        let stored = match &photo {
            Some(photo) => {
                let key = generate_storage_key(user_id, &photo.file_name);
                let blob = self
                    .storage
                    .upload(&key, &photo.bytes, &photo.content_type)
                    .await?;
                Some((key, blob.url))
            }
            None => None,
        };
        let image_url = stored.as_ref().map(|(_, url)| url.clone());

        let predicted_category = match &photo {
            Some(photo) => self.classify(&photo.bytes).await,
            None => None,
        };

        let status = resolve_status(predicted_category.as_deref(), &input.category);

        let report_id = crate::generate_id();
        let model = report::ActiveModel {
            id: Set(report_id.clone()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            predicted_category: Set(predicted_category),
            image_url: Set(image_url),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            status: Set(status),
            created_at: Set(Utc::now().into()),
        };

        let report = match self
            .report_repo
            .create_with_award(model, user_id, SUBMISSION_AWARD)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                // The blob is already on disk; remove it so a failed insert
                // does not leave an orphan behind.
                if let Some((key, _)) = &stored
                    && let Err(cleanup) = self.storage.delete(key).await
                {
                    tracing::warn!(error = %cleanup, key = %key, "orphaned upload not removed");
                }
                return Err(e);
            }
        };

        tracing::info!(
            report_id = %report.id,
            user_id = user_id,
            status = ?report.status,
            "report submitted"
        );

        Ok(report)
    }

    /// Run the classifier on a blocking thread with a deadline.
    ///
    /// Returns `None` on every failure path; the cause is logged, not
    /// surfaced.
    async fn classify(&self, image_bytes: &[u8]) -> Option<String> {
        let classifier = self.classifier.clone()?;
        let bytes = image_bytes.to_vec();

        let task = tokio::task::spawn_blocking(move || classifier.classify(&bytes));

        match tokio::time::timeout(self.inference_timeout, task).await {
            Ok(Ok(Ok(prediction))) => {
                tracing::debug!(
                    label = %prediction.label,
                    confidence = prediction.confidence,
                    "image classified"
                );
                Some(prediction.label)
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, "classification failed");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "classification task panicked");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.inference_timeout.as_secs(),
                    "classification timed out"
                );
                None
            }
        }
    }

    /// Fetch a single report.
    pub async fn get(&self, report_id: &str) -> AppResult<report::Model> {
        self.report_repo.get_by_id(report_id).await
    }

    /// List reports newest-first, filtered and paginated.
    pub async fn list(&self, filter: &ReportFilter, page: u64) -> AppResult<ReportPage> {
        let page = page.max(1);
        self.report_repo.list(filter, page, PAGE_SIZE).await
    }

    /// Most recent reports submitted by a user.
    pub async fn recent_by_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<report::Model>> {
        self.report_repo.find_recent_by_user(user_id, limit).await
    }

    /// Most recent verified reports, for the public landing page.
    pub async fn recent_verified(&self, limit: u64) -> AppResult<Vec<report::Model>> {
        self.report_repo
            .find_recent_by_status(ReportStatus::Verified, limit)
            .await
    }

    /// Change a report's moderation status.
    ///
    /// Only authority, NGO and admin accounts may moderate.
    pub async fn moderate(
        &self,
        moderator: &user::Model,
        report_id: &str,
        status: ReportStatus,
    ) -> AppResult<report::Model> {
        if !matches!(moderator.role, Role::Authority | Role::Ngo | Role::Admin) {
            return Err(AppError::Unauthorized);
        }

        let report = self.report_repo.get_by_id(report_id).await?;
        let mut active: report::ActiveModel = report.into();
        active.status = Set(status);
        let updated = self.report_repo.update(active).await?;

        tracing::info!(
            report_id = report_id,
            moderator_id = %moderator.id,
            status = ?status,
            "report moderated"
        );

        Ok(updated)
    }

    /// Aggregate counts for the dashboard.
    pub async fn stats(&self) -> AppResult<ReportStats> {
        let total = self.report_repo.count().await?;
        let pending = self.report_repo.count_by_status(ReportStatus::Pending).await?;
        let verified = self
            .report_repo
            .count_by_status(ReportStatus::Verified)
            .await?;
        let rejected = self
            .report_repo
            .count_by_status(ReportStatus::Rejected)
            .await?;

        Ok(ReportStats {
            total,
            pending,
            verified,
            rejected,
        })
    }

    /// The category labels accepted at submission.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

/// A report is verified when the classifier agrees with the reporter's
/// category choice; everything else waits for a moderator.
fn resolve_status(predicted: Option<&str>, category: &str) -> ReportStatus {
    match predicted {
        Some(predicted) if predicted == category => ReportStatus::Verified,
        _ => ReportStatus::Pending,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use greenwatch_common::StoredBlob;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    /// Storage stub that records nothing and never touches disk.
    struct NullStorage;

    #[async_trait::async_trait]
    impl StorageBackend for NullStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<StoredBlob> {
            Ok(StoredBlob {
                key: key.to_string(),
                url: format!("/files/{key}"),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, _key: &str) -> AppResult<()> {
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/files/{key}")
        }

        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Ok(false)
        }
    }

    /// Storage stub that remembers which keys were deleted.
    #[derive(Default)]
    struct RecordingStorage {
        deleted: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl StorageBackend for RecordingStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<StoredBlob> {
            Ok(StoredBlob {
                key: key.to_string(),
                url: format!("/files/{key}"),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/files/{key}")
        }

        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Ok(false)
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> ReportService {
        ReportService::new(
            ReportRepository::new(Arc::new(db)),
            Arc::new(NullStorage),
            None,
            &ClassifierConfig::default(),
        )
    }

    fn submitted_report(status: ReportStatus) -> report::Model {
        report::Model {
            id: "report1".to_string(),
            user_id: "user1".to_string(),
            title: "Trash by the river".to_string(),
            description: "Several bags dumped near the footbridge".to_string(),
            category: "garbage".to_string(),
            predicted_category: None,
            image_url: None,
            latitude: None,
            longitude: None,
            status,
            created_at: Utc::now().into(),
        }
    }

    fn valid_input() -> SubmitReportInput {
        SubmitReportInput {
            title: "Trash by the river".to_string(),
            description: "Several bags dumped near the footbridge".to_string(),
            category: "garbage".to_string(),
            latitude: Some(48.2),
            longitude: Some(16.37),
        }
    }

    fn moderator(role: Role) -> user::Model {
        user::Model {
            id: "mod1".to_string(),
            name: "mod".to_string(),
            email: Some("mod@example.com".to_string()),
            phone: None,
            password_hash: "$argon2id$stub".to_string(),
            role,
            location: None,
            points: 0,
            badges: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_submit_unknown_category_is_validation_error() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let mut input = valid_input();
        input.category = "volcanoes".to_string();

        let result = svc.submit("user1", input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_without_photo_lands_pending() {
        // Insert inside the transaction, then the points credit.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[submitted_report(ReportStatus::Pending)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let svc = service(db);

        let report = svc.submit("user1", valid_input(), None).await.unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
        assert!(report.predicted_category.is_none());
    }

    #[tokio::test]
    async fn test_submit_insert_failure_removes_uploaded_photo() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("insert failed".to_string())])
            .into_connection();

        let storage = Arc::new(RecordingStorage::default());
        let svc = ReportService::new(
            ReportRepository::new(Arc::new(db)),
            storage.clone(),
            None,
            &ClassifierConfig::default(),
        );

        let photo = UploadedPhoto {
            file_name: "dump.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1, 2, 3],
        };

        let result = svc.submit("user1", valid_input(), Some(photo)).await;
        assert!(result.is_err());

        let deleted = storage.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].ends_with(".jpg"));
    }

    #[test]
    fn test_status_verified_only_on_matching_prediction() {
        assert_eq!(
            resolve_status(Some("garbage"), "garbage"),
            ReportStatus::Verified
        );
        assert_eq!(
            resolve_status(Some("wildlife"), "garbage"),
            ReportStatus::Pending
        );
        assert_eq!(resolve_status(None, "garbage"), ReportStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_bad_coordinates_rejected() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let mut input = valid_input();
        input.latitude = Some(123.0);

        let result = svc.submit("user1", input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_moderate_requires_privileged_role() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let community = moderator(Role::Community);
        let result = svc
            .moderate(&community, "report1", ReportStatus::Verified)
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_moderate_updates_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[submitted_report(ReportStatus::Pending)]])
            .append_query_results([[submitted_report(ReportStatus::Verified)]])
            .into_connection();
        let svc = service(db);

        let authority = moderator(Role::Authority);
        let updated = svc
            .moderate(&authority, "report1", ReportStatus::Verified)
            .await
            .unwrap();

        assert_eq!(updated.status, ReportStatus::Verified);
    }
}
