//! Report repository.

use std::sync::Arc;

use crate::entities::{Report, report, report::ReportStatus, user};
use greenwatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, Func},
};

/// Optional filters for report listings. All filters are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub category: Option<String>,
    /// Case-insensitive substring match against description or category.
    pub search: Option<String>,
}

/// One page of a report listing.
#[derive(Debug, Clone)]
pub struct ReportPage {
    pub reports: Vec<report::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl ReportPage {
    /// Total number of pages for this listing.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page)
    }
}

/// Escape LIKE metacharacters in a user-supplied search term.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))
    }

    /// Insert a report and credit the submitting user in one transaction.
    ///
    /// Either both the report row and the points update land, or neither
    /// does. The points column is updated in place, never read-modify-write.
    pub async fn create_with_award(
        &self,
        model: report::ActiveModel,
        user_id: &str,
        points: i32,
    ) -> AppResult<report::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let report = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        user::Entity::update_many()
            .col_expr(
                user::Column::Points,
                Expr::col(user::Column::Points).add(points),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(report)
    }

    /// Update a report (moderation status changes).
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List reports newest-first, filtered and paginated.
    ///
    /// Pages are 1-indexed. A page past the end of the listing yields an
    /// empty page, not an error.
    pub async fn list(
        &self,
        filter: &ReportFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<ReportPage> {
        let mut query = Report::find().order_by_desc(report::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(report::Column::Status.eq(status));
        }
        if let Some(category) = &filter.category {
            query = query.filter(report::Column::Category.eq(category.as_str()));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(report::Column::Description)))
                            .like(pattern.clone()),
                    )
                    .add(Expr::expr(Func::lower(Expr::col(report::Column::Category))).like(pattern)),
            );
        }

        let paginator = query.paginate(self.db.as_ref(), per_page);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let reports = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ReportPage {
            reports,
            total,
            page,
            per_page,
        })
    }

    /// Most recent reports with the given status.
    pub async fn find_recent_by_status(
        &self,
        status: ReportStatus,
        limit: u64,
    ) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::Status.eq(status))
            .order_by_desc(report::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent reports submitted by a user.
    pub async fn find_recent_by_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::UserId.eq(user_id))
            .order_by_desc(report::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all reports.
    pub async fn count(&self) -> AppResult<u64> {
        Report::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports with the given status.
    pub async fn count_by_status(&self, status: ReportStatus) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports submitted by a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{ActiveValue::Set, DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_report(id: &str, user_id: &str) -> report::Model {
        report::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Overflowing bins at the river bank".to_string(),
            description: "Pile of household waste next to the footbridge".to_string(),
            category: "garbage".to_string(),
            predicted_category: Some("garbage".to_string()),
            image_url: Some("/files/2026/03/01/user1/photo.jpg".to_string()),
            latitude: Some(48.2082),
            longitude: Some(16.3738),
            status: ReportStatus::Verified,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_escape_like_metacharacters() {
        assert_eq!(escape_like("50%_done\\"), "50\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = ReportPage {
            reports: vec![],
            total: 21,
            page: 1,
            per_page: 10,
        };
        assert_eq!(page.total_pages(), 3);

        let empty = ReportPage {
            reports: vec![],
            total: 0,
            page: 1,
            per_page: 10,
        };
        assert_eq!(empty.total_pages(), 0);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::ReportNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected ReportNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_create_with_award_commits_insert_and_points() {
        let created = create_test_report("report1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let model = report::ActiveModel {
            id: Set(created.id.clone()),
            user_id: Set(created.user_id.clone()),
            title: Set(created.title.clone()),
            description: Set(created.description.clone()),
            category: Set(created.category.clone()),
            predicted_category: Set(created.predicted_category.clone()),
            image_url: Set(created.image_url.clone()),
            latitude: Set(created.latitude),
            longitude: Set(created.longitude),
            status: Set(created.status),
            created_at: Set(created.created_at),
        };

        let report = repo.create_with_award(model, "user1", 10).await.unwrap();
        assert_eq!(report.id, "report1");
    }

    #[tokio::test]
    async fn test_list_returns_page_with_totals() {
        let reports = vec![
            create_test_report("r2", "user1"),
            create_test_report("r1", "user2"),
        ];

        // Paginator issues a COUNT query first, then the page fetch.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit_count(12)]])
                .append_query_results([reports.clone()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let page = repo.list(&ReportFilter::default(), 1, 10).await.unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.reports.len(), 2);
        assert_eq!(page.reports[0].id, "r2");
    }

    #[tokio::test]
    async fn test_list_out_of_range_page_is_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit_count(2)]])
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let page = repo.list(&ReportFilter::default(), 5, 10).await.unwrap();

        assert!(page.reports.is_empty());
        assert_eq!(page.total, 2);
    }

    fn maplit_count(n: i64) -> std::collections::BTreeMap<String, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items".to_string(), sea_orm::Value::BigInt(Some(n)));
        row
    }
}
