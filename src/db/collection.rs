//! Ordered collections listed in documents

use super::{CollectionScope, PgDocumentRepository};
use crate::document::models::{
    CustomerSchedule, PaymentReceipt, PaymentRequest, PendingPayment, ProjectMilestone,
};

impl PgDocumentRepository {
    pub async fn fetch_project_milestones(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectMilestone>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMilestone>(
            r#"
            SELECT id, project_id, sr_no, name, description, completion_percentage, status, target_date
            FROM project_milestones
            WHERE project_id = $1
            ORDER BY sr_no NULLS LAST, id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn fetch_customer_schedules(
        &self,
        unit_id: i64,
    ) -> Result<Vec<CustomerSchedule>, sqlx::Error> {
        sqlx::query_as::<_, CustomerSchedule>(
            r#"
            SELECT id, unit_id, sr_no, description, percentage, amount, due_date, status
            FROM customer_schedules
            WHERE unit_id = $1
            ORDER BY sr_no NULLS LAST, id
            "#,
        )
        .bind(unit_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Payment lists keep insertion order so indexed placeholders stay stable
    /// when a record is back-dated.
    pub async fn fetch_payment_requests(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            SELECT id, client_id, project_id, unit_id, description, amount, request_date, due_date, status
            FROM payment_requests
            WHERE ($1::bigint IS NULL OR client_id = $1)
              AND ($2::bigint IS NULL OR project_id = $2)
              AND ($3::bigint IS NULL OR unit_id = $3)
            ORDER BY id
            "#,
        )
        .bind(scope.client_id)
        .bind(scope.project_id)
        .bind(scope.unit_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn fetch_payment_receipts(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PaymentReceipt>, sqlx::Error> {
        sqlx::query_as::<_, PaymentReceipt>(
            r#"
            SELECT id, client_id, project_id, unit_id, description, amount, receipt_date, payment_method, reference_no
            FROM payment_receipts
            WHERE ($1::bigint IS NULL OR client_id = $1)
              AND ($2::bigint IS NULL OR project_id = $2)
              AND ($3::bigint IS NULL OR unit_id = $3)
            ORDER BY id
            "#,
        )
        .bind(scope.client_id)
        .bind(scope.project_id)
        .bind(scope.unit_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Requests that are not fully paid yet.
    pub async fn fetch_pending_payments(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PendingPayment>, sqlx::Error> {
        sqlx::query_as::<_, PendingPayment>(
            r#"
            SELECT id, description, amount, due_date, status
            FROM payment_requests
            WHERE LOWER(status) <> 'paid'
              AND ($1::bigint IS NULL OR client_id = $1)
              AND ($2::bigint IS NULL OR project_id = $2)
              AND ($3::bigint IS NULL OR unit_id = $3)
            ORDER BY id
            "#,
        )
        .bind(scope.client_id)
        .bind(scope.project_id)
        .bind(scope.unit_id)
        .fetch_all(&self.pool)
        .await
    }
}
