//! Single-entity lookups

use super::PgDocumentRepository;
use crate::document::models::{Client, Company, PaymentReceipt, PaymentRequest, Project, Unit};

impl PgDocumentRepository {
    pub async fn fetch_client(&self, id: i64) -> Result<Option<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            "SELECT id, name, email, phone, address, pan_no, aadhaar_no FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn fetch_project(&self, id: i64) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, address, description, start_date, end_date, budget, status
            FROM projects WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn fetch_unit(&self, id: i64) -> Result<Option<Unit>, sqlx::Error> {
        sqlx::query_as::<_, Unit>(
            r#"
            SELECT id, project_id, client_id, flat_no, flat_type, floor_no, area_sqft, flat_value, status
            FROM units WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn fetch_company(&self, id: i64) -> Result<Option<Company>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, address, phone, email, gstin, website, letterhead_path
            FROM companies WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn fetch_payment_request(
        &self,
        id: i64,
    ) -> Result<Option<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            SELECT id, client_id, project_id, unit_id, description, amount, request_date, due_date, status
            FROM payment_requests WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn fetch_payment_receipt(
        &self,
        id: i64,
    ) -> Result<Option<PaymentReceipt>, sqlx::Error> {
        sqlx::query_as::<_, PaymentReceipt>(
            r#"
            SELECT id, client_id, project_id, unit_id, description, amount, receipt_date, payment_method, reference_no
            FROM payment_receipts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
