//! Template queries

use super::PgDocumentRepository;
use crate::document::models::Template;

impl PgDocumentRepository {
    pub async fn fetch_template(&self, id: i64) -> Result<Option<Template>, sqlx::Error> {
        sqlx::query_as::<_, Template>(
            "SELECT id, name, content, created_at, updated_at FROM templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
