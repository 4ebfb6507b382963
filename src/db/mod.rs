//! Database module - AppState and the data access seam of the document engine.
//!
//! Queries are split by concern:
//! - `template` - document templates
//! - `entity` - client, project, unit and company lookups
//! - `collection` - the ordered collections a document can list

mod collection;
mod entity;
mod template;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::document::models::{
    Client, Company, CustomerSchedule, PaymentReceipt, PaymentRequest, PendingPayment, Project,
    ProjectMilestone, Template, Unit,
};
use crate::document::{DocumentService, DocumentSettings, PdfBackend, TypstRenderEngine};
use crate::storage::ObjectStorage;

/// Filter for the client-scoped collections. `None` fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionScope {
    pub client_id: Option<i64>,
    pub project_id: Option<i64>,
    pub unit_id: Option<i64>,
}

impl CollectionScope {
    /// No filter at all, which would list every record in the system.
    pub fn is_unbounded(&self) -> bool {
        self.client_id.is_none() && self.project_id.is_none() && self.unit_id.is_none()
    }
}

/// Read accessors the document engine needs. Lists come back in display order.
#[async_trait]
pub trait DocumentRepository {
    async fn get_template(&self, id: i64) -> Result<Option<Template>, sqlx::Error>;
    async fn get_client(&self, id: i64) -> Result<Option<Client>, sqlx::Error>;
    async fn get_project(&self, id: i64) -> Result<Option<Project>, sqlx::Error>;
    async fn get_unit(&self, id: i64) -> Result<Option<Unit>, sqlx::Error>;
    async fn get_company(&self, id: i64) -> Result<Option<Company>, sqlx::Error>;
    async fn list_project_milestones(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectMilestone>, sqlx::Error>;
    async fn list_customer_schedules(
        &self,
        unit_id: i64,
    ) -> Result<Vec<CustomerSchedule>, sqlx::Error>;
    async fn list_payment_requests(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PaymentRequest>, sqlx::Error>;
    async fn list_payment_receipts(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PaymentReceipt>, sqlx::Error>;
    async fn list_pending_payments(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PendingPayment>, sqlx::Error>;
    async fn get_payment_request(&self, id: i64) -> Result<Option<PaymentRequest>, sqlx::Error>;
    async fn get_payment_receipt(&self, id: i64) -> Result<Option<PaymentReceipt>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn get_template(&self, id: i64) -> Result<Option<Template>, sqlx::Error> {
        self.fetch_template(id).await
    }

    async fn get_client(&self, id: i64) -> Result<Option<Client>, sqlx::Error> {
        self.fetch_client(id).await
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>, sqlx::Error> {
        self.fetch_project(id).await
    }

    async fn get_unit(&self, id: i64) -> Result<Option<Unit>, sqlx::Error> {
        self.fetch_unit(id).await
    }

    async fn get_company(&self, id: i64) -> Result<Option<Company>, sqlx::Error> {
        self.fetch_company(id).await
    }

    async fn list_project_milestones(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectMilestone>, sqlx::Error> {
        self.fetch_project_milestones(project_id).await
    }

    async fn list_customer_schedules(
        &self,
        unit_id: i64,
    ) -> Result<Vec<CustomerSchedule>, sqlx::Error> {
        self.fetch_customer_schedules(unit_id).await
    }

    async fn list_payment_requests(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PaymentRequest>, sqlx::Error> {
        self.fetch_payment_requests(scope).await
    }

    async fn list_payment_receipts(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PaymentReceipt>, sqlx::Error> {
        self.fetch_payment_receipts(scope).await
    }

    async fn list_pending_payments(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PendingPayment>, sqlx::Error> {
        self.fetch_pending_payments(scope).await
    }

    async fn get_payment_request(&self, id: i64) -> Result<Option<PaymentRequest>, sqlx::Error> {
        self.fetch_payment_request(id).await
    }

    async fn get_payment_receipt(&self, id: i64) -> Result<Option<PaymentReceipt>, sqlx::Error> {
        self.fetch_payment_receipt(id).await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentService>,
    /// Set when generated files are served from the local disk.
    pub local_files_dir: Option<std::path::PathBuf>,
}

impl AppState {
    pub async fn new_with_config(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .idle_timeout(std::time::Duration::from_secs(900))
            .max_lifetime(std::time::Duration::from_secs(1800))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Database migrations applied");

        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(900))
            .user_agent("estate-docs-server/1.0")
            .build()?;

        let storage: Arc<dyn ObjectStorage + Send + Sync> =
            Arc::from(crate::storage::from_config(&config.storage, http_client));
        let repository = Arc::new(PgDocumentRepository::new(pool));
        let pdf = Arc::new(TypstRenderEngine::new(&config.typst_bin));

        let settings = DocumentSettings {
            format: config.format.clone(),
            layout: config.layout.clone(),
            documents_folder: config.documents_folder.clone(),
        };

        let local_files_dir = match &config.storage {
            crate::config::StorageConfig::Local { dir, .. } => Some(dir.clone()),
            crate::config::StorageConfig::Supabase(_) => None,
        };

        Ok(Self::new_with_parts(repository, storage, pdf, settings).with_local_files(local_files_dir))
    }

    /// Assemble state from ready-made collaborators, e.g. in-memory doubles in tests.
    pub fn new_with_parts(
        repository: Arc<dyn DocumentRepository + Send + Sync>,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        pdf: Arc<dyn PdfBackend + Send + Sync>,
        settings: DocumentSettings,
    ) -> Self {
        Self {
            documents: Arc::new(DocumentService::new(repository, storage, pdf, settings)),
            local_files_dir: None,
        }
    }

    pub fn with_local_files(mut self, dir: Option<std::path::PathBuf>) -> Self {
        self.local_files_dir = dir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_scope_bounds() {
        assert!(CollectionScope::default().is_unbounded());
        let scope = CollectionScope {
            unit_id: Some(3),
            ..Default::default()
        };
        assert!(!scope.is_unbounded());
    }
}
