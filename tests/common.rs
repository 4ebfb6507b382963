//! In-memory doubles for the repository, storage and PDF backend.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use estate_docs_server::db::{CollectionScope, DocumentRepository};
use estate_docs_server::document::models::{
    Client, Company, CustomerSchedule, PaymentReceipt, PaymentRequest, PendingPayment, Project,
    ProjectMilestone, Template, Unit,
};
use estate_docs_server::document::render::TypstDocument;
use estate_docs_server::document::{DocumentError, DocumentSettings, PdfBackend};
use estate_docs_server::storage::ObjectStorage;
use estate_docs_server::AppState;

#[derive(Default)]
pub struct InMemoryRepository {
    pub templates: Vec<Template>,
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    pub units: Vec<Unit>,
    pub companies: Vec<Company>,
    pub milestones: Vec<ProjectMilestone>,
    pub schedules: Vec<CustomerSchedule>,
    pub requests: Vec<PaymentRequest>,
    pub receipts: Vec<PaymentReceipt>,
    /// Every call fails with a database error.
    pub broken: bool,
}

fn in_scope(
    scope: &CollectionScope,
    client_id: Option<i64>,
    project_id: Option<i64>,
    unit_id: Option<i64>,
) -> bool {
    scope.client_id.map_or(true, |id| client_id == Some(id))
        && scope.project_id.map_or(true, |id| project_id == Some(id))
        && scope.unit_id.map_or(true, |id| unit_id == Some(id))
}

impl InMemoryRepository {
    fn check(&self) -> Result<(), sqlx::Error> {
        if self.broken {
            Err(sqlx::Error::Protocol("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn get_template(&self, id: i64) -> Result<Option<Template>, sqlx::Error> {
        self.check()?;
        Ok(self.templates.iter().find(|t| t.id == id).cloned())
    }

    async fn get_client(&self, id: i64) -> Result<Option<Client>, sqlx::Error> {
        self.check()?;
        Ok(self.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>, sqlx::Error> {
        self.check()?;
        Ok(self.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn get_unit(&self, id: i64) -> Result<Option<Unit>, sqlx::Error> {
        self.check()?;
        Ok(self.units.iter().find(|u| u.id == id).cloned())
    }

    async fn get_company(&self, id: i64) -> Result<Option<Company>, sqlx::Error> {
        self.check()?;
        Ok(self.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn list_project_milestones(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectMilestone>, sqlx::Error> {
        self.check()?;
        Ok(self
            .milestones
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn list_customer_schedules(
        &self,
        unit_id: i64,
    ) -> Result<Vec<CustomerSchedule>, sqlx::Error> {
        self.check()?;
        Ok(self
            .schedules
            .iter()
            .filter(|s| s.unit_id == Some(unit_id))
            .cloned()
            .collect())
    }

    async fn list_payment_requests(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PaymentRequest>, sqlx::Error> {
        self.check()?;
        let mut rows: Vec<PaymentRequest> = self
            .requests
            .iter()
            .filter(|r| in_scope(scope, r.client_id, r.project_id, r.unit_id))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn list_payment_receipts(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PaymentReceipt>, sqlx::Error> {
        self.check()?;
        let mut rows: Vec<PaymentReceipt> = self
            .receipts
            .iter()
            .filter(|r| in_scope(scope, r.client_id, r.project_id, r.unit_id))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn list_pending_payments(
        &self,
        scope: &CollectionScope,
    ) -> Result<Vec<PendingPayment>, sqlx::Error> {
        self.check()?;
        let mut rows: Vec<PendingPayment> = self
            .requests
            .iter()
            .filter(|r| in_scope(scope, r.client_id, r.project_id, r.unit_id))
            .filter(|r| r.status.as_deref() != Some("paid"))
            .map(|r| PendingPayment {
                id: r.id,
                description: r.description.clone(),
                amount: r.amount,
                due_date: r.due_date,
                status: r.status.clone(),
            })
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn get_payment_request(&self, id: i64) -> Result<Option<PaymentRequest>, sqlx::Error> {
        self.check()?;
        Ok(self.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn get_payment_receipt(&self, id: i64) -> Result<Option<PaymentReceipt>, sqlx::Error> {
        self.check()?;
        Ok(self.receipts.iter().find(|r| r.id == id).cloned())
    }
}

/// Mock implementation of ObjectStorage for testing
#[derive(Default)]
pub struct MockObjectStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    pub fail_uploads: bool,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub async fn file(&self, filename: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(filename).cloned()
    }

    pub async fn file_count(&self) -> usize {
        self.files.lock().await.len()
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), String> {
        if self.fail_uploads {
            return Err("bucket unavailable".to_string());
        }
        self.files
            .lock()
            .await
            .insert(filename.to_string(), file_data.to_vec());
        Ok(())
    }

    async fn delete_file(&self, filename: &str) -> Result<(), String> {
        self.files.lock().await.remove(filename);
        self.deleted.lock().await.push(filename.to_string());
        Ok(())
    }

    fn get_asset_url(&self, filename: &str) -> String {
        format!("http://test.example.com/{}", filename)
    }
}

pub const FAKE_PDF: &[u8] = b"%PDF-1.7 fake";

/// Records the Typst document and writes a fixed PDF instead of compiling.
#[derive(Default)]
pub struct FakePdfBackend {
    pub fail: bool,
    last: Mutex<Option<TypstDocument>>,
}

impl FakePdfBackend {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn last_document(&self) -> Option<TypstDocument> {
        self.last.lock().await.clone()
    }
}

#[async_trait]
impl PdfBackend for FakePdfBackend {
    async fn render_to_file(
        &self,
        document: &TypstDocument,
        output: &Path,
    ) -> Result<(), DocumentError> {
        *self.last.lock().await = Some(document.clone());
        if self.fail {
            return Err(DocumentError::TypstExit(1));
        }
        tokio::fs::write(output, FAKE_PDF)
            .await
            .map_err(DocumentError::WriteTypst)
    }
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn money(value: i64) -> Option<Decimal> {
    Some(Decimal::from(value))
}

pub const AGREEMENT_TEMPLATE: &str = "~center~# Agreement for Sale~/center~\n\
This agreement is made with {{CLIENT_NAME}} for flat {{FLAT_NO}} in {{PROJECT_NAME}}.\n\
The agreed value is {{FLAT_VALUE}}.\n\n\
## Payment Schedule\n\
{{CUSTOMER_SCHEDULES_TABLE}}\n\
Total requested: {{TOTAL_PAYMENT_REQUESTS_AMOUNT}} across {{PAYMENT_REQUESTS_COUNT}} requests.\n\n\
~right~For {{COMPANY_NAME}}~/right~";

/// One client with a flat, two requests (one paid), one receipt and a company.
pub fn sample_repository() -> InMemoryRepository {
    InMemoryRepository {
        templates: vec![
            Template {
                id: 1,
                name: "Sale Agreement".to_string(),
                content: AGREEMENT_TEMPLATE.to_string(),
                created_at: None,
                updated_at: None,
            },
            Template {
                id: 2,
                name: "Payment Request".to_string(),
                content: "Please pay {{AMOUNT}} for {{DESCRIPTION}} by {{PAYMENT_REQUEST_DUE_DATE[0]}}."
                    .to_string(),
                created_at: None,
                updated_at: None,
            },
        ],
        clients: vec![Client {
            id: 1,
            name: "Acme".to_string(),
            email: Some("acme@example.com".to_string()),
            phone: Some("9876543210".to_string()),
            ..Default::default()
        }],
        projects: vec![Project {
            id: 1,
            name: "Green Meadows".to_string(),
            budget: money(120_000_000),
            start_date: date(2024, 1, 15),
            ..Default::default()
        }],
        units: vec![Unit {
            id: 1,
            project_id: Some(1),
            client_id: Some(1),
            flat_no: "A-101".to_string(),
            flat_type: Some("2BHK".to_string()),
            flat_value: money(500_000),
            ..Default::default()
        }],
        companies: vec![Company {
            id: 1,
            name: "Acme Builders".to_string(),
            address: Some("MG Road, Pune".to_string()),
            gstin: Some("27ABCDE1234F1Z5".to_string()),
            ..Default::default()
        }],
        milestones: vec![
            ProjectMilestone {
                id: 1,
                project_id: 1,
                sr_no: Some(1),
                name: "Foundation".to_string(),
                completion_percentage: Some(Decimal::from(100)),
                status: Some("Completed".to_string()),
                ..Default::default()
            },
            ProjectMilestone {
                id: 2,
                project_id: 1,
                sr_no: Some(2),
                name: "Plinth".to_string(),
                completion_percentage: Some(Decimal::new(455, 1)),
                status: Some("In Progress".to_string()),
                ..Default::default()
            },
        ],
        schedules: vec![
            CustomerSchedule {
                id: 1,
                unit_id: Some(1),
                sr_no: Some(1),
                description: Some("Booking".to_string()),
                percentage: Some(Decimal::from(10)),
                amount: money(50_000),
                due_date: date(2024, 2, 1),
                status: Some("Paid".to_string()),
            },
            CustomerSchedule {
                id: 2,
                unit_id: Some(1),
                sr_no: Some(2),
                description: Some("Foundation".to_string()),
                percentage: Some(Decimal::from(15)),
                amount: money(75_000),
                due_date: date(2024, 4, 1),
                status: Some("Due".to_string()),
            },
        ],
        requests: vec![
            PaymentRequest {
                id: 11,
                client_id: Some(1),
                project_id: Some(1),
                unit_id: Some(1),
                description: Some("Booking amount".to_string()),
                amount: money(1000),
                request_date: date(2024, 1, 20),
                due_date: date(2024, 2, 1),
                status: Some("paid".to_string()),
            },
            PaymentRequest {
                id: 12,
                client_id: Some(1),
                project_id: Some(1),
                unit_id: Some(1),
                description: Some("Foundation stage".to_string()),
                amount: money(2000),
                request_date: date(2024, 3, 20),
                due_date: date(2024, 4, 1),
                status: Some("pending".to_string()),
            },
        ],
        receipts: vec![PaymentReceipt {
            id: 21,
            client_id: Some(1),
            project_id: Some(1),
            unit_id: Some(1),
            description: Some("Booking amount".to_string()),
            amount: money(1000),
            receipt_date: date(2024, 1, 25),
            payment_method: Some("NEFT".to_string()),
            reference_no: Some("UTR123".to_string()),
        }],
        broken: false,
    }
}

pub struct TestHarness {
    pub repository: Arc<InMemoryRepository>,
    pub storage: Arc<MockObjectStorage>,
    pub pdf: Arc<FakePdfBackend>,
}

impl TestHarness {
    pub fn new(repository: InMemoryRepository) -> Self {
        Self::with(repository, MockObjectStorage::new(), FakePdfBackend::default())
    }

    pub fn with(
        repository: InMemoryRepository,
        storage: MockObjectStorage,
        pdf: FakePdfBackend,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            storage: Arc::new(storage),
            pdf: Arc::new(pdf),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new_with_parts(
            self.repository.clone(),
            self.storage.clone(),
            self.pdf.clone(),
            DocumentSettings::default(),
        )
    }
}
