//! Document context: the read-only snapshot a single render works from.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::models::{
    Client, Company, CustomerSchedule, PaymentReceipt, PaymentRequest, PendingPayment, Project,
    ProjectMilestone, Unit,
};
use super::DocumentError;
use crate::db::{CollectionScope, DocumentRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Agreement,
    PaymentRequest,
    PaymentReceipt,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agreement => "agreement",
            Self::PaymentRequest => "payment_request",
            Self::PaymentReceipt => "payment_receipt",
        }
    }
}

/// The single record a payment request or receipt export is about.
#[derive(Debug, Clone)]
pub enum CurrentRecord {
    PaymentRequest(PaymentRequest),
    PaymentReceipt(PaymentReceipt),
}

#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub document_type: DocumentType,
    /// Render date, used by `{{CURRENT_DATE}}`.
    pub today: NaiveDate,
    pub client: Option<Client>,
    pub project: Option<Project>,
    pub unit: Option<Unit>,
    pub company: Option<Company>,
    pub project_milestones: Vec<ProjectMilestone>,
    pub customer_schedules: Vec<CustomerSchedule>,
    pub payment_requests: Vec<PaymentRequest>,
    pub payment_receipts: Vec<PaymentReceipt>,
    pub pending_payments: Vec<PendingPayment>,
    pub current: Option<CurrentRecord>,
}

impl DocumentContext {
    /// Context with no entities; every placeholder resolves to a blank or zero.
    pub fn empty(document_type: DocumentType, today: NaiveDate) -> Self {
        Self {
            document_type,
            today,
            client: None,
            project: None,
            unit: None,
            company: None,
            project_milestones: Vec::new(),
            customer_schedules: Vec::new(),
            payment_requests: Vec::new(),
            payment_receipts: Vec::new(),
            pending_payments: Vec::new(),
            current: None,
        }
    }
}

impl Default for DocumentContext {
    fn default() -> Self {
        Self::empty(DocumentType::Agreement, Local::now().date_naive())
    }
}

/// Entity ids a document is rendered for. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContextRequest {
    pub client_id: Option<i64>,
    pub project_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub company_id: Option<i64>,
    pub payment_request_id: Option<i64>,
    pub payment_receipt_id: Option<i64>,
}

impl ContextRequest {
    fn ids(&self) -> [(&'static str, Option<i64>); 6] {
        [
            ("client_id", self.client_id),
            ("project_id", self.project_id),
            ("unit_id", self.unit_id),
            ("company_id", self.company_id),
            ("payment_request_id", self.payment_request_id),
            ("payment_receipt_id", self.payment_receipt_id),
        ]
    }

    /// First id that can never exist (zero or negative).
    fn invalid_id(&self) -> Option<(&'static str, i64)> {
        self.ids()
            .into_iter()
            .find_map(|(name, id)| id.filter(|v| *v <= 0).map(|v| (name, v)))
    }
}

/// Assembles a [`DocumentContext`] from the data layer.
pub struct ContextBuilder<'a> {
    repository: &'a (dyn DocumentRepository + Send + Sync),
}

impl<'a> ContextBuilder<'a> {
    pub fn new(repository: &'a (dyn DocumentRepository + Send + Sync)) -> Self {
        Self { repository }
    }

    /// Load every referenced entity and the five collections.
    ///
    /// Missing ids leave the matching field empty. A structurally invalid id yields an
    /// empty context instead of an error so the render still completes with blanks.
    pub async fn build(
        &self,
        document_type: DocumentType,
        request: &ContextRequest,
        today: NaiveDate,
    ) -> Result<DocumentContext, DocumentError> {
        if let Some((name, id)) = request.invalid_id() {
            log::warn!("Invalid {} {} in document request, rendering with empty context", name, id);
            return Ok(DocumentContext::empty(document_type, today));
        }

        let repo = self.repository;
        let mut ctx = DocumentContext::empty(document_type, today);

        if let Some(id) = request.client_id {
            ctx.client = repo.get_client(id).await?;
        }
        if let Some(id) = request.project_id {
            ctx.project = repo.get_project(id).await?;
        }
        if let Some(id) = request.unit_id {
            ctx.unit = repo.get_unit(id).await?;
        }
        if let Some(id) = request.company_id {
            ctx.company = repo.get_company(id).await?;
        }

        if let Some(project_id) = request.project_id {
            ctx.project_milestones = repo.list_project_milestones(project_id).await?;
        }
        if let Some(unit_id) = request.unit_id {
            ctx.customer_schedules = repo.list_customer_schedules(unit_id).await?;
        }

        let scope = CollectionScope {
            client_id: request.client_id,
            project_id: request.project_id,
            unit_id: request.unit_id,
        };
        if !scope.is_unbounded() {
            ctx.payment_requests = repo.list_payment_requests(&scope).await?;
            ctx.payment_receipts = repo.list_payment_receipts(&scope).await?;
            ctx.pending_payments = repo.list_pending_payments(&scope).await?;
        }

        ctx.current = match document_type {
            DocumentType::PaymentRequest => match request.payment_request_id {
                Some(id) => repo
                    .get_payment_request(id)
                    .await?
                    .map(CurrentRecord::PaymentRequest),
                None => None,
            },
            DocumentType::PaymentReceipt => match request.payment_receipt_id {
                Some(id) => repo
                    .get_payment_receipt(id)
                    .await?
                    .map(CurrentRecord::PaymentReceipt),
                None => None,
            },
            DocumentType::Agreement => None,
        };

        log::debug!(
            "Built {} context: client={} project={} unit={} company={} milestones={} schedules={} requests={} receipts={} pending={} current={}",
            document_type.as_str(),
            ctx.client.is_some(),
            ctx.project.is_some(),
            ctx.unit.is_some(),
            ctx.company.is_some(),
            ctx.project_milestones.len(),
            ctx.customer_schedules.len(),
            ctx.payment_requests.len(),
            ctx.payment_receipts.len(),
            ctx.pending_payments.len(),
            ctx.current.is_some(),
        );

        Ok(ctx)
    }
}
