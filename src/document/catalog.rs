//! Fixed placeholder catalog.
//!
//! Scalars name a single field of an entity held in the context. The five collections
//! share one shape: an ordered list of rows whose cells line up with a static column
//! list. Indexed lookups, tables and aggregates are all implemented once over that shape.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::context::{CurrentRecord, DocumentContext};
use super::format::{plain_number, FormatConfig};
use super::models::{
    CustomerSchedule, PaymentReceipt, PaymentRequest, PendingPayment, ProjectMilestone,
};

/// A resolved, not yet formatted, field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Text(String),
    /// Payment amount, always shown with two decimals.
    Amount(Decimal),
    /// Price or budget, decimals only when not whole.
    Price(Decimal),
    Date(NaiveDate),
    Percent(Decimal),
    Number(Decimal),
    Integer(i64),
}

impl FieldValue {
    pub fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) => Self::Text(v.to_string()),
            None => Self::Empty,
        }
    }

    fn map<T>(value: Option<T>, f: impl FnOnce(T) -> Self) -> Self {
        value.map(f).unwrap_or(Self::Empty)
    }

    /// Numeric amount carried by this value, if any.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Amount(d) | Self::Price(d) | Self::Number(d) | Self::Percent(d) => Some(*d),
            Self::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    pub fn display(&self, format: &FormatConfig) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Amount(d) => format.amount(*d),
            Self::Price(d) => format.price(*d),
            Self::Date(d) => format.date(*d),
            Self::Percent(d) => format!("{}%", plain_number(*d)),
            Self::Number(d) => plain_number(*d),
            Self::Integer(i) => i.to_string(),
        }
    }
}

// ============================================================================
// Scalars
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    ClientName,
    ClientEmail,
    ClientPhone,
    ClientAddress,
    ClientPan,
    ClientAadhaar,
    ProjectName,
    ProjectAddress,
    ProjectDescription,
    ProjectStartDate,
    ProjectEndDate,
    ProjectBudget,
    ProjectStatus,
    FlatNo,
    FlatType,
    FlatFloor,
    FlatArea,
    FlatValue,
    FlatStatus,
    CompanyName,
    CompanyAddress,
    CompanyPhone,
    CompanyEmail,
    CompanyGstin,
    CompanyWebsite,
    CurrentDate,
}

impl ScalarField {
    pub const ALL: &'static [ScalarField] = &[
        Self::ClientName,
        Self::ClientEmail,
        Self::ClientPhone,
        Self::ClientAddress,
        Self::ClientPan,
        Self::ClientAadhaar,
        Self::ProjectName,
        Self::ProjectAddress,
        Self::ProjectDescription,
        Self::ProjectStartDate,
        Self::ProjectEndDate,
        Self::ProjectBudget,
        Self::ProjectStatus,
        Self::FlatNo,
        Self::FlatType,
        Self::FlatFloor,
        Self::FlatArea,
        Self::FlatValue,
        Self::FlatStatus,
        Self::CompanyName,
        Self::CompanyAddress,
        Self::CompanyPhone,
        Self::CompanyEmail,
        Self::CompanyGstin,
        Self::CompanyWebsite,
        Self::CurrentDate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ClientName => "CLIENT_NAME",
            Self::ClientEmail => "CLIENT_EMAIL",
            Self::ClientPhone => "CLIENT_PHONE",
            Self::ClientAddress => "CLIENT_ADDRESS",
            Self::ClientPan => "CLIENT_PAN",
            Self::ClientAadhaar => "CLIENT_AADHAAR",
            Self::ProjectName => "PROJECT_NAME",
            Self::ProjectAddress => "PROJECT_ADDRESS",
            Self::ProjectDescription => "PROJECT_DESCRIPTION",
            Self::ProjectStartDate => "PROJECT_START_DATE",
            Self::ProjectEndDate => "PROJECT_END_DATE",
            Self::ProjectBudget => "PROJECT_BUDGET",
            Self::ProjectStatus => "PROJECT_STATUS",
            Self::FlatNo => "FLAT_NO",
            Self::FlatType => "FLAT_TYPE",
            Self::FlatFloor => "FLAT_FLOOR",
            Self::FlatArea => "FLAT_AREA",
            Self::FlatValue => "FLAT_VALUE",
            Self::FlatStatus => "FLAT_STATUS",
            Self::CompanyName => "COMPANY_NAME",
            Self::CompanyAddress => "COMPANY_ADDRESS",
            Self::CompanyPhone => "COMPANY_PHONE",
            Self::CompanyEmail => "COMPANY_EMAIL",
            Self::CompanyGstin => "COMPANY_GSTIN",
            Self::CompanyWebsite => "COMPANY_WEBSITE",
            Self::CurrentDate => "CURRENT_DATE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }

    fn group(self) -> &'static str {
        match self {
            Self::ClientName
            | Self::ClientEmail
            | Self::ClientPhone
            | Self::ClientAddress
            | Self::ClientPan
            | Self::ClientAadhaar => "Client",
            Self::ProjectName
            | Self::ProjectAddress
            | Self::ProjectDescription
            | Self::ProjectStartDate
            | Self::ProjectEndDate
            | Self::ProjectBudget
            | Self::ProjectStatus => "Project",
            Self::FlatNo
            | Self::FlatType
            | Self::FlatFloor
            | Self::FlatArea
            | Self::FlatValue
            | Self::FlatStatus => "Unit",
            Self::CompanyName
            | Self::CompanyAddress
            | Self::CompanyPhone
            | Self::CompanyEmail
            | Self::CompanyGstin
            | Self::CompanyWebsite => "Company",
            Self::CurrentDate => "General",
        }
    }

    /// Look the field up in the context. An absent entity yields [`FieldValue::Empty`].
    pub fn value(self, ctx: &DocumentContext) -> FieldValue {
        let client = ctx.client.as_ref();
        let project = ctx.project.as_ref();
        let unit = ctx.unit.as_ref();
        let company = ctx.company.as_ref();

        match self {
            Self::ClientName => FieldValue::text(client.map(|c| c.name.as_str())),
            Self::ClientEmail => FieldValue::text(client.and_then(|c| c.email.as_deref())),
            Self::ClientPhone => FieldValue::text(client.and_then(|c| c.phone.as_deref())),
            Self::ClientAddress => FieldValue::text(client.and_then(|c| c.address.as_deref())),
            Self::ClientPan => FieldValue::text(client.and_then(|c| c.pan_no.as_deref())),
            Self::ClientAadhaar => FieldValue::text(client.and_then(|c| c.aadhaar_no.as_deref())),
            Self::ProjectName => FieldValue::text(project.map(|p| p.name.as_str())),
            Self::ProjectAddress => FieldValue::text(project.and_then(|p| p.address.as_deref())),
            Self::ProjectDescription => {
                FieldValue::text(project.and_then(|p| p.description.as_deref()))
            }
            Self::ProjectStartDate => {
                FieldValue::map(project.and_then(|p| p.start_date), FieldValue::Date)
            }
            Self::ProjectEndDate => FieldValue::map(project.and_then(|p| p.end_date), FieldValue::Date),
            Self::ProjectBudget => FieldValue::map(project.and_then(|p| p.budget), FieldValue::Price),
            Self::ProjectStatus => FieldValue::text(project.and_then(|p| p.status.as_deref())),
            Self::FlatNo => FieldValue::text(unit.map(|u| u.flat_no.as_str())),
            Self::FlatType => FieldValue::text(unit.and_then(|u| u.flat_type.as_deref())),
            Self::FlatFloor => FieldValue::text(unit.and_then(|u| u.floor_no.as_deref())),
            Self::FlatArea => FieldValue::map(unit.and_then(|u| u.area_sqft), FieldValue::Number),
            Self::FlatValue => FieldValue::map(unit.and_then(|u| u.flat_value), FieldValue::Price),
            Self::FlatStatus => FieldValue::text(unit.and_then(|u| u.status.as_deref())),
            Self::CompanyName => FieldValue::text(company.map(|c| c.name.as_str())),
            Self::CompanyAddress => FieldValue::text(company.and_then(|c| c.address.as_deref())),
            Self::CompanyPhone => FieldValue::text(company.and_then(|c| c.phone.as_deref())),
            Self::CompanyEmail => FieldValue::text(company.and_then(|c| c.email.as_deref())),
            Self::CompanyGstin => FieldValue::text(company.and_then(|c| c.gstin.as_deref())),
            Self::CompanyWebsite => FieldValue::text(company.and_then(|c| c.website.as_deref())),
            Self::CurrentDate => FieldValue::Date(ctx.today),
        }
    }
}

/// Shorthand fields of the single payment request or receipt being exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentField {
    Amount,
    Date,
    Description,
}

impl CurrentField {
    pub const ALL: &'static [CurrentField] = &[Self::Amount, Self::Date, Self::Description];

    pub fn name(self) -> &'static str {
        match self {
            Self::Amount => "AMOUNT",
            Self::Date => "DATE",
            Self::Description => "DESCRIPTION",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }

    pub fn value(self, ctx: &DocumentContext) -> FieldValue {
        let Some(current) = ctx.current.as_ref() else {
            return FieldValue::Empty;
        };

        match (self, current) {
            (Self::Amount, CurrentRecord::PaymentRequest(r)) => {
                FieldValue::map(r.amount, FieldValue::Amount)
            }
            (Self::Amount, CurrentRecord::PaymentReceipt(r)) => {
                FieldValue::map(r.amount, FieldValue::Amount)
            }
            (Self::Date, CurrentRecord::PaymentRequest(r)) => {
                FieldValue::map(r.request_date, FieldValue::Date)
            }
            (Self::Date, CurrentRecord::PaymentReceipt(r)) => {
                FieldValue::map(r.receipt_date, FieldValue::Date)
            }
            (Self::Description, CurrentRecord::PaymentRequest(r)) => {
                FieldValue::text(r.description.as_deref())
            }
            (Self::Description, CurrentRecord::PaymentReceipt(r)) => {
                FieldValue::text(r.description.as_deref())
            }
        }
    }
}

// ============================================================================
// Collections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Field name used in indexed placeholders, e.g. `AMOUNT`.
    pub key: &'static str,
    /// Table header text.
    pub header: &'static str,
    pub in_table: bool,
}

const fn column(key: &'static str, header: &'static str) -> ColumnSpec {
    ColumnSpec {
        key,
        header,
        in_table: true,
    }
}

const fn hidden(key: &'static str, header: &'static str) -> ColumnSpec {
    ColumnSpec {
        key,
        header,
        in_table: false,
    }
}

const MILESTONE_COLUMNS: &[ColumnSpec] = &[
    column("SR_NO", "Sr No"),
    column("NAME", "Milestone Name"),
    column("COMPLETION", "Completion %"),
    column("STATUS", "Status"),
    hidden("DESCRIPTION", "Description"),
    hidden("TARGET_DATE", "Target Date"),
];

const SCHEDULE_COLUMNS: &[ColumnSpec] = &[
    column("SR_NO", "Sr No"),
    column("DESCRIPTION", "Description"),
    column("PERCENTAGE", "Percentage"),
    column("AMOUNT", "Amount"),
    column("DUE_DATE", "Due Date"),
    column("STATUS", "Status"),
];

const REQUEST_COLUMNS: &[ColumnSpec] = &[
    column("SR_NO", "Sr No"),
    column("DESCRIPTION", "Description"),
    column("AMOUNT", "Amount"),
    column("DATE", "Request Date"),
    column("DUE_DATE", "Due Date"),
    column("STATUS", "Status"),
];

const RECEIPT_COLUMNS: &[ColumnSpec] = &[
    column("SR_NO", "Sr No"),
    column("DESCRIPTION", "Description"),
    column("AMOUNT", "Amount"),
    column("DATE", "Receipt Date"),
    column("PAYMENT_METHOD", "Payment Method"),
    column("REFERENCE_NO", "Reference No"),
];

const PENDING_COLUMNS: &[ColumnSpec] = &[
    column("SR_NO", "Sr No"),
    column("DESCRIPTION", "Description"),
    column("AMOUNT", "Amount"),
    column("DUE_DATE", "Due Date"),
    column("STATUS", "Status"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    ProjectMilestones,
    CustomerSchedules,
    PaymentRequests,
    PaymentReceipts,
    PendingPayments,
}

impl CollectionKind {
    pub const ALL: &'static [CollectionKind] = &[
        Self::ProjectMilestones,
        Self::CustomerSchedules,
        Self::PaymentRequests,
        Self::PaymentReceipts,
        Self::PendingPayments,
    ];

    /// Singular prefix of indexed placeholders.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::ProjectMilestones => "PROJECT_MILESTONE",
            Self::CustomerSchedules => "CUSTOMER_SCHEDULE",
            Self::PaymentRequests => "PAYMENT_REQUEST",
            Self::PaymentReceipts => "PAYMENT_RECEIPT",
            Self::PendingPayments => "PENDING_PAYMENT",
        }
    }

    /// Plural name used by table and aggregate placeholders.
    pub fn plural(self) -> &'static str {
        match self {
            Self::ProjectMilestones => "PROJECT_MILESTONES",
            Self::CustomerSchedules => "CUSTOMER_SCHEDULES",
            Self::PaymentRequests => "PAYMENT_REQUESTS",
            Self::PaymentReceipts => "PAYMENT_RECEIPTS",
            Self::PendingPayments => "PENDING_PAYMENTS",
        }
    }

    pub fn columns(self) -> &'static [ColumnSpec] {
        match self {
            Self::ProjectMilestones => MILESTONE_COLUMNS,
            Self::CustomerSchedules => SCHEDULE_COLUMNS,
            Self::PaymentRequests => REQUEST_COLUMNS,
            Self::PaymentReceipts => RECEIPT_COLUMNS,
            Self::PendingPayments => PENDING_COLUMNS,
        }
    }

    pub fn column_index(self, key: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.key == key)
    }

    /// Column summed by `TOTAL_<PLURAL>_AMOUNT`.
    pub fn amount_column(self) -> Option<usize> {
        self.column_index("AMOUNT")
    }

    pub fn from_plural(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.plural() == name)
    }

    /// Split `PAYMENT_RECEIPT_AMOUNT` into the collection and column index.
    pub fn parse_field(name: &str) -> Option<(Self, usize)> {
        Self::ALL.iter().copied().find_map(|kind| {
            let field = name.strip_prefix(kind.prefix())?.strip_prefix('_')?;
            kind.column_index(field).map(|index| (kind, index))
        })
    }
}

/// Materialized rows of one collection, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub kind: CollectionKind,
    pub rows: Vec<Vec<FieldValue>>,
}

impl Collection {
    pub fn from_context(kind: CollectionKind, ctx: &DocumentContext) -> Self {
        let rows = match kind {
            CollectionKind::ProjectMilestones => rows_of(&ctx.project_milestones),
            CollectionKind::CustomerSchedules => rows_of(&ctx.customer_schedules),
            CollectionKind::PaymentRequests => rows_of(&ctx.payment_requests),
            CollectionKind::PaymentReceipts => rows_of(&ctx.payment_receipts),
            CollectionKind::PendingPayments => rows_of(&ctx.pending_payments),
        };
        Self { kind, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `index`/`column`; out of range yields `None`.
    pub fn cell(&self, index: usize, column: usize) -> Option<&FieldValue> {
        self.rows.get(index).and_then(|row| row.get(column))
    }
}

fn rows_of<T: AsRow>(items: &[T]) -> Vec<Vec<FieldValue>> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| item.as_row(position + 1))
        .collect()
}

fn serial(sr_no: Option<i32>, position: usize) -> FieldValue {
    FieldValue::Integer(sr_no.map(i64::from).unwrap_or(position as i64))
}

/// Cells of an entity, in the order of its collection's columns.
trait AsRow {
    fn as_row(&self, position: usize) -> Vec<FieldValue>;
}

impl AsRow for ProjectMilestone {
    fn as_row(&self, position: usize) -> Vec<FieldValue> {
        vec![
            serial(self.sr_no, position),
            FieldValue::Text(self.name.clone()),
            FieldValue::map(self.completion_percentage, FieldValue::Percent),
            FieldValue::text(self.status.as_deref()),
            FieldValue::text(self.description.as_deref()),
            FieldValue::map(self.target_date, FieldValue::Date),
        ]
    }
}

impl AsRow for CustomerSchedule {
    fn as_row(&self, position: usize) -> Vec<FieldValue> {
        vec![
            serial(self.sr_no, position),
            FieldValue::text(self.description.as_deref()),
            FieldValue::map(self.percentage, FieldValue::Percent),
            FieldValue::map(self.amount, FieldValue::Amount),
            FieldValue::map(self.due_date, FieldValue::Date),
            FieldValue::text(self.status.as_deref()),
        ]
    }
}

impl AsRow for PaymentRequest {
    fn as_row(&self, position: usize) -> Vec<FieldValue> {
        vec![
            serial(None, position),
            FieldValue::text(self.description.as_deref()),
            FieldValue::map(self.amount, FieldValue::Amount),
            FieldValue::map(self.request_date, FieldValue::Date),
            FieldValue::map(self.due_date, FieldValue::Date),
            FieldValue::text(self.status.as_deref()),
        ]
    }
}

impl AsRow for PaymentReceipt {
    fn as_row(&self, position: usize) -> Vec<FieldValue> {
        vec![
            serial(None, position),
            FieldValue::text(self.description.as_deref()),
            FieldValue::map(self.amount, FieldValue::Amount),
            FieldValue::map(self.receipt_date, FieldValue::Date),
            FieldValue::text(self.payment_method.as_deref()),
            FieldValue::text(self.reference_no.as_deref()),
        ]
    }
}

impl AsRow for PendingPayment {
    fn as_row(&self, position: usize) -> Vec<FieldValue> {
        vec![
            serial(None, position),
            FieldValue::text(self.description.as_deref()),
            FieldValue::map(self.amount, FieldValue::Amount),
            FieldValue::map(self.due_date, FieldValue::Date),
            FieldValue::text(self.status.as_deref()),
        ]
    }
}

// ============================================================================
// Listing for template authors
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlaceholderInfo {
    #[schema(example = "{{CLIENT_NAME}}")]
    pub token: String,
    #[schema(example = "Client")]
    pub group: String,
    #[schema(example = "Client name")]
    pub description: String,
}

impl PlaceholderInfo {
    fn new(token: String, group: &str, description: String) -> Self {
        Self {
            token,
            group: group.to_string(),
            description,
        }
    }
}

/// Every placeholder the engine understands, grouped for the template editor.
pub fn placeholders() -> Vec<PlaceholderInfo> {
    let mut out: Vec<PlaceholderInfo> = ScalarField::ALL
        .iter()
        .map(|field| {
            PlaceholderInfo::new(
                format!("{{{{{}}}}}", field.name()),
                field.group(),
                humanize(field.name()),
            )
        })
        .collect();

    for field in CurrentField::ALL {
        out.push(PlaceholderInfo::new(
            format!("{{{{{}}}}}", field.name()),
            "Current payment",
            format!("{} of the exported payment request or receipt", humanize(field.name())),
        ));
    }

    for kind in CollectionKind::ALL.iter().copied() {
        let group = humanize(kind.plural());
        for col in kind.columns() {
            out.push(PlaceholderInfo::new(
                format!("{{{{{}_{}[n]}}}}", kind.prefix(), col.key),
                &group,
                format!("{} of entry n (0-based)", col.header),
            ));
        }
        out.push(PlaceholderInfo::new(
            format!("{{{{{}_TABLE}}}}", kind.plural()),
            &group,
            format!("Table of all {}", group.to_lowercase()),
        ));
        if kind.amount_column().is_some() {
            out.push(PlaceholderInfo::new(
                format!("{{{{TOTAL_{}_AMOUNT}}}}", kind.plural()),
                &group,
                "Sum of all amounts".to_string(),
            ));
        }
        out.push(PlaceholderInfo::new(
            format!("{{{{{}_COUNT}}}}", kind.plural()),
            &group,
            "Number of entries".to_string(),
        ));
    }

    out
}

/// `PAYMENT_REQUESTS` -> `Payment requests`
fn humanize(name: &str) -> String {
    let lower = name.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
