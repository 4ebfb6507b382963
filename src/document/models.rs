//! Persisted entities read by the document engine.
//!
//! These mirror the rows owned by the CRUD screens. The engine only ever reads them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User-authored document template.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: i64,
    pub name: String,
    /// Free text with placeholder tokens and markup directives.
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub pan_no: Option<String>,
    pub aadhaar_no: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<Decimal>,
    pub status: Option<String>,
}

/// A flat (unit) inside a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Unit {
    pub id: i64,
    pub project_id: Option<i64>,
    pub client_id: Option<i64>,
    pub flat_no: String,
    pub flat_type: Option<String>,
    pub floor_no: Option<String>,
    pub area_sqft: Option<Decimal>,
    pub flat_value: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gstin: Option<String>,
    pub website: Option<String>,
    /// Path to the letterhead image on the server's filesystem.
    pub letterhead_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMilestone {
    pub id: i64,
    pub project_id: i64,
    pub sr_no: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub completion_percentage: Option<Decimal>,
    pub status: Option<String>,
    pub target_date: Option<NaiveDate>,
}

/// Installment agreed with the customer, usually tied to a construction stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomerSchedule {
    pub id: i64,
    pub unit_id: Option<i64>,
    pub sr_no: Option<i32>,
    pub description: Option<String>,
    pub percentage: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentRequest {
    pub id: i64,
    pub client_id: Option<i64>,
    pub project_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub request_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentReceipt {
    pub id: i64,
    pub client_id: Option<i64>,
    pub project_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub receipt_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub reference_no: Option<String>,
}

/// Outstanding amount still owed by the customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingPayment {
    pub id: i64,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
}
