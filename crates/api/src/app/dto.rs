//! Request/response DTOs and JSON mapping helpers.
//!
//! Requests arrive with string-typed enums and ids; handlers parse them into
//! the typed request structs the engine consumes, rejecting bad values with a
//! 400 before any engine work happens.

use serde::Deserialize;
use serde_json::{json, Value};

use certportal_applications::Application;
use certportal_billing::Transaction;
use certportal_certificates::Certificate;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub company_id: String,
    pub application_type: String,
    pub classification: String,
    pub business_field: String,
    pub qualification: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectApplicationRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub application_id: String,
    pub amount: u64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

pub fn application_to_json(app: &Application) -> Value {
    json!({
        "id": app.id.to_string(),
        "owner_id": app.owner_id.to_string(),
        "company_id": app.company_id.to_string(),
        "application_number": app.application_number,
        "application_type": app.application_type.as_str(),
        "classification": app.classification,
        "business_field": app.business_field,
        "qualification": app.qualification.as_str(),
        "status": app.status.as_str(),
        "submitted_at": app.submitted_at,
        "reviewed_at": app.reviewed_at,
        "completed_at": app.completed_at,
        "notes": app.notes,
        "reviewer_id": app.reviewer_id.map(|r| r.to_string()),
        "created_at": app.created_at,
    })
}

pub fn transaction_to_json(txn: &Transaction) -> Value {
    json!({
        "id": txn.id.to_string(),
        "owner_id": txn.owner_id.to_string(),
        "application_id": txn.application_id.to_string(),
        "transaction_number": txn.transaction_number,
        "amount": txn.amount,
        "status": txn.status.as_str(),
        "payment_method": txn.payment_method,
        "payment_reference": txn.payment_reference,
        "paid_at": txn.paid_at,
        "notes": txn.notes,
        "created_at": txn.created_at,
    })
}

pub fn certificate_to_json(cert: &Certificate) -> Value {
    json!({
        "id": cert.id.to_string(),
        "owner_id": cert.owner_id.to_string(),
        "application_id": cert.application_id.to_string(),
        "certificate_number": cert.certificate_number,
        "national_registration_number": cert.national_registration_number,
        "classification": cert.classification,
        "business_field": cert.business_field,
        "qualification": cert.qualification.as_str(),
        "issued_at": cert.issued_at,
        "expires_at": cert.expires_at,
        "status": cert.status.as_str(),
        "issuer_name": cert.issuer_name,
        "file_path": cert.file_path,
    })
}
