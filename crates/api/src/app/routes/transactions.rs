use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use certportal_applications::ApplicationId;
use certportal_auth::Principal;
use certportal_billing::{CreateInvoice, TransactionId, TransactionStatus, UpdateTransactionStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_invoice))
        .route("/:id", get(view))
        .route("/:id/status", patch(update_status))
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<dto::CreateInvoiceRequest>,
) -> axum::response::Response {
    let application_id = match body.application_id.parse::<ApplicationId>() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid application_id",
            )
        }
    };
    let req = CreateInvoice {
        application_id,
        amount: body.amount,
        notes: body.notes,
    };
    match services.billing.create_invoice(&principal, req).await {
        Ok(txn) => (StatusCode::CREATED, Json(dto::transaction_to_json(&txn))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn view(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<TransactionId>() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid transaction id")
        }
    };
    match services.billing.view(&principal, id).await {
        Ok(txn) => (StatusCode::OK, Json(dto::transaction_to_json(&txn))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateTransactionStatusRequest>,
) -> axum::response::Response {
    let id = match id.parse::<TransactionId>() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid transaction id")
        }
    };
    let status = match body.status.parse::<TransactionStatus>() {
        Ok(v) => v,
        Err(e) => return errors::workflow_error_to_response(e),
    };
    let req = UpdateTransactionStatus {
        transaction_id: id,
        status,
        notes: body.notes,
    };
    match services.billing.update_status(&principal, req).await {
        Ok((txn, certificate)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "transaction": dto::transaction_to_json(&txn),
                "certificate": certificate.as_ref().map(dto::certificate_to_json),
            })),
        )
            .into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
