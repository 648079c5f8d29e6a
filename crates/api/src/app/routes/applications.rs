use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use certportal_applications::{
    ApplicationId, ApplicationType, ApproveApplication, CreateApplication, QualificationTier,
    RejectApplication, StartReview, SubmitApplication,
};
use certportal_auth::Principal;
use certportal_core::CompanyId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create))
        .route("/:id", get(view))
        .route("/:id/submit", post(submit))
        .route("/:id/review", post(start_review))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
}

fn parse_id(raw: &str) -> Result<ApplicationId, axum::response::Response> {
    raw.parse::<ApplicationId>().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid application id")
    })
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<dto::CreateApplicationRequest>,
) -> axum::response::Response {
    let company_id = match body.company_id.parse::<CompanyId>() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid company_id")
        }
    };
    let application_type = match body.application_type.parse::<ApplicationType>() {
        Ok(v) => v,
        Err(e) => return errors::workflow_error_to_response(e),
    };
    let qualification = match body.qualification.parse::<QualificationTier>() {
        Ok(v) => v,
        Err(e) => return errors::workflow_error_to_response(e),
    };

    let req = CreateApplication {
        company_id,
        application_type,
        classification: body.classification,
        business_field: body.business_field,
        qualification,
    };
    match services.lifecycle.create(&principal, req).await {
        Ok(app) => (StatusCode::CREATED, Json(dto::application_to_json(&app))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn view(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.lifecycle.view(&principal, id).await {
        Ok(app) => (StatusCode::OK, Json(dto::application_to_json(&app))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn submit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .lifecycle
        .submit(&principal, SubmitApplication { application_id: id })
        .await
    {
        Ok(app) => (StatusCode::OK, Json(dto::application_to_json(&app))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn start_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .lifecycle
        .start_review(&principal, StartReview { application_id: id })
        .await
    {
        Ok(app) => (StatusCode::OK, Json(dto::application_to_json(&app))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn approve(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .lifecycle
        .approve(&principal, ApproveApplication { application_id: id })
        .await
    {
        Ok(app) => (StatusCode::OK, Json(dto::application_to_json(&app))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn reject(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<dto::RejectApplicationRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .lifecycle
        .reject(
            &principal,
            RejectApplication {
                application_id: id,
                reason: body.reason,
            },
        )
        .await
    {
        Ok(app) => (StatusCode::OK, Json(dto::application_to_json(&app))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
