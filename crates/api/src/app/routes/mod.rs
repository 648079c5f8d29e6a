use axum::{routing::get, Router};

pub mod applications;
pub mod system;
pub mod transactions;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/applications", applications::router())
        .nest("/transactions", transactions::router())
}
