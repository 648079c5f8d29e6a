use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use certportal_auth::{Principal, Role};
use certportal_core::UserId;

/// Derive the caller [`Principal`] from gateway-verified identity headers.
///
/// Token verification happens upstream (API gateway / reverse proxy); by the
/// time a request reaches this service, `x-user-id` and `x-user-role` carry
/// the authenticated identity. Requests without them are rejected outright.
pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let principal = extract_principal(req.headers())?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn extract_principal(headers: &HeaderMap) -> Result<Principal, StatusCode> {
    let user_id = header_value(headers, "x-user-id")?
        .parse::<UserId>()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let role = header_value(headers, "x-user-role")?
        .parse::<Role>()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok(Principal::new(user_id, role))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, StatusCode> {
    let value = headers
        .get(name)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .trim();
    if value.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(value)
}
