use crate::model::{Id, Identity};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::Json,
};

use crate::api::handlers::ErrorResponse;

/// Axum extractor for the request identity.
///
/// The surface in front of this service (session middleware, auth proxy)
/// resolves who is calling and forwards it in headers:
/// - `X-User-Id`: authenticated user id
/// - `X-Guest-Session`: anonymous session id
///
/// A request carrying both is treated as the user (a logged-in customer
/// may still hold its old guest cookie). A request carrying neither has no
/// identity to own a cart and is rejected.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        if let Some(user_id) = extract_header_value(headers, "x-user-id") {
            return Ok(Identity::User(user_id));
        }
        if let Some(session) = extract_header_value(headers, "x-guest-session") {
            return Ok(Identity::Guest(session));
        }

        Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Missing identity: set X-User-Id or X-Guest-Session",
            )),
        ))
    }
}

/// Optional admin attribution for back-office operations, from the
/// `X-Admin-Id` header. Absence is fine; the action is then recorded as
/// system-generated.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub admin_id: Option<Id>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AdminContext {
            admin_id: extract_header_value(&parts.headers, "x-admin-id"),
        })
    }
}

/// Extract header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string())
}
