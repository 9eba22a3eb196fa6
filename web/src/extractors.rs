//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation id (set by the middleware,
//!   read from the header, or freshly generated)
//! - `CallerId`: the authenticated caller, forwarded by the gateway in
//!   `X-User-Id`
//!
//! # Examples
//!
//! ```ignore
//! use volunteer_hub_web::extractors::{CallerId, CorrelationId};
//!
//! async fn handler(caller: CallerId, correlation_id: CorrelationId) -> String {
//!     tracing::info!(caller = %caller.0, correlation_id = %correlation_id.0, "Processing request");
//!     caller.0.to_string()
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;
use volunteer_hub_core::types::UserId;

/// Header carrying the caller's user id.
pub const CALLER_ID_HEADER: &str = "X-User-Id";

/// Correlation ID for request tracing.
///
/// Prefers the id stored by [`correlation_id_layer`](crate::middleware::correlation_id_layer),
/// then the `X-Correlation-ID` header, then a new UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Identity of the user making the request.
///
/// Rejects with 401 when the header is absent and 400 when it is not a UUID.
/// Use `Option<CallerId>` for endpoints that also serve anonymous callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_ID_HEADER)
            .ok_or_else(|| AppError::unauthorized("Authentication required."))?;

        let id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| AppError::bad_request(format!("{CALLER_ID_HEADER} must be a UUID")))?;

        Ok(Self(UserId::from_uuid(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).expect("Valid request").into_parts().0
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let mut parts = parts(Request::builder().header(CORRELATION_ID_HEADER, uuid.to_string()));

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn extension_wins_over_header() {
        let stored = Uuid::new_v4();
        let mut parts = parts(Request::builder().header(CORRELATION_ID_HEADER, Uuid::new_v4().to_string()));
        parts.extensions.insert(CorrelationId(stored));

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, stored);
    }

    #[tokio::test]
    async fn test_correlation_id_generates_new() {
        let mut parts = parts(Request::builder());
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_ne!(correlation_id.0, Uuid::nil());
    }

    #[tokio::test]
    async fn caller_id_is_read_from_header() {
        let user = UserId::new();
        let mut parts = parts(Request::builder().header(CALLER_ID_HEADER, user.to_string()));

        let caller = CallerId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(caller.0, user);
    }

    #[tokio::test]
    async fn missing_caller_is_unauthorized() {
        let mut parts = parts(Request::builder());
        let err = CallerId::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_caller_is_bad_request() {
        let mut parts = parts(Request::builder().header(CALLER_ID_HEADER, "admin"));
        let err = CallerId::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
