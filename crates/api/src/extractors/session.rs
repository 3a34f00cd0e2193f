//! Session authentication extractors.
//!
//! [`SessionAuth`] validates the bearer token. [`SellerAccess`] additionally
//! checks that the session may read the seller named in the `:seller_id`
//! path segment.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header::AUTHORIZATION, request::Parts},
};
use shared::jwt::{JwtError, VerifiedSession};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// An authenticated portal session.
#[derive(Debug, Clone, Copy)]
pub struct SessionAuth(pub VerifiedSession);

/// A session cleared to read one seller's earnings.
#[derive(Debug, Clone, Copy)]
pub struct SellerAccess {
    pub session: VerifiedSession,
    pub seller_id: Uuid,
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for SessionAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<VerifiedSession>() {
            return Ok(SessionAuth(*session));
        }

        let token = bearer_token(parts)?;
        let session = state.verifier.verify(token).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
        })?;

        parts.extensions.insert(session);
        Ok(SessionAuth(session))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SellerAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionAuth(session) = SessionAuth::from_request_parts(parts, state).await?;

        let Path(seller_id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation("seller_id must be a UUID".to_string()))?;

        if !session.can_view_seller(seller_id) {
            tracing::warn!(
                user_id = %session.user_id,
                seller_id = %seller_id,
                "Rejected earnings access for another seller"
            );
            return Err(ApiError::Forbidden(
                "You may only view your own earnings".to_string(),
            ));
        }

        Ok(SellerAccess { session, seller_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/sellers/x/earnings");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert!(matches!(
            bearer_token(&parts_with(None)),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&parts_with(Some("Bearer "))),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
