//! Bearer-token authentication.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use khata_db::Caller;
use khata_shared::{AppError, Claims, JwtError, Role};
use tracing::debug;

use crate::{AppState, error::ApiError};

/// Token from `Authorization: Bearer <token>`, scheme matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = bearer_token(headers).ok_or_else(|| {
        AppError::Unauthorized("Authorization header with Bearer token is required".into())
    })?;
    state.jwt_service.verify(token).map_err(|e| {
        debug!(error = %e, "bearer token refused");
        AppError::Unauthorized(
            match e {
                JwtError::Expired => "Token has expired",
                JwtError::Invalid(_) | JwtError::Signing(_) => "Invalid or malformed token",
            }
            .into(),
        )
    })
}

/// Rejects requests without a valid token and stores the claims for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// The verified caller of a protected route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Subject of the token.
    #[must_use]
    pub fn user_id(&self) -> uuid::Uuid {
        self.0.user_id()
    }

    /// Role carried in the token.
    #[must_use]
    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Repository caller stamped with the current time.
    #[must_use]
    pub fn caller(&self) -> Caller {
        Caller::new(self.0.role)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Claims>() {
            Some(claims) => Ok(Self(claims.clone())),
            None => Err(AppError::Unauthorized("Authentication required".into()).into()),
        }
    }
}
