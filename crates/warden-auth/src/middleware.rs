//! Request interceptor and security-context extractors
//!
//! The interceptor is lenient: it only establishes who is calling. A
//! missing or bad token leaves the request anonymous and the gate decides
//! later whether anonymous access is acceptable for the route.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::identity::Identity;
use crate::jwt::TokenCodec;

/// Literal marker preceding the token in the `Authorization` header
pub const BEARER_PREFIX: &str = "Bearer ";

/// Identity of the current request, or anonymous
///
/// Lives in the request extensions, so it never outlives or crosses the
/// request that created it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    identity: Option<Identity>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn current_username(&self) -> Option<&str> {
        self.identity.as_ref().map(Identity::subject)
    }
}

/// Extract the token from an `Authorization` header value
///
/// Only the exact, case-sensitive `Bearer ` prefix is recognised; anything
/// else (including an empty token) means "no token".
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Decodes the bearer token, if any, and stores the resulting
/// [`SecurityContext`] in the request extensions. Never rejects.
pub async fn auth_middleware(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    let context = match token.map(|t| codec.decode(t)) {
        Some(Ok(identity)) => {
            debug!(
                "Stored security context for '{}', uri: {}",
                identity.subject(),
                request.uri().path()
            );
            SecurityContext::authenticated(identity)
        }
        Some(Err(err)) => {
            debug!(
                reason = err.as_str(),
                "Ignoring invalid token, uri: {}",
                request.uri().path()
            );
            SecurityContext::anonymous()
        }
        None => {
            debug!("No bearer token, uri: {}", request.uri().path());
            SecurityContext::anonymous()
        }
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

impl<S> FromRequestParts<S> for SecurityContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extractor for the authenticated identity (required)
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::identity)
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::Unauthenticated)
    }
}
