//! Authorization gate
//!
//! Routes declare what they need in an [`AccessPolicy`] table; the
//! [`access_gate`] middleware looks up the matched route and evaluates the
//! requirement against the [`SecurityContext`] the interceptor installed.

use axum::{
    extract::{MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::AuthError;
use crate::middleware::SecurityContext;

/// What a route demands from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone, including anonymous callers
    Public,
    /// Any authenticated identity
    Authenticated,
    /// An identity holding at least one of these roles
    AnyRole(BTreeSet<String>),
}

impl Requirement {
    pub fn any_role<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Requirement::AnyRole(roles.into_iter().map(Into::into).collect())
    }
}

/// Evaluate a requirement against the current security context
pub fn authorize(requirement: &Requirement, context: &SecurityContext) -> Result<(), AuthError> {
    match (requirement, context.identity()) {
        (Requirement::Public, _) => Ok(()),
        (_, None) => Err(AuthError::Unauthenticated),
        (Requirement::Authenticated, Some(_)) => Ok(()),
        (Requirement::AnyRole(roles), Some(identity)) => {
            if identity.has_any_role(roles) {
                Ok(())
            } else {
                Err(AuthError::Forbidden)
            }
        }
    }
}

/// One entry of the policy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    /// `None` matches every method
    pub method: Option<Method>,
    /// Route pattern as registered with the router, e.g. `/api/user/{username}`
    pub path: String,
    pub requirement: Requirement,
}

/// Route → requirement table with a fallback for unlisted routes
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    default: Requirement,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(Requirement::Authenticated)
    }
}

impl AccessPolicy {
    pub fn new(default: Requirement) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    pub fn rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn route(self, path: &str, requirement: Requirement) -> Self {
        self.rule(AccessRule {
            method: None,
            path: path.to_string(),
            requirement,
        })
    }

    pub fn route_method(self, method: Method, path: &str, requirement: Requirement) -> Self {
        self.rule(AccessRule {
            method: Some(method),
            path: path.to_string(),
            requirement,
        })
    }

    pub fn permit_all(self, paths: &[&str]) -> Self {
        paths
            .iter()
            .fold(self, |policy, path| policy.route(path, Requirement::Public))
    }

    /// Resolve the requirement for a route
    ///
    /// Method-specific rules win over method-agnostic ones; unlisted routes
    /// get the default requirement.
    pub fn requirement_for(&self, method: &Method, path: &str) -> &Requirement {
        let matching = || self.rules.iter().filter(move |r| r.path == path);

        matching()
            .find(|r| r.method.as_ref() == Some(method))
            .or_else(|| matching().find(|r| r.method.is_none()))
            .map(|r| &r.requirement)
            .unwrap_or(&self.default)
    }
}

/// Authorization middleware
///
/// Must run after [`crate::auth_middleware`]; a request that never passed
/// the interceptor is treated as anonymous.
pub async fn access_gate(
    State(policy): State<Arc<AccessPolicy>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    {
        let path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or_else(|| request.uri().path());
        let requirement = policy.requirement_for(request.method(), path);
        let anonymous = SecurityContext::anonymous();
        let context = request
            .extensions()
            .get::<SecurityContext>()
            .unwrap_or(&anonymous);

        if let Err(err) = authorize(requirement, context) {
            info!(
                "Access denied to {} {}: {} (user: {})",
                request.method(),
                path,
                err,
                context.current_username().unwrap_or("anonymous")
            );
            return Err(err);
        }

        debug!("Access granted to {} {}", request.method(), path);
    }

    Ok(next.run(request).await)
}
