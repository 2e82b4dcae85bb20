//! Authenticated identity

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An authenticated subject and the roles granted to it
///
/// Produced by credential verification or by decoding a token. Held only
/// for the duration of a request or an issuance call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    subject: String,
    roles: BTreeSet<String>,
}

impl Identity {
    pub fn new<I, R>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            subject: subject.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True when at least one of `roles` is granted
    pub fn has_any_role<'a, I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        roles.into_iter().any(|r| self.roles.contains(r))
    }
}
