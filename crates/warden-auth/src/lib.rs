//! Warden Authentication and Authorization
//!
//! This crate provides signed-token authentication and role-based
//! access control: key derivation, token issuance and decoding, the
//! request interceptor that establishes a per-request security context,
//! and the gate that enforces route requirements against it.

pub mod credentials;
pub mod error;
pub mod gate;
pub mod identity;
pub mod jwt;
pub mod key;
pub mod middleware;
pub mod password;

pub use credentials::{CredentialVerifier, UserStoreVerifier};
pub use error::{AuthError, KeyError, TokenError};
pub use gate::{AccessPolicy, AccessRule, Requirement, access_gate, authorize};
pub use identity::Identity;
pub use jwt::{Claims, TokenCodec};
pub use key::SigningKey;
pub use middleware::{BEARER_PREFIX, CurrentUser, SecurityContext, auth_middleware, extract_bearer_token};
pub use password::{hash_password, verify_password};
