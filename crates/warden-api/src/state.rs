//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use warden_auth::{CredentialVerifier, TokenCodec, UserStoreVerifier};
use warden_db::Database;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// State backed by the user store for credential checks
    pub fn new(db: Database, codec: Arc<TokenCodec>) -> Self {
        let verifier = Arc::new(UserStoreVerifier::new(db.clone()));
        Self::with_verifier(db, codec, verifier)
    }

    pub fn with_verifier(
        db: Database,
        codec: Arc<TokenCodec>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            db,
            codec,
            verifier,
        }
    }
}
