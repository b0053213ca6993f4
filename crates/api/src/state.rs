//! Long-lived handles shared by every request.

use std::sync::Arc;

use tracing::{info, warn};

use pawmart_auth::{FirebaseTokenVerifier, Hs256TokenVerifier, TokenVerifier};
use pawmart_infra::{DocumentStore, InMemoryDocumentStore, MongoDocumentStore};

use crate::config::{AuthConfig, Config, StoreConfig};

/// Shared storage handle injected into handlers.
pub type StoreHandle = Arc<dyn DocumentStore>;

/// Shared identity collaborator used by the access gate.
pub type VerifierHandle = Arc<dyn TokenVerifier>;

#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    pub verifier: VerifierHandle,
}

impl AppState {
    pub fn new(store: StoreHandle, verifier: VerifierHandle) -> Self {
        Self { store, verifier }
    }

    /// Initialize the store and verifier once, at startup.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: StoreHandle = match &config.store {
            StoreConfig::Memory => {
                warn!("using in-memory document store; data is lost on exit");
                Arc::new(InMemoryDocumentStore::new())
            }
            StoreConfig::Mongo(options) => {
                info!(database = %options.database, "connecting to mongodb");
                let store = MongoDocumentStore::connect(options.clone()).await?;
                if let Err(e) = store.ping().await {
                    warn!(error = %e, "mongodb ping failed; continuing, the driver will reconnect");
                }
                Arc::new(store)
            }
        };

        let verifier: VerifierHandle = match &config.auth {
            AuthConfig::Firebase { project_id } => {
                info!(project_id = %project_id, "verifying firebase id tokens");
                Arc::new(FirebaseTokenVerifier::new(project_id.clone()))
            }
            AuthConfig::Hs256 { secret } => {
                warn!("verifying HS256 tokens with a shared secret; not for production");
                Arc::new(Hs256TokenVerifier::new(secret))
            }
        };

        Ok(Self::new(store, verifier))
    }
}
