use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::auth::password::Credentials;
use crate::auth::sessions::Sessions;
use crate::config::AppConfig;
use crate::progression::catalog::ModuleCatalog;
use crate::store::{MemoryStore, RestStore, TabularStore};
use crate::{attendance, users};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TabularStore>,
    pub sessions: Sessions,
    pub catalog: Arc<ModuleCatalog>,
    pub credentials: Credentials,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn TabularStore> = match &config.store.bridge_url {
            Some(url) => {
                info!(%url, "using sheet-bridge store");
                Arc::new(RestStore::new(
                    url,
                    config.store.api_token.clone(),
                    Duration::from_secs(config.store.timeout_secs),
                )?)
            }
            None => {
                warn!("STORE_BRIDGE_URL not set, running on the in-memory seed store");
                Arc::new(seed_store())
            }
        };

        // Probe once so a dead bridge is visible at startup. The process
        // still comes up; clients get retryable 503s until the store is
        // reachable again.
        if let Err(e) = store.fetch_rows(users::repo::TABLE).await {
            warn!(error = %e, "store unreachable at startup, serving degraded");
        }

        let catalog = match &config.catalog_path {
            Some(path) => ModuleCatalog::from_json_file(path)?,
            None => ModuleCatalog::builtin(),
        };
        info!(modules = catalog.len(), "module catalog loaded");

        let credentials = Credentials::new(config.credential_scheme);

        Ok(Self {
            store,
            sessions: Sessions::new(),
            catalog: Arc::new(catalog),
            credentials,
            config,
        })
    }

    pub fn from_parts(
        store: Arc<dyn TabularStore>,
        catalog: ModuleCatalog,
        credentials: Credentials,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            sessions: Sessions::new(),
            catalog: Arc::new(catalog),
            credentials,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{CredentialScheme, StoreConfig};

        let config = Arc::new(AppConfig {
            store: StoreConfig {
                bridge_url: None,
                api_token: None,
                timeout_secs: 1,
            },
            credential_scheme: CredentialScheme::Plain,
            catalog_path: None,
        });

        Self::from_parts(
            Arc::new(seed_store()),
            ModuleCatalog::builtin(),
            Credentials::new(CredentialScheme::Plain),
            config,
        )
    }
}

/// Seed data mirroring the shared sheet's layout, so the binary runs (and
/// tests exercise the full surface) without a bridge endpoint.
fn seed_store() -> MemoryStore {
    use crate::store::row;

    MemoryStore::new()
        .seed(
            users::repo::TABLE,
            vec![
                row(&[
                    ("Username", "Nova"),
                    ("Password", "starling"),
                    ("Role", "Member"),
                    ("Level", "1"),
                    ("XP", "0"),
                ]),
                row(&[
                    ("Username", "Vega"),
                    ("Password", "hq-override"),
                    ("Role", "Admin"),
                    ("Level", "4"),
                    ("XP", "300"),
                ]),
            ],
        )
        .seed(attendance::ledger::TABLE, vec![])
}
