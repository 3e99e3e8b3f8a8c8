/// How secrets in the Password column are compared and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    /// Exact string equality against the stored cell. Matches the seed
    /// sheet, which holds plaintext secrets.
    Plain,
    /// Argon2 hashes in the Password column.
    Argon2,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the sheet-bridge service. Unset means local in-memory
    /// mode with seed data.
    pub bridge_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub credential_scheme: CredentialScheme,
    /// Optional JSON file overriding the built-in module catalog.
    pub catalog_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = StoreConfig {
            bridge_url: std::env::var("STORE_BRIDGE_URL").ok(),
            api_token: std::env::var("STORE_API_TOKEN").ok(),
            timeout_secs: std::env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        let credential_scheme = match std::env::var("PASSWORD_SCHEME").as_deref() {
            Ok("argon2") => CredentialScheme::Argon2,
            Ok("plain") | Err(_) => CredentialScheme::Plain,
            Ok(other) => anyhow::bail!("unknown PASSWORD_SCHEME {other:?} (plain|argon2)"),
        };
        Ok(Self {
            store,
            credential_scheme,
            catalog_path: std::env::var("MODULE_CATALOG_PATH").ok(),
        })
    }
}
