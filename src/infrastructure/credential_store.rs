use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SECRETS_SECTION: &str = "google";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Google service-account key, as issued in the console's JSON download.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn validate(&self) -> Result<(), InfraError> {
        if self.client_email.trim().is_empty() {
            return Err(InfraError::Credential(
                "service account client_email must not be empty".to_string(),
            ));
        }
        if !self.private_key.contains("PRIVATE KEY") {
            return Err(InfraError::Credential(
                "service account private_key is not a PEM key".to_string(),
            ));
        }
        if self.token_uri.trim().is_empty() {
            return Err(InfraError::Credential(
                "service account token_uri must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

pub trait CredentialStore: Send + Sync {
    fn load_service_account(&self) -> Result<Option<ServiceAccountKey>, InfraError>;
}

/// Reads the `[google]` table of a host secrets file.
#[derive(Debug, Clone)]
pub struct TomlSecretsCredentialStore {
    path: PathBuf,
}

impl TomlSecretsCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for TomlSecretsCredentialStore {
    fn load_service_account(&self) -> Result<Option<ServiceAccountKey>, InfraError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let mut sections: HashMap<String, toml::Value> = toml::from_str(&raw)?;
        let Some(section) = sections.remove(SECRETS_SECTION) else {
            return Ok(None);
        };
        let key: ServiceAccountKey = section.try_into().map_err(|error: toml::de::Error| {
            InfraError::Credential(format!(
                "invalid [{SECRETS_SECTION}] section in {}: {error}",
                self.path.display()
            ))
        })?;
        key.validate()?;
        Ok(Some(key))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    key: Mutex<Option<ServiceAccountKey>>,
}

impl InMemoryCredentialStore {
    pub fn with_key(key: ServiceAccountKey) -> Self {
        Self {
            key: Mutex::new(Some(key)),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load_service_account(&self) -> Result<Option<ServiceAccountKey>, InfraError> {
        let guard = self
            .key
            .lock()
            .map_err(|error| InfraError::Credential(format!("in-memory lock poisoned: {error}")))?;
        Ok(guard.clone())
    }
}
