use crate::domain::models::WateringConfig;
use crate::infrastructure::error::InfraError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const LAST_CONFIG_JSON: &str = "last_config.json";

pub trait ConfigRepository: Send + Sync {
    /// Missing or unreadable records come back as `None`; they never block the form.
    fn load(&self) -> Option<WateringConfig>;
    fn save(&self, config: &WateringConfig) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileConfigRepository {
    path: PathBuf,
}

impl JsonFileConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(LAST_CONFIG_JSON))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_config(&self) -> Result<Option<WateringConfig>, InfraError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let parsed: WateringConfig = serde_json::from_str(&raw)?;
        Ok(Some(parsed))
    }
}

impl ConfigRepository for JsonFileConfigRepository {
    fn load(&self) -> Option<WateringConfig> {
        match self.read_config() {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %error,
                    "ignoring unreadable watering config"
                );
                None
            }
        }
    }

    fn save(&self, config: &WateringConfig) -> Result<(), InfraError> {
        let formatted = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, format!("{formatted}\n"))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryConfigRepository {
    config: Mutex<Option<WateringConfig>>,
    fail_saves: bool,
}

impl InMemoryConfigRepository {
    pub fn with_config(config: WateringConfig) -> Self {
        Self {
            config: Mutex::new(Some(config)),
            fail_saves: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            config: Mutex::new(None),
            fail_saves: true,
        }
    }
}

impl ConfigRepository for InMemoryConfigRepository {
    fn load(&self) -> Option<WateringConfig> {
        self.config.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, config: &WateringConfig) -> Result<(), InfraError> {
        if self.fail_saves {
            return Err(InfraError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "config store is read-only",
            )));
        }
        let mut guard = self
            .config
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("in-memory lock poisoned: {error}")))?;
        *guard = Some(config.clone());
        Ok(())
    }
}
