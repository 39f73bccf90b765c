use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("OAuth error: {0}")]
    OAuth(String),
    #[error("Google Sheets error: {0}")]
    Sheets(String),
    #[error("worksheet '{0}' not found in spreadsheet")]
    WorksheetNotFound(String),
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
    #[error("Invalid form input: {0}")]
    InvalidForm(String),
}
