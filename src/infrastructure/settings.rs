use crate::infrastructure::error::InfraError;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_SPREADSHEET_ID: &str = "1wEIyYVWcfgj71z2UMk5_pSXAB8B07Zl0GF9kOUbWFQI";
pub const DEFAULT_SHEET_NAME: &str = "工作表1";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const SECRETS_TOML: &str = "secrets.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub workspace_root: PathBuf,
    pub bind_addr: SocketAddr,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub secrets_path: PathBuf,
    pub scopes: Vec<String>,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, InfraError> {
        let current_dir = std::env::current_dir()?;
        Self::from_lookup(current_dir, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(current_dir: PathBuf, lookup: F) -> Result<Self, InfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let workspace_root = optional_lookup_value(&lookup, &["AGAVE_WORKSPACE"])
            .map(PathBuf::from)
            .unwrap_or(current_dir);
        let raw_bind_addr = optional_lookup_value(&lookup, &["AGAVE_BIND_ADDR"])
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_bind_addr.parse::<SocketAddr>().map_err(|error| {
            InfraError::InvalidConfig(format!("invalid AGAVE_BIND_ADDR '{raw_bind_addr}': {error}"))
        })?;
        let spreadsheet_id = optional_lookup_value(&lookup, &["AGAVE_SPREADSHEET_ID"])
            .unwrap_or_else(|| DEFAULT_SPREADSHEET_ID.to_string());
        let sheet_name = optional_lookup_value(&lookup, &["AGAVE_SHEET_NAME"])
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());
        let secrets_path = optional_lookup_value(&lookup, &["AGAVE_SECRETS_PATH"])
            .map(PathBuf::from)
            .unwrap_or_else(|| workspace_root.join(SECRETS_TOML));
        let scopes = optional_lookup_value(&lookup, &["AGAVE_GOOGLE_SCOPES"])
            .map(|raw| parse_scope_list(&raw))
            .filter(|scopes| !scopes.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_SCOPE.to_string()]);

        Ok(Self {
            workspace_root,
            bind_addr,
            spreadsheet_id,
            sheet_name,
            secrets_path,
            scopes,
        })
    }
}

fn optional_lookup_value<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = lookup(key) {
            let normalized = value.trim();
            if !normalized.is_empty() {
                return Some(normalized.to_string());
            }
        }
    }
    None
}

fn parse_scope_list(raw: &str) -> Vec<String> {
    raw.split([',', ' ', '\n', '\t'])
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
