use crate::infrastructure::config::LAST_CONFIG_JSON;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::record_log::RECORDS_TXT;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub config_path: PathBuf,
    pub records_path: PathBuf,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let data_dir = workspace_root.join("data");
    let logs_dir = workspace_root.join("logs");

    fs::create_dir_all(&data_dir)?;
    fs::create_dir_all(&logs_dir)?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_path: data_dir.join(LAST_CONFIG_JSON),
        records_path: data_dir.join(RECORDS_TXT),
        data_dir,
        logs_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_data_and_logs_directories() {
        let root = std::env::temp_dir().join(format!("agave-bootstrap-tests-{}", std::process::id()));
        let result = bootstrap_workspace(&root).expect("bootstrap workspace");

        assert!(result.data_dir.is_dir());
        assert!(result.logs_dir.is_dir());
        assert_eq!(result.config_path, root.join("data").join(LAST_CONFIG_JSON));
        assert_eq!(result.records_path, root.join("data").join(RECORDS_TXT));
        assert!(!result.config_path.exists());

        bootstrap_workspace(&root).expect("bootstrap is idempotent");
        let _ = fs::remove_dir_all(root);
    }
}
