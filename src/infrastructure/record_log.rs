use crate::infrastructure::error::InfraError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const RECORDS_TXT: &str = "records.txt";

pub trait LogSink: Send + Sync {
    fn append(&self, block: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct FileLogSink {
    path: PathBuf,
}

impl FileLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(RECORDS_TXT))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileLogSink {
    fn append(&self, block: &str) -> Result<(), InfraError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLogSink {
    blocks: Mutex<Vec<String>>,
    fail_appends: bool,
}

impl InMemoryLogSink {
    pub fn failing() -> Self {
        Self {
            blocks: Mutex::new(Vec::new()),
            fail_appends: true,
        }
    }

    pub fn blocks(&self) -> Vec<String> {
        self.blocks
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl LogSink for InMemoryLogSink {
    fn append(&self, block: &str) -> Result<(), InfraError> {
        if self.fail_appends {
            return Err(InfraError::Io(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "record log is full",
            )));
        }
        let mut guard = self
            .blocks
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("in-memory lock poisoned: {error}")))?;
        guard.push(block.to_string());
        Ok(())
    }
}
