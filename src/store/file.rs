use super::{CommandMap, CommandStore};
use crate::errors::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an empty store when the file does not exist yet. Returns
    /// whether a file was created.
    pub fn ensure_exists(&self) -> AppResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        write_json_file(&self.path, &CommandMap::new())?;
        Ok(true)
    }
}

impl CommandStore for JsonFileStore {
    fn load(&self) -> AppResult<CommandMap> {
        read_json_file(&self.path).inspect_err(|error| {
            tracing::error!(path = %self.path.display(), error = %error, "error reading command store");
        })
    }

    fn save(&self, commands: &CommandMap) -> AppResult<()> {
        write_json_file(&self.path, commands).inspect_err(|error| {
            tracing::error!(path = %self.path.display(), error = %error, "error writing command store");
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn write_json_file<T: serde::Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| AppError::StoreWrite(error.to_string()))?;
    }
    let bytes = serde_json::to_vec_pretty(value).map_err(|error| AppError::StoreWrite(error.to_string()))?;
    fs::write(path, bytes).map_err(|error| AppError::StoreWrite(error.to_string()))
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let bytes = fs::read(path).map_err(|error| AppError::StoreRead(format!("{}: {}", path.display(), error)))?;
    serde_json::from_slice(&bytes).map_err(|error| AppError::StoreRead(format!("{}: {}", path.display(), error)))
}
