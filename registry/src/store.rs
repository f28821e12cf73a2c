use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

use crate::document::DeploymentRegistry;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to serialize registry")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write registry to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads and writes the registry file. Loads never fail: a missing or
/// garbled file comes back as an empty document so a deployment can
/// always proceed. Saves go through a temp file in the same directory
/// and are renamed into place, so a crash mid-write leaves the previous
/// contents intact.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> DeploymentRegistry {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return DeploymentRegistry::default();
            }
            Err(err) => {
                warn!(
                    "could not read registry at {}, starting fresh: {}",
                    self.path.display(),
                    err
                );
                return DeploymentRegistry::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(
                    "registry at {} is not valid JSON, starting fresh: {}",
                    self.path.display(),
                    err
                );
                DeploymentRegistry::default()
            }
        }
    }

    pub fn save(&self, doc: &DeploymentRegistry) -> Result<(), RegistryError> {
        let json = serde_json::to_string_pretty(doc)?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|source| self.write_error(source))?;
        let mut tmp = NamedTempFile::new_in(&parent).map_err(|source| self.write_error(source))?;
        tmp.write_all(json.as_bytes())
            .map_err(|source| self.write_error(source))?;
        tmp.as_file()
            .sync_all()
            .map_err(|source| self.write_error(source))?;
        tmp.persist(&self.path)
            .map_err(|err| self.write_error(err.error))?;
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> RegistryError {
        RegistryError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
