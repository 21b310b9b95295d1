//! File-backed snapshot persistence for the interactive front end.

use orrery_engine::{SessionSnapshot, SessionStore};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("save file is not a valid snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Stores one snapshot per save name as pretty-printed JSON under a
/// directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl SessionStore for FileStore {
    type Error = StoreError;

    fn save(&self, name: &str, snapshot: &SessionSnapshot) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.path_for(name), json)?;
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<SessionSnapshot>, Self::Error> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn delete(&self, name: &str) -> Result<(), Self::Error> {
        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
