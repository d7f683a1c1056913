use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

pub const QUOTE_KEY: &str = "quote";
pub const FAVORITES_KEY: &str = "favorites";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key {0:?}")]
    InvalidKey(String),
    #[error("failed to access store file {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to serialize value for key {key:?}: {source}")]
    Serialize { key: String, source: serde_json::Error },
}

/// File-backed key/value store. Each key lives in `<root>/<key>.json`.
///
/// Keys are independent: writing one never touches another, so there is no
/// atomicity across keys. A single `set` is atomic (write then rename).
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"))
}

impl JsonStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::Io { path: root.clone(), source: e })?;
        debug!("store opened at {:?}", root);
        Ok(JsonStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if !key_pattern().is_match(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }

    /// Reads and decodes `key`. Absent, unreadable or undecodable entries
    /// all read as `None`; the latter two are logged.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("failed to open store entry {:?}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring undecodable store entry {:?}: {}", key, e);
                None
            }
        }
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).unwrap_or_default()
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp_path = self.root.join(format!(".{}.json.tmp", key));
        let io_err = |source: std::io::Error| StoreError::Io { path: tmp_path.clone(), source };

        let written = File::create(&tmp_path).map_err(io_err).and_then(|file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)
                .map_err(|e| StoreError::Serialize { key: key.to_string(), source: e })?;
            writer.flush().map_err(io_err)
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &path).map_err(|e| StoreError::Io { path: path.clone(), source: e })?;
        debug!("stored {:?}", key);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io { path, source: e }),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
    }
}
