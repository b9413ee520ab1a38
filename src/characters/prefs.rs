//! Small persisted key/value store for player preferences.
use std::{
    collections::BTreeMap,
    fs::{self, create_dir_all},
    io,
    path::{Path, PathBuf},
};

use bevy::{log::warn, prelude::Resource};
use serde_json::Value;

/// Preferences kept as a flat JSON object on disk.
#[derive(Resource, Debug, Clone, Default)]
pub struct PrefsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, Value>,
}

impl PrefsStore {
    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Reads `path`, starting empty when it is missing or unreadable.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
                Ok(values) => values,
                Err(err) => {
                    warn!(
                        target: "dialogue",
                        "Failed to parse prefs {} ({}). Starting empty.",
                        path.display(),
                        err
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(
                    target: "dialogue",
                    "Failed to read prefs {} ({}). Starting empty.",
                    path.display(),
                    err
                );
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path),
            values,
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    pub fn set_i64(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), Value::from(value));
    }

    pub fn delete_key(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes every key back to disk. In-memory stores succeed without writing.
    pub fn save(&self) -> io::Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.values)?;
        fs::write(path, raw)
    }
}
