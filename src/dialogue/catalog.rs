//! Authored sequence files loaded into the [`SequenceStore`].
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use bevy::log::{info, warn};
use serde::Deserialize;

use super::{store::SequenceStore, types::DialogueSequence};

/// On-disk layout: a list of `[[sequences]]` tables.
#[derive(Debug, Clone, Deserialize, Default)]
struct CatalogFile {
    #[serde(default)]
    sequences: Vec<DialogueSequence>,
}

#[derive(Debug)]
pub enum CatalogError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "unable to read {}: {}", path.display(), message)
            }
            Self::Parse { path, message } => {
                write!(f, "invalid sequence file {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Parses sequence definitions from TOML text.
pub fn parse_sequences(raw: &str, origin: &Path) -> Result<Vec<DialogueSequence>, CatalogError> {
    let file: CatalogFile = toml::from_str(raw).map_err(|err| CatalogError::Parse {
        path: origin.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(file.sequences)
}

pub fn load_file(path: &Path) -> Result<Vec<DialogueSequence>, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|err| CatalogError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    parse_sequences(&raw, path)
}

/// Registers every sequence found in `files`, skipping files that fail to load.
///
/// Returns how many sequences were registered.
pub fn load_into(store: &mut SequenceStore, files: &[PathBuf]) -> usize {
    let mut registered = 0;
    for path in files {
        let sequences = match load_file(path) {
            Ok(sequences) => sequences,
            Err(err) => {
                warn!(target: "dialogue", "{}. Skipping.", err);
                continue;
            }
        };

        for sequence in sequences {
            if !sequence.is_valid() {
                warn!(
                    target: "dialogue",
                    "Sequence '{}' in {} has no displayable lines",
                    sequence.name,
                    path.display()
                );
            }
            store.register(sequence);
            registered += 1;
        }
    }

    info!(
        target: "dialogue",
        "Loaded {} dialogue sequences from {} files",
        registered,
        files.len()
    );
    registered
}
