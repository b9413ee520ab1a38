//! Per-NPC small-talk pools backing generated dialogue lines.
use std::{
    collections::{BTreeMap, HashMap},
    fmt, fs,
    path::Path,
};

use bevy::{
    log::{debug, info, warn},
    prelude::Resource,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;

use crate::dialogue::{
    config::GeneratedSettings,
    providers::{GeneratedLineProvider, FALLBACK_LINE},
};

/// JSON layout of a pool file.
#[derive(Debug, Deserialize)]
struct PoolFile {
    #[serde(rename = "dialogLines", default)]
    dialog_lines: Vec<String>,
}

#[derive(Debug)]
pub enum PoolError {
    Read(String),
    Parse(String),
    Empty,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(message) => write!(f, "unable to read pool: {}", message),
            Self::Parse(message) => write!(f, "invalid pool json: {}", message),
            Self::Empty => write!(f, "pool has no dialog lines"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Parses `{ "dialogLines": [...] }`, dropping blank entries.
pub fn parse_pool(raw: &str) -> Result<Vec<String>, PoolError> {
    let file: PoolFile =
        serde_json::from_str(raw).map_err(|err| PoolError::Parse(err.to_string()))?;
    let lines: Vec<String> = file
        .dialog_lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return Err(PoolError::Empty);
    }
    Ok(lines)
}

#[derive(Debug, Clone)]
struct Pool {
    name: String,
    lines: Vec<String>,
    hybrid: bool,
}

/// Loaded pools plus per-key sequential cursors.
#[derive(Resource)]
pub struct NpcLinePools {
    pools: HashMap<String, Pool>,
    /// Index last handed out in sequential mode.
    cursors: HashMap<String, usize>,
    fallbacks: BTreeMap<String, String>,
    hybrid_names: Vec<String>,
    rng: StdRng,
}

impl NpcLinePools {
    pub fn new(fallbacks: BTreeMap<String, String>, hybrid_names: Vec<String>) -> Self {
        Self::with_rng(fallbacks, hybrid_names, StdRng::from_entropy())
    }

    /// Deterministic random picks.
    pub fn seeded(seed: u64, fallbacks: BTreeMap<String, String>, hybrid_names: Vec<String>) -> Self {
        Self::with_rng(fallbacks, hybrid_names, StdRng::seed_from_u64(seed))
    }

    fn with_rng(fallbacks: BTreeMap<String, String>, hybrid_names: Vec<String>, rng: StdRng) -> Self {
        Self {
            pools: HashMap::new(),
            cursors: HashMap::new(),
            fallbacks: fallbacks
                .into_iter()
                .map(|(key, line)| (fold(&key), line))
                .collect(),
            hybrid_names,
            rng,
        }
    }

    /// Builds the pools listed in `settings`, skipping files that fail to load.
    pub fn load(settings: &GeneratedSettings) -> Self {
        let mut pools = match settings.seed {
            Some(seed) => Self::seeded(seed, settings.fallbacks.clone(), settings.hybrid.clone()),
            None => Self::new(settings.fallbacks.clone(), settings.hybrid.clone()),
        };

        let mut failed = 0;
        for (name, path) in &settings.pools {
            if let Err(err) = pools.load_file(name, path) {
                warn!(
                    target: "dialogue",
                    "Failed to load lines for {} from {}: {}",
                    name,
                    path.display(),
                    err
                );
                failed += 1;
            }
        }

        info!(
            target: "dialogue",
            "Loaded {} NPC line pools ({} failed)",
            pools.pools.len(),
            failed
        );
        pools
    }

    pub fn load_file(&mut self, name: &str, path: &Path) -> Result<(), PoolError> {
        let raw = fs::read_to_string(path).map_err(|err| PoolError::Read(err.to_string()))?;
        let lines = parse_pool(&raw)?;
        let hybrid = self.is_listed_hybrid(name);
        self.insert_pool(name, lines, hybrid)
    }

    /// Adds or replaces a pool. Empty pools are rejected.
    pub fn insert_pool(
        &mut self,
        name: &str,
        lines: Vec<String>,
        hybrid: bool,
    ) -> Result<(), PoolError> {
        let lines: Vec<String> = lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return Err(PoolError::Empty);
        }

        let key = fold(name);
        debug!(
            target: "dialogue",
            "Pool {} has {} lines{}",
            name.trim(),
            lines.len(),
            if hybrid { " (hybrid)" } else { "" }
        );
        self.cursors.remove(&key);
        self.pools.insert(
            key,
            Pool {
                name: name.trim().to_string(),
                lines,
                hybrid,
            },
        );
        Ok(())
    }

    pub fn line_count(&self, key: &str) -> usize {
        self.pools.get(&fold(key)).map_or(0, |pool| pool.lines.len())
    }

    /// Display names of every loaded pool, sorted.
    pub fn loaded_keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.values().map(|pool| pool.name.clone()).collect();
        names.sort();
        names
    }

    /// Characters who are playable but also chat from a pool.
    pub fn is_hybrid(&self, name: &str) -> bool {
        match self.pools.get(&fold(name)) {
            Some(pool) => pool.hybrid,
            None => self.is_listed_hybrid(name),
        }
    }

    pub fn reset_all_cursors(&mut self) {
        self.cursors.clear();
        info!(target: "dialogue", "All sequential line cursors reset");
    }

    fn is_listed_hybrid(&self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty()
            && self
                .hybrid_names
                .iter()
                .any(|hybrid| hybrid.trim().eq_ignore_ascii_case(name))
    }

    fn fallback(&self, key: &str) -> String {
        self.fallbacks
            .get(key)
            .cloned()
            .unwrap_or_else(|| FALLBACK_LINE.to_string())
    }
}

impl GeneratedLineProvider for NpcLinePools {
    fn random_line(&mut self, key: &str) -> String {
        let key = fold(key);
        if key.is_empty() {
            warn!(target: "dialogue", "Random line requested without an NPC key");
            return FALLBACK_LINE.to_string();
        }

        match self.pools.get(&key) {
            Some(pool) => {
                let index = self.rng.gen_range(0..pool.lines.len());
                pool.lines[index].clone()
            }
            None => {
                debug!(target: "dialogue", "No pool for '{}', using fallback", key);
                self.fallback(&key)
            }
        }
    }

    fn sequential_line(&mut self, key: &str) -> String {
        let key = fold(key);
        if key.is_empty() {
            warn!(target: "dialogue", "Sequential line requested without an NPC key");
            return FALLBACK_LINE.to_string();
        }

        let Some(pool) = self.pools.get(&key) else {
            debug!(target: "dialogue", "No pool for '{}', using fallback", key);
            return self.fallback(&key);
        };

        let next = match self.cursors.get(&key) {
            Some(last) => (last + 1) % pool.lines.len(),
            None => 0,
        };
        self.cursors.insert(key, next);
        pool.lines[next].clone()
    }

    fn has_lines_for(&self, key: &str) -> bool {
        let key = fold(key);
        !key.is_empty() && self.pools.contains_key(&key)
    }

    fn reset_sequence_cursor(&mut self, key: &str) {
        self.cursors.remove(&fold(key));
    }
}

impl fmt::Debug for NpcLinePools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NpcLinePools")
            .field("pools", &self.loaded_keys())
            .field("cursors", &self.cursors)
            .finish()
    }
}

fn fold(key: &str) -> String {
    key.trim().to_lowercase()
}
