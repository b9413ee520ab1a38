//! Dialogue settings sourced from `config/dialogue.toml`.
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use bevy::{log::warn, prelude::Resource};
use serde::Deserialize;

use super::{
    classifier::{NarrationPolicy, DEFAULT_NARRATION_TOKENS},
    manager::ManagerSettings,
    player::PlayerSettings,
};

const CONFIG_PATH: &str = "config/dialogue.toml";
const CONFIG_PATH_ENV: &str = "DIALOGUE_CONFIG_PATH";
const PREFS_PATH_ENV: &str = "DIALOGUE_PREFS_PATH";
/// Upper bound on the per-character reveal delay.
const MAX_REVEAL_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Deserialize, Default)]
struct RawDialogueConfig {
    #[serde(default)]
    playback: RawPlayback,
    #[serde(default)]
    narration: RawNarration,
    #[serde(default)]
    gating: RawGating,
    #[serde(default)]
    catalog: RawCatalog,
    #[serde(default)]
    generated: RawGenerated,
    #[serde(default)]
    areas: RawAreas,
    #[serde(default)]
    history: RawHistory,
    #[serde(default)]
    characters: RawCharacters,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawPlayback {
    reveal_interval_ms: u64,
    skip_on_advance: bool,
    narration_display_name: String,
}

impl Default for RawPlayback {
    fn default() -> Self {
        let defaults = PlayerSettings::default();
        Self {
            reveal_interval_ms: defaults.reveal_interval.as_millis() as u64,
            skip_on_advance: defaults.skip_on_advance,
            narration_display_name: defaults.narration_display_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawNarration {
    empty_is_narration: bool,
    tokens: Vec<String>,
}

impl Default for RawNarration {
    fn default() -> Self {
        Self {
            empty_is_narration: true,
            tokens: DEFAULT_NARRATION_TOKENS
                .iter()
                .map(|token| token.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawGating {
    validate_objectives: bool,
    strict_mode: bool,
    casual_prefixes: Vec<String>,
}

impl Default for RawGating {
    fn default() -> Self {
        Self {
            validate_objectives: true,
            strict_mode: true,
            casual_prefixes: ManagerSettings::default().casual_prefixes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawCatalog {
    files: Vec<String>,
}

impl Default for RawCatalog {
    fn default() -> Self {
        Self {
            files: vec!["assets/dialogue/story.toml".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawGenerated {
    pools: BTreeMap<String, String>,
    fallbacks: BTreeMap<String, String>,
    hybrid: Vec<String>,
    seed: Option<u64>,
}

impl Default for RawGenerated {
    fn default() -> Self {
        let fallbacks = [
            ("jack", "Halo, apa kabar?"),
            ("omar", "Bagaimana harimu?"),
            ("pak satya", "Selamat siang."),
            ("paksatya", "Selamat siang."),
            ("ethan", "Hey there!"),
            ("kanaya", "Hai teman!"),
        ];

        Self {
            pools: BTreeMap::new(),
            fallbacks: fallbacks
                .iter()
                .map(|(key, line)| (key.to_string(), line.to_string()))
                .collect(),
            hybrid: vec!["Kanaya".to_string()],
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawAreas {
    progression: Vec<String>,
}

impl Default for RawAreas {
    fn default() -> Self {
        Self {
            progression: ManagerSettings::default().areas,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawHistory {
    capacity: usize,
    log_path: Option<String>,
}

impl Default for RawHistory {
    fn default() -> Self {
        Self {
            capacity: 64,
            log_path: Some("logs/dialogue_history.jsonl".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawCharacters {
    prefs_path: String,
}

impl Default for RawCharacters {
    fn default() -> Self {
        Self {
            prefs_path: "saves/prefs.json".to_string(),
        }
    }
}

/// Runtime dialogue configuration.
#[derive(Resource, Debug, Clone)]
pub struct DialogueSettings {
    pub player: PlayerSettings,
    pub manager: ManagerSettings,
    /// Whether the objective lock blocks scripted dialogue while an objective runs.
    pub strict_mode: bool,
    pub catalog_files: Vec<PathBuf>,
    pub generated: GeneratedSettings,
    pub history: HistorySettings,
    pub prefs_path: PathBuf,
}

/// Where generated NPC lines come from.
#[derive(Debug, Clone, Default)]
pub struct GeneratedSettings {
    /// Pool key to JSON file.
    pub pools: BTreeMap<String, PathBuf>,
    /// Lower-cased NPC key to fallback line.
    pub fallbacks: BTreeMap<String, String>,
    pub hybrid: Vec<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct HistorySettings {
    pub capacity: usize,
    pub log_path: Option<PathBuf>,
}

impl DialogueSettings {
    /// Loads from `DIALOGUE_CONFIG_PATH` or `config/dialogue.toml`.
    pub fn load_or_default() -> Self {
        let path = env::var(CONFIG_PATH_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| CONFIG_PATH.to_string());

        let mut settings = Self::load_from(Path::new(&path));
        if let Some(prefs) = env::var(PREFS_PATH_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            settings.prefs_path = PathBuf::from(prefs);
        }
        settings
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw).unwrap_or_else(|err| {
                warn!(
                    target: "dialogue",
                    "Failed to parse {} ({}). Falling back to defaults.",
                    path.display(),
                    err
                );
                Self::default()
            }),
            Err(err) => {
                warn!(
                    target: "dialogue",
                    "Failed to read {} ({}). Falling back to defaults.",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<RawDialogueConfig>(raw).map(Into::into)
    }
}

impl Default for DialogueSettings {
    fn default() -> Self {
        RawDialogueConfig::default().into()
    }
}

impl From<RawDialogueConfig> for DialogueSettings {
    fn from(value: RawDialogueConfig) -> Self {
        let narration_display_name = match value.playback.narration_display_name.trim() {
            "" => PlayerSettings::default().narration_display_name,
            name => name.to_string(),
        };

        let player = PlayerSettings {
            reveal_interval: Duration::from_millis(
                value.playback.reveal_interval_ms.min(MAX_REVEAL_INTERVAL_MS),
            ),
            skip_on_advance: value.playback.skip_on_advance,
            narration: NarrationPolicy {
                empty_is_narration: value.narration.empty_is_narration,
                narration_tokens: normalise(&value.narration.tokens),
            },
            narration_display_name,
        };

        let mut areas: Vec<String> = value
            .areas
            .progression
            .iter()
            .map(|area| area.trim().to_string())
            .filter(|area| !area.is_empty())
            .collect();
        if areas.is_empty() {
            areas = ManagerSettings::default().areas;
        }

        let manager = ManagerSettings {
            validate_objectives: value.gating.validate_objectives,
            casual_prefixes: value
                .gating
                .casual_prefixes
                .iter()
                .map(|prefix| prefix.trim().to_string())
                .filter(|prefix| !prefix.is_empty())
                .collect(),
            areas,
        };

        let generated = GeneratedSettings {
            pools: value
                .generated
                .pools
                .into_iter()
                .filter(|(key, path)| !key.trim().is_empty() && !path.trim().is_empty())
                .map(|(key, path)| (key.trim().to_string(), PathBuf::from(path.trim())))
                .collect(),
            fallbacks: value
                .generated
                .fallbacks
                .into_iter()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(key, line)| (key.trim().to_lowercase(), line))
                .collect(),
            hybrid: value
                .generated
                .hybrid
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            seed: value.generated.seed,
        };

        let history = HistorySettings {
            capacity: value.history.capacity.max(1),
            log_path: value
                .history
                .log_path
                .map(|path| path.trim().to_string())
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        };

        Self {
            player,
            manager,
            strict_mode: value.gating.strict_mode,
            catalog_files: value
                .catalog
                .files
                .iter()
                .map(|file| file.trim())
                .filter(|file| !file.is_empty())
                .map(PathBuf::from)
                .collect(),
            generated,
            history,
            prefs_path: PathBuf::from(value.characters.prefs_path.trim()),
        }
    }
}

fn normalise(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_falls_back_to_defaults() {
        let settings = DialogueSettings::default();
        assert_eq!(settings.player.reveal_interval, Duration::from_millis(20));
        assert!(settings.player.skip_on_advance);
        assert_eq!(settings.player.narration_display_name, "Narrator");
        assert!(settings.manager.validate_objectives);
        assert_eq!(settings.manager.areas.len(), 5);
        assert_eq!(
            settings.generated.fallbacks.get("pak satya").map(String::as_str),
            Some("Selamat siang.")
        );
        assert!(settings.history.capacity > 0);

        let missing = DialogueSettings::load_from(Path::new("does/not/exist.toml"));
        assert_eq!(missing.manager.areas, settings.manager.areas);
    }

    #[test]
    fn parses_and_clamps_sections() {
        let settings = DialogueSettings::from_toml_str(
            r#"
            [playback]
            reveal_interval_ms = 50000
            skip_on_advance = false
            narration_display_name = "  "

            [narration]
            tokens = [" Narrator ", "", "[SFX]"]

            [gating]
            validate_objectives = false
            casual_prefixes = ["Chat_", " "]

            [generated]
            pools = { Jack = "assets/npc/jack.json", " " = "x.json" }
            fallbacks = { Omar = "Salam!" }

            [areas]
            progression = []

            [history]
            capacity = 0
            log_path = ""
            "#,
        )
        .expect("valid toml");

        assert_eq!(settings.player.reveal_interval, Duration::from_secs(1));
        assert!(!settings.player.skip_on_advance);
        assert_eq!(settings.player.narration_display_name, "Narrator");
        assert_eq!(
            settings.player.narration.narration_tokens,
            vec!["narrator".to_string(), "[sfx]".to_string()]
        );
        assert!(!settings.manager.validate_objectives);
        assert_eq!(settings.manager.casual_prefixes, vec!["Chat_".to_string()]);
        assert_eq!(settings.manager.areas, ManagerSettings::default().areas);
        assert_eq!(settings.generated.pools.len(), 1);
        assert_eq!(
            settings.generated.fallbacks.get("omar").map(String::as_str),
            Some("Salam!")
        );
        assert_eq!(settings.history.capacity, 1);
        assert!(settings.history.log_path.is_none());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(DialogueSettings::from_toml_str("[playback\nbroken").is_err());
    }
}
