//! Authored dialogue data: sequences, lines, and the tags policy reads from them.
use std::fmt;

use serde::Deserialize;

const DEFAULT_EXPRESSION: &str = "Default";

/// Presentation role of a single line; the UI maps it to a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    #[default]
    Normal,
    Objective,
    WinResult,
    LoseResult,
    #[serde(alias = "npc")]
    NpcRandom,
}

impl LineKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Objective => "objective",
            Self::WinResult => "win_result",
            Self::LoseResult => "lose_result",
            Self::NpcRandom => "npc_random",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which retrieval mode a generated line routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedMode {
    /// Uniform pick from the pool, repeats allowed.
    #[default]
    Random,
    /// Walks the pool in order and wraps after the last entry.
    Sequential,
}

/// Authoring intent of a sequence. Used by policy only, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    #[default]
    Standalone,
    Chained,
    Branching,
}

/// Who speaks in a sequence, as declared by the author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceCast {
    #[default]
    Mixed,
    Character,
    Narrator,
}

/// Authored per-line override of speaker classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    Narrator,
    Character,
    Npc,
}

impl LineRole {
    pub fn is_narration(self) -> bool {
        matches!(self, Self::Narrator)
    }
}

/// Result used to pick the win or lose branch of a branching sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchOutcome {
    Win,
    Lose,
}

/// A single authored line of dialogue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DialogueLine {
    /// Raw speaker token; blank means narration.
    #[serde(default)]
    pub speaker: String,
    /// Body template, may contain placeholder tokens.
    #[serde(default)]
    pub text: String,
    /// Portrait expression tag, opaque to the engine.
    #[serde(default = "default_expression")]
    pub expression: String,
    #[serde(default)]
    pub kind: LineKind,
    #[serde(default)]
    pub use_generated_text: bool,
    /// Pool key override for generated text; the speaker is used when absent.
    #[serde(default)]
    pub generated_key: Option<String>,
    #[serde(default)]
    pub generated_mode: GeneratedMode,
    /// Parenthetical action text shown next to the body.
    #[serde(default)]
    pub annotation: Option<String>,
    /// Wins over the speaker token when classifying the line.
    #[serde(default)]
    pub role: Option<LineRole>,
}

fn default_expression() -> String {
    DEFAULT_EXPRESSION.to_string()
}

impl DialogueLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            expression: default_expression(),
            kind: LineKind::Normal,
            use_generated_text: false,
            generated_key: None,
            generated_mode: GeneratedMode::Random,
            annotation: None,
            role: None,
        }
    }

    /// Line whose body is pulled from the speaker's generated pool.
    pub fn generated(speaker: impl Into<String>, mode: GeneratedMode) -> Self {
        Self {
            use_generated_text: true,
            generated_mode: mode,
            kind: LineKind::NpcRandom,
            ..Self::new(speaker, "")
        }
    }

    #[allow(dead_code)]
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    #[allow(dead_code)]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    #[allow(dead_code)]
    pub fn with_generated_key(mut self, key: impl Into<String>) -> Self {
        self.generated_key = Some(key.into());
        self
    }

    /// Key used to query the generated-line provider.
    pub fn generated_key(&self) -> &str {
        match self.generated_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key.trim(),
            _ => self.speaker.trim(),
        }
    }

    fn has_displayable_text(&self) -> bool {
        self.use_generated_text || !self.text.trim().is_empty()
    }
}

/// Named, ordered script of lines with optional follow-ups.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DialogueSequence {
    pub name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub lines: Vec<DialogueLine>,
    /// Name of the sequence to chain into on completion.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub kind: SequenceKind,
    #[serde(default)]
    pub cast: SequenceCast,
    #[serde(default)]
    pub win: Option<String>,
    #[serde(default)]
    pub lose: Option<String>,
}

impl DialogueSequence {
    pub fn new(name: impl Into<String>, area: impl Into<String>, lines: Vec<DialogueLine>) -> Self {
        Self {
            name: name.into(),
            area: area.into(),
            lines,
            next: None,
            kind: SequenceKind::Standalone,
            cast: SequenceCast::Mixed,
            win: None,
            lose: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self.kind = SequenceKind::Chained;
        self
    }

    #[allow(dead_code)]
    pub fn with_branches(mut self, win: impl Into<String>, lose: impl Into<String>) -> Self {
        self.win = Some(win.into());
        self.lose = Some(lose.into());
        self.kind = SequenceKind::Branching;
        self
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&DialogueLine> {
        self.lines.get(index)
    }

    /// Name of the chained successor, ignoring blank references.
    pub fn next_name(&self) -> Option<&str> {
        non_blank(self.next.as_deref())
    }

    pub fn branch_name(&self, outcome: BranchOutcome) -> Option<&str> {
        match outcome {
            BranchOutcome::Win => non_blank(self.win.as_deref()),
            BranchOutcome::Lose => non_blank(self.lose.as_deref()),
        }
    }

    /// Area tag, or the sequence name when the tag is blank.
    pub fn area_or_name(&self) -> &str {
        let area = self.area.trim();
        if area.is_empty() {
            self.name.trim()
        } else {
            area
        }
    }

    /// Non-empty line list and every line has text to show.
    pub fn is_valid(&self) -> bool {
        !self.lines.is_empty() && self.lines.iter().all(DialogueLine::has_displayable_text)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
