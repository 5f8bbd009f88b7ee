pub mod codec;
pub mod error;
pub mod format;
pub mod knowledge;
pub mod method;
pub mod resolver;
pub mod seed;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use codec::Trigram;
pub use error::{DivinationError, KnowledgeBaseError, StoreError};
pub use format::Locale;
pub use knowledge::{KnowledgeBase, KnowledgeBaseReport, SharedKnowledgeBase, SymbolicKnowledge};
pub use resolver::{DerivationResult, DivinationResolver};

/// Number of hexagrams in a complete table.
pub const HEXAGRAM_COUNT: u8 = 64;
/// Position of the synthetic "all lines changing" line.
pub const ALL_CHANGING_LINE: u8 = 7;

// --- Types (field aliases match the admin console's REST payloads) ---

/// One of the 64 hexagrams (卦).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hexagram {
    pub id: String,
    #[serde(alias = "gua_name")]
    pub name: String,
    /// Free-text description fed to the interpretation prompts
    #[serde(default, alias = "gua_prompt")]
    pub prompt: String,
    /// Ordinal position 1..=64
    pub position: u8,
    pub binary_code: String,
    /// Judgement text (卦辞)
    #[serde(
        default,
        alias = "gua_ci",
        skip_serializing_if = "Option::is_none"
    )]
    pub classical_text: Option<String>,
}

impl Hexagram {
    /// All-yang or all-yin: the two hexagrams that carry a 7th line.
    pub fn is_uniform(&self) -> bool {
        self.binary_code == "111111" || self.binary_code == "000000"
    }
}

/// One line (爻) of a hexagram.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Line {
    pub id: String,
    /// Ordinal position of the owning hexagram, not its id
    #[serde(alias = "gua_position")]
    pub hexagram_position: u8,
    /// 1..=6, or 7 for the all-changing line
    pub position: u8,
    #[serde(alias = "yao_name")]
    pub name: String,
    #[serde(default, alias = "yao_prompt")]
    pub prompt: String,
}

// --- Storage ---

const HEXAGRAMS_FILE: &str = "hexagrams.json";
const LINES_FILE: &str = "lines.json";
const SETTINGS_FILE: &str = "settings.json";

/// Resolve the reference-data directory: `$MEIHUA_HOME`, else `~/.meihua/`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("MEIHUA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".meihua")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let raw = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| StoreError::json(path, e))
}

/// Atomic write (temp file + rename) so a concurrent reload never reads a
/// truncated file.
fn write_json<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    let json = serde_json::to_string_pretty(value)?;
    let tmp = dir.join(format!(".{file}.tmp"));
    let path = dir.join(file);
    fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))
}

pub fn read_hexagrams_in(dir: &Path) -> Result<Vec<Hexagram>, StoreError> {
    read_json(&dir.join(HEXAGRAMS_FILE))
}

pub fn read_hexagrams() -> Result<Vec<Hexagram>, StoreError> {
    read_hexagrams_in(&data_dir())
}

pub fn read_lines_in(dir: &Path) -> Result<Vec<Line>, StoreError> {
    read_json(&dir.join(LINES_FILE))
}

pub fn read_lines() -> Result<Vec<Line>, StoreError> {
    read_lines_in(&data_dir())
}

pub fn write_hexagrams_in(dir: &Path, hexagrams: &[Hexagram]) -> Result<(), StoreError> {
    write_json(dir, HEXAGRAMS_FILE, &hexagrams)
}

pub fn write_hexagrams(hexagrams: &[Hexagram]) -> Result<(), StoreError> {
    write_hexagrams_in(&data_dir(), hexagrams)
}

pub fn write_lines_in(dir: &Path, lines: &[Line]) -> Result<(), StoreError> {
    write_json(dir, LINES_FILE, &lines)
}

pub fn write_lines(lines: &[Line]) -> Result<(), StoreError> {
    write_lines_in(&data_dir(), lines)
}

/// Read both tables from `dir` and build a validated knowledge base.
pub fn load_knowledge_base_in(dir: &Path) -> Result<KnowledgeBase, StoreError> {
    let hexagrams = read_hexagrams_in(dir)?;
    let lines = read_lines_in(dir)?;
    let kb = KnowledgeBase::new(hexagrams, lines)?;
    tracing::info!(
        dir = %dir.display(),
        hexagrams = kb.hexagram_count(),
        lines = kb.line_count(),
        "loaded knowledge base"
    );
    Ok(kb)
}

pub fn load_knowledge_base() -> Result<KnowledgeBase, StoreError> {
    load_knowledge_base_in(&data_dir())
}

/// Write the built-in seed tables into `dir`.
///
/// A complete pair of tables is left alone unless `force` is set. A
/// directory holding only one of the two files is reseeded. Returns whether
/// anything was written.
pub fn seed_store_in(dir: &Path, force: bool) -> Result<bool, StoreError> {
    let has_hexagrams = dir.join(HEXAGRAMS_FILE).exists();
    let has_lines = dir.join(LINES_FILE).exists();
    if has_hexagrams && has_lines && !force {
        tracing::info!(dir = %dir.display(), "reference data already present, not seeding");
        return Ok(false);
    }
    if has_hexagrams != has_lines {
        tracing::warn!(
            dir = %dir.display(),
            has_hexagrams,
            has_lines,
            "reference data is half written, reseeding both tables"
        );
    }
    let hexagrams = seed::seed_hexagrams();
    let lines = seed::seed_lines(&hexagrams);
    write_hexagrams_in(dir, &hexagrams)?;
    write_lines_in(dir, &lines)?;
    tracing::info!(
        dir = %dir.display(),
        hexagrams = hexagrams.len(),
        lines = lines.len(),
        "seeded reference data"
    );
    Ok(true)
}

pub fn seed_store(force: bool) -> Result<bool, StoreError> {
    seed_store_in(&data_dir(), force)
}

// --- Settings ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Language of the summary sentence
    #[serde(default)]
    pub locale: Locale,
}

/// Missing or unreadable settings fall back to defaults.
pub fn read_settings_in(dir: &Path) -> Settings {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        return Settings::default();
    }
    read_json(&path)
        .inspect_err(|e| tracing::warn!(error = %e, "ignoring invalid settings"))
        .unwrap_or_default()
}

pub fn read_settings() -> Settings {
    read_settings_in(&data_dir())
}

pub fn write_settings_in(dir: &Path, settings: &Settings) -> Result<(), StoreError> {
    write_json(dir, SETTINGS_FILE, settings)
}

pub fn write_settings(settings: &Settings) -> Result<(), StoreError> {
    write_settings_in(&data_dir(), settings)
}
