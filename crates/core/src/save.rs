//! Save-slot persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    market::{JobBoards, MarketState},
    models::Player,
};

/// Directory under the user's config root used for save files.
pub const DEFAULT_SAVE_DIR: &str = "burnrate/saves";

const SAVE_EXTENSION: &str = "json";
const MAX_SLOT_LEN: usize = 64;

static SLOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("failed to compile slot regex"));

/// Everything that changes during play. The universe is not included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub player: Player,
    #[serde(default)]
    pub market: MarketState,
    #[serde(default)]
    pub contracts: JobBoards,
}

/// Metadata describing a persisted slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEntry {
    /// Absolute path to the save file on disk.
    pub path: PathBuf,
    /// Slot identifier (file stem).
    pub slot: String,
    /// Name of the saved player.
    pub player_name: String,
    /// Timestamp when the slot was last written.
    pub updated_at: DateTime<Utc>,
}

/// Serialized representation of a save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavePayload {
    saved_at: DateTime<Utc>,
    #[serde(flatten)]
    data: SaveData,
}

/// Manager responsible for loading and writing save slots.
#[derive(Debug, Clone)]
pub struct SaveManager {
    root: PathBuf,
}

impl SaveManager {
    /// Create a new manager rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_SAVE_DIR)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `slot`; fails for identifiers that are not plain names.
    pub fn slot_path(&self, slot: &str) -> Result<PathBuf> {
        if !SLOT_RE.is_match(slot) {
            return Err(anyhow!("invalid slot identifier '{slot}'"));
        }
        Ok(self.root.join(format!("{slot}.{SAVE_EXTENSION}")))
    }

    /// Return all known saves sorted by timestamp (most recent first).
    pub fn entries(&self) -> Result<Vec<SaveEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).context("failed to read save directory")? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            let Some(slot) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let slot = slot.to_string();

            match read_payload(&path) {
                Ok(payload) => entries.push(SaveEntry {
                    slot,
                    player_name: payload.data.player.name,
                    updated_at: payload.saved_at,
                    path,
                }),
                Err(err) => {
                    warn!("Failed to read save {:?}: {err}", path);
                }
            }
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }

    /// Most recently written slot, if any.
    pub fn latest(&self) -> Result<Option<SaveEntry>> {
        let entries = self.entries()?;
        Ok(entries.into_iter().next())
    }

    /// Write `data` to `slot`, replacing any previous contents.
    pub fn write(&self, slot: &str, data: &SaveData) -> Result<SaveEntry> {
        let path = self.slot_path(slot)?;
        let payload = SavePayload {
            saved_at: Utc::now(),
            data: data.clone(),
        };
        write_payload(&path, &payload)?;
        Ok(SaveEntry {
            path,
            slot: slot.to_string(),
            player_name: payload.data.player.name,
            updated_at: payload.saved_at,
        })
    }

    /// Read the contents of `slot`.
    pub fn read(&self, slot: &str) -> Result<SaveData> {
        let path = self.slot_path(slot)?;
        Ok(read_payload(&path)?.data)
    }
}

/// Turn arbitrary text (such as a player name) into a usable slot identifier.
pub fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
        if result.len() == MAX_SLOT_LEN {
            break;
        }
    }
    if result.is_empty() {
        "save".to_string()
    } else {
        result
    }
}

fn write_payload(path: &Path, payload: &SavePayload) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialised = serde_json::to_vec_pretty(payload)?;
    // Write beside the target first so a failed write never truncates a good save.
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, serialised)
        .with_context(|| format!("failed to write {}", staging.display()))?;
    fs::rename(&staging, path).with_context(|| format!("failed to replace {}", path.display()))
}

fn read_payload(path: &Path) -> Result<SavePayload> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let payload = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(payload)
}
