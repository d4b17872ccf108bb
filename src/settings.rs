//! Per-guild feature settings with path-based access.
//!
//! The settings are a typed nested structure, but consumers only reach into
//! it through two operations: `get(guild, "leveling.enabled")` and
//! `set(guild, path, value)`.  Unknown paths and type mismatches are rejected
//! rather than written.

use crate::helper::{bounded_io, data_path};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::all::{ChannelId, GuildId};
use std::collections::HashMap;
use std::io::ErrorKind;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LevelingSettings {
    /// Grant XP for messages at all.
    pub enabled: bool,
    /// Announce level-ups in chat.
    pub messages: bool,
    /// Channel for level-up announcements.  None replies where the message
    /// was sent.
    pub channel: Option<ChannelId>,
}

impl Default for LevelingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            messages: true,
            channel: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TrackingSettings {
    /// Count text messages per channel.
    pub text: bool,
    /// Accumulate voice time per channel.
    pub voice: bool,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            text: true,
            voice: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct GuildSettings {
    pub leveling: LevelingSettings,
    pub tracking: TrackingSettings,
}

#[derive(Serialize, Deserialize, Default)]
pub struct SettingsStore(HashMap<GuildId, GuildSettings>);

impl SettingsStore {
    /// Effective settings for a guild; defaults when nothing is stored.
    pub fn guild(&self, guild_id: GuildId) -> GuildSettings {
        self.0.get(&guild_id).cloned().unwrap_or_default()
    }

    fn json_pointer(path: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }
        Some(format!("/{}", path.replace('.', "/")))
    }

    /// Look up a dotted path, e.g. `leveling.channel`.  None for unknown
    /// paths.
    pub fn get(&self, guild_id: GuildId, path: &str) -> Option<Value> {
        let tree = serde_json::to_value(self.guild(guild_id)).ok()?;
        tree.pointer(&Self::json_pointer(path)?).cloned()
    }

    /// Replace the leaf at a dotted path.  Returns false (and writes nothing)
    /// for unknown paths, non-leaf targets, or values the typed structure
    /// rejects.
    pub fn set(&mut self, guild_id: GuildId, path: &str, value: Value) -> bool {
        let Some(pointer) = Self::json_pointer(path) else {
            return false;
        };
        let mut tree = match serde_json::to_value(self.guild(guild_id)) {
            Ok(tree) => tree,
            Err(_) => return false,
        };

        let Some(node) = tree.pointer_mut(&pointer) else {
            return false;
        };
        if node.is_object() {
            return false;
        }
        *node = value;

        // Round-trip through the typed structure so a wrongly-typed value
        // never lands in the store.
        match serde_json::from_value::<GuildSettings>(tree) {
            Ok(settings) => {
                self.0.insert(guild_id, settings);
                true
            }
            Err(_) => false,
        }
    }

    pub fn remove_guild(&mut self, guild_id: GuildId) {
        self.0.remove(&guild_id);
    }

    pub async fn load() -> Result<Self> {
        let path = data_path(SETTINGS_FILE)?;
        match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)
                .map_err(|e| anyhow!("Failed to deserialize settings: {}", e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow!(
                "Failed to read `{}`: {}",
                path.to_string_lossy(),
                e
            )),
        }
    }

    pub async fn save(&self) -> Result<()> {
        bounded_io("writing settings", self.write_to_disk()).await
    }

    async fn write_to_disk(&self) -> Result<()> {
        let path = data_path(SETTINGS_FILE)?;
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize settings: {}", e))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow!(
                    "Could not create directory `{}`: {}",
                    parent.to_string_lossy(),
                    e
                )
            })?;
        }

        let tmp_path = path.with_extension("json.new");
        tokio::fs::write(&tmp_path, serialized).await.map_err(|e| {
            anyhow!(
                "Could not write settings to `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            anyhow!(
                "Could not rename `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_for_unknown_guild() {
        let store = SettingsStore::default();
        let settings = store.guild(GuildId::new(1));
        assert!(settings.leveling.enabled);
        assert!(settings.tracking.voice);
        assert!(settings.leveling.channel.is_none());
    }

    #[test]
    fn get_walks_nested_paths() {
        let store = SettingsStore::default();
        let guild = GuildId::new(1);

        assert_eq!(store.get(guild, "leveling.enabled"), Some(json!(true)));
        assert_eq!(store.get(guild, "leveling.channel"), Some(json!(null)));
        assert_eq!(store.get(guild, "no.such.path"), None);
    }

    #[test]
    fn set_updates_a_leaf() {
        let mut store = SettingsStore::default();
        let guild = GuildId::new(1);

        assert!(store.set(guild, "leveling.enabled", json!(false)));
        assert!(!store.guild(guild).leveling.enabled);
        assert_eq!(store.get(guild, "leveling.enabled"), Some(json!(false)));
        // Other guilds are untouched.
        assert!(store.guild(GuildId::new(2)).leveling.enabled);
    }

    #[test]
    fn set_rejects_unknown_path_and_type_mismatch() {
        let mut store = SettingsStore::default();
        let guild = GuildId::new(1);

        assert!(!store.set(guild, "leveling.bogus", json!(false)));
        assert!(!store.set(guild, "leveling.enabled", json!("maybe")));
        // Whole sections are not settable.
        assert!(!store.set(guild, "leveling", json!(false)));
        assert!(store.guild(guild).leveling.enabled);
    }

    #[test]
    fn remove_guild_restores_defaults() {
        let mut store = SettingsStore::default();
        let guild = GuildId::new(1);

        assert!(store.set(guild, "tracking.voice", json!(false)));
        store.remove_guild(guild);
        assert!(store.guild(guild).tracking.voice);
    }
}
