use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/guildstats/config.toml";

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    #[serde(default)]
    pub leveling: Leveling,
    #[serde(default)]
    pub leaderboard: Leaderboard,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: String,
    pub bot_owners: Vec<String>,
    pub command_prefix: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Leveling {
    /// Minimum time between XP grants for the same member.
    pub cooldown_ms: u64,
    /// Inclusive XP roll range for one qualifying message.
    pub xp_min: u64,
    pub xp_max: u64,
}

impl Default for Leveling {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            xp_min: 15,
            xp_max: 25,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Leaderboard {
    pub page_size: usize,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        if config.leaderboard.page_size == 0 {
            return Err(anyhow!(
                "Invalid configuration at `{}`: leaderboard.page_size must be at least 1",
                path.to_string_lossy()
            ));
        }
        if config.leveling.xp_min > config.leveling.xp_max {
            return Err(anyhow!(
                "Invalid configuration at `{}`: leveling.xp_min exceeds leveling.xp_max",
                path.to_string_lossy()
            ));
        }

        Ok(config)
    }
}
