use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arcade_core::minesweeper::Difficulty;
use arcade_core::pairs::PairsConfig;
use arcade_core::snake::SnakeConfig;
use arcade_core::tennis::TennisConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG: &str = "arcade.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    /// Where accounts, session flags and high scores are kept.
    pub data_file: PathBuf,
    pub minesweeper: Difficulty,
    pub snake: SnakeConfig,
    pub tennis: TennisConfig,
    pub pairs: PairsConfig,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("arcade-data.json"),
            minesweeper: Difficulty::default(),
            snake: SnakeConfig::default(),
            tennis: TennisConfig::default(),
            pairs: PairsConfig::default(),
        }
    }
}

impl ArcadeConfig {
    /// Reads `path`, or `arcade.toml` when present, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
            None => {
                log::debug!("No config file, using defaults");
                return Ok(Self::default());
            }
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a bad game config up front, before any screen is shown.
    pub fn validate(&self) -> Result<()> {
        self.minesweeper.validate().context("[minesweeper]")?;
        self.snake.validate().context("[snake]")?;
        self.tennis.validate().context("[tennis]")?;
        self.pairs.validate().context("[pairs]")?;
        Ok(())
    }
}
