use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.toml";
const CONFIG_DIR: &str = ".tilepilot";

/// Which move policy drives the run.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Fixed cyclic pattern with periodic up/right deviations.
    #[default]
    Pattern,
    /// Grid-aware: keep the largest tile pinned to the bottom-left corner.
    Corner,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Pattern => "pattern",
            Strategy::Corner => "corner",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_target_tile")]
    pub target_tile: u32,
    #[serde(default)]
    pub strategy: Strategy,
}

#[derive(Debug, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_page_load_wait_secs")]
    pub page_load_wait_secs: u64,
    #[serde(default = "default_final_pause_secs")]
    pub final_pause_secs: u64,
}

/// CSS selectors and data attributes the target page renders state with.
#[derive(Debug, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_score_selector")]
    pub score: String,
    #[serde(default = "default_tiles_selector")]
    pub tiles: String,
    #[serde(default = "default_overlay_selector")]
    pub overlay: String,
    #[serde(default = "default_row_attr")]
    pub row_attr: String,
    #[serde(default = "default_col_attr")]
    pub col_attr: String,
}

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// Pause between dispatched moves, letting merge animations settle.
    #[serde(default = "default_move_delay_millis")]
    pub move_delay_millis: u64,
}

fn default_url() -> String {
    "https://in0ho1no.github.io/2025-adhoc-blooming-garden/".to_string()
}

fn default_target_tile() -> u32 {
    2048
}

fn default_endpoint() -> String {
    "http://localhost:9515".to_string()
}

fn default_page_load_wait_secs() -> u64 {
    2
}

fn default_final_pause_secs() -> u64 {
    3
}

fn default_score_selector() -> String {
    ".score".to_string()
}

fn default_tiles_selector() -> String {
    ".grid-cell".to_string()
}

fn default_overlay_selector() -> String {
    ".game-over-overlay".to_string()
}

fn default_row_attr() -> String {
    "data-row".to_string()
}

fn default_col_attr() -> String {
    "data-col".to_string()
}

fn default_move_delay_millis() -> u64 {
    150
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            target_tile: default_target_tile(),
            strategy: Strategy::default(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            headless: false,
            page_load_wait_secs: default_page_load_wait_secs(),
            final_pause_secs: default_final_pause_secs(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            score: default_score_selector(),
            tiles: default_tiles_selector(),
            overlay: default_overlay_selector(),
            row_attr: default_row_attr(),
            col_attr: default_col_attr(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            move_delay_millis: default_move_delay_millis(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl ProjectConfig {
    /// Search upward from `start` for a `.tilepilot/config.toml` file and
    /// load it. Returns the default config if no file is found.
    pub fn load(start: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = Self::find_config_file(start) {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: ProjectConfig = toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            Ok((config, Some(path)))
        } else {
            Ok((ProjectConfig::default(), None))
        }
    }

    fn find_config_file(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }
}
