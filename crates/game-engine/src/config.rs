//! Game settings from environment variables

use std::env;
use std::path::PathBuf;

use llm_engine::LlmSettings;
use search_worker::SearchConfig;

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Analyse every player move.
    pub insights_enabled: bool,

    /// Games kept in history before the oldest is evicted.
    pub history_capacity: usize,

    /// History file the CLI imports at start and exports at exit.
    pub history_path: Option<PathBuf>,

    pub search: SearchConfig,
    pub llm: LlmSettings,
}

impl GameConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let insights_enabled = env::var("INSIGHTS_ENABLED")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let history_capacity = env::var("HISTORY_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|c| *c > 0)
            .unwrap_or(crate::history::DEFAULT_CAPACITY);

        let history_path = env::var("HISTORY_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            insights_enabled,
            history_capacity,
            history_path,
            search: SearchConfig::from_env(),
            llm: LlmSettings::from_env()?,
        })
    }
}
