//! Search configuration from environment variables

use std::env;

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Negamax depth in plies
    pub depth: u32,

    /// External UCI engine; the built-in search is used when unset
    pub engine_path: Option<String>,

    /// Nodes per position for the UCI engine
    pub nodes: u32,

    /// Bounded request/response channel size
    pub queue_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            engine_path: None,
            nodes: 50_000,
            queue_capacity: 8,
        }
    }
}

impl SearchConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let depth = env::var("SEARCH_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|d| *d > 0)
            .unwrap_or(defaults.depth);

        let engine_path = env::var("UCI_ENGINE_PATH").ok().filter(|p| !p.is_empty());

        let nodes = env::var("UCI_NODES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.nodes);

        let queue_capacity = env::var("SEARCH_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|c| *c > 0)
            .unwrap_or(defaults.queue_capacity);

        Self {
            depth,
            engine_path,
            nodes,
            queue_capacity,
        }
    }
}
