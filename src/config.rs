use serde::Deserialize;

use crate::dns::memcap::MemcapConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub memcap: MemcapSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayConfig {
    #[serde(default = "default_capture_path")]
    pub capture_path: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            capture_path: default_capture_path(),
        }
    }
}

/// Mirrors [`MemcapConfig`] for TOML deserialization; kept separate so the
/// parser core has no `serde` dependency of its own.
#[derive(Debug, Deserialize, Clone)]
pub struct MemcapSettings {
    #[serde(default = "default_request_flood_threshold")]
    pub request_flood_threshold: u32,
    #[serde(default = "default_state_memcap")]
    pub state_memcap: u64,
    #[serde(default = "default_global_memcap")]
    pub global_memcap: u64,
}

impl Default for MemcapSettings {
    fn default() -> Self {
        MemcapSettings {
            request_flood_threshold: default_request_flood_threshold(),
            state_memcap: default_state_memcap(),
            global_memcap: default_global_memcap(),
        }
    }
}

impl From<MemcapSettings> for MemcapConfig {
    fn from(s: MemcapSettings) -> Self {
        MemcapConfig {
            request_flood_threshold: s.request_flood_threshold,
            state_memcap: s.state_memcap,
            global_memcap: s.global_memcap,
        }
    }
}

fn default_capture_path() -> String {
    "capture.jsonl".to_string()
}
fn default_request_flood_threshold() -> u32 {
    crate::dns::memcap::DEFAULT_REQUEST_FLOOD_THRESHOLD
}
fn default_state_memcap() -> u64 {
    crate::dns::memcap::DEFAULT_STATE_MEMCAP
}
fn default_global_memcap() -> u64 {
    crate::dns::memcap::DEFAULT_GLOBAL_MEMCAP
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config '{}': {}", path, e))?;
        Ok(config)
    }
}
