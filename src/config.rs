use std::sync::LazyLock;
use std::time::Duration;

use serde::Deserialize;

use text_bus::pipeline::PipelineConfig;

const CONFIG_FILE: &str = "textflow.json";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    rate_limit_ms: u64,
    shutdown_grace_ms: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: 5000,
            shutdown_grace_ms: 2000,
        }
    }
}

impl FlowConfig {
    fn load() -> Self {
        match std::fs::read_to_string(CONFIG_FILE) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("{}: ignoring invalid config: {}", CONFIG_FILE, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            rate_limit: Duration::from_millis(self.rate_limit_ms),
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
        }
    }
}

pub fn config() -> &'static FlowConfig {
    static CONFIG: LazyLock<FlowConfig> = LazyLock::new(FlowConfig::load);
    &CONFIG
}
