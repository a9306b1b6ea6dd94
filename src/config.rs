use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub pruning: PruningConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Fixed seed for reproducible runs; `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PruningConfig {
    /// Re-run pruning until a pass removes nothing.
    #[serde(default)]
    pub exhaustive: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_steps: default_max_steps(),
        }
    }
}

impl SimulationConfig {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }
}

fn default_max_steps() -> usize {
    1000
}
