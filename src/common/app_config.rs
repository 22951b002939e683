// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

static CONFIG: OnceLock<TickaggConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static TickaggConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let cfg = TickaggConfig::load_from_file(path.as_ref())?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn init_from_env_or_default() -> Result<&'static TickaggConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = config_path_from_env_or_default()?;
    let cfg = TickaggConfig::load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn config() -> Result<&'static TickaggConfig> {
    init_from_env_or_default()
}

/// Library-friendly accessor: use the config file when one is present,
/// built-in defaults otherwise. Embedding hosts that require an explicit
/// file should call [`config`] instead.
pub fn config_or_default() -> &'static TickaggConfig {
    if let Some(cfg) = CONFIG.get() {
        return cfg;
    }
    let cfg = config_path_from_env_or_default()
        .and_then(|path| TickaggConfig::load_from_file(&path))
        .unwrap_or_default();
    let _ = CONFIG.set(cfg);
    CONFIG.get().expect("CONFIG set")
}

fn config_path_from_env_or_default() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("TICKAGG_CONFIG") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }

    let candidates = [PathBuf::from("tickagg.toml")];
    for p in candidates {
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "missing config file: set $TICKAGG_CONFIG or create ./tickagg.toml"
    ))
}

#[derive(Clone, Deserialize)]
pub struct TickaggConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    /// Example: "tickagg=debug"
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub agg: AggConfig,
}

impl TickaggConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: TickaggConfig =
            toml::from_str(&s).with_context(|| format!("parse toml: {}", path.display()))?;
        Ok(cfg)
    }
}

impl Default for TickaggConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_filter: None,
            agg: AggConfig::default(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct AggConfig {
    /// Block size in bytes for the aggregate state arena.
    #[serde(default = "default_state_arena_block_size")]
    pub state_arena_block_size: usize,
}

fn default_state_arena_block_size() -> usize {
    64 * 1024
}

impl Default for AggConfig {
    fn default() -> Self {
        Self {
            state_arena_block_size: default_state_arena_block_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = TickaggConfig::default();
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.log_filter.is_none());
        assert_eq!(cfg.agg.state_arena_block_size, 64 * 1024);
    }

    #[test]
    fn test_parse_partial_toml() {
        let cfg: TickaggConfig = toml::from_str(
            r#"
            log_level = "debug"

            [agg]
            state_arena_block_size = 4096
            "#,
        )
        .unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.agg.state_arena_block_size, 4096);
    }
}
