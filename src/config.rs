use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::graph::GroupingConfig;
use crate::layout::LayoutConfig;

/// Optional JSON config file. Missing sections and fields keep their defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grouping: GroupingConfig,
    pub layout: LayoutConfig,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
}

pub fn parse_config(raw: &str) -> Result<Config> {
    serde_json::from_str(raw).context("invalid config JSON")
}
