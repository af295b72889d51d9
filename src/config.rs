//! Configuration loading and validation.
//!
//! Everything lives in one human-owned `config.toml` (default location
//! `~/.outreach/config.toml`). Every table is optional; a missing file means
//! built-in defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::sequence::links::LinkFormat;
use crate::sequence::SenderIdentity;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model routing configuration.
    pub models: ModelsConfig,

    /// Sender identity used in preambles and signoff detection.
    pub sender: SenderIdentity,

    /// Generation pipeline tuning.
    pub generation: GenerationConfig,

    /// Asset selection settings.
    pub assets: AssetsConfig,
}

/// Model routing: default model, per-role overrides, provider endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Default model identifier (e.g. "openai/gpt-5.2").
    #[serde(default = "default_model")]
    pub default: String,

    /// Per-role model overrides (draft, rewrite, research, assets, redundancy).
    #[serde(default = "default_roles")]
    pub roles: HashMap<String, String>,

    /// Per-provider endpoint overrides (`openai`, `perplexity`).
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
            roles: default_roles(),
            endpoints: HashMap::new(),
        }
    }
}

/// Generation pipeline tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Per-call deadline for model requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Jaccard similarity at or above which email4 is rewritten.
    #[serde(default = "default_redundancy_threshold")]
    pub redundancy_threshold: f64,

    /// How injected product links are rendered.
    #[serde(default)]
    pub link_format: LinkFormat,

    /// Maximum tokens requested from drafting and rewrite calls.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            redundancy_threshold: default_redundancy_threshold(),
            link_format: LinkFormat::default(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Asset selection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Combined (and per-file) attachment budget in bytes.
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,

    /// Let the assets model refine the deterministic pick.
    #[serde(default = "default_model_assisted")]
    pub model_assisted: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            max_attachment_bytes: default_max_attachment_bytes(),
            model_assisted: default_model_assisted(),
        }
    }
}

// Default value functions for serde

fn default_model() -> String {
    "openai/gpt-5.2".to_owned()
}
fn default_roles() -> HashMap<String, String> {
    HashMap::from([
        ("research".to_owned(), "perplexity/sonar-pro".to_owned()),
        ("assets".to_owned(), "openai/gpt-5-mini".to_owned()),
        ("redundancy".to_owned(), "openai/gpt-5-mini".to_owned()),
    ])
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_redundancy_threshold() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_attachment_bytes() -> u64 {
    5 * 1024 * 1024
}
fn default_model_assisted() -> bool {
    true
}

/// Every model spec referenced by the config, default first, deduplicated.
pub fn all_model_specs(models: &ModelsConfig) -> Vec<String> {
    let mut specs = vec![models.default.clone()];
    let mut overrides: Vec<&String> = models.roles.values().collect();
    overrides.sort();
    for spec in overrides {
        if !specs.contains(spec) {
            specs.push(spec.clone());
        }
    }
    specs
}

/// Load the config from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Load the config if the file exists, otherwise return defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file found, using defaults");
        return Ok(Config::default());
    }
    load_config(path)
}

/// Resolve the default config directory (`~/.outreach/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".outreach"))
}
