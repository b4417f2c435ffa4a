//! Grading backend configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gradecraft_core::adapter::RetryPolicy;
use gradecraft_core::traits::SemanticGrader;

use crate::anthropic::AnthropicGrader;
use crate::openai::OpenAiGrader;

/// Configuration for a single grading backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in
/// logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    OpenAi {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::OpenAi {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("OpenAi")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            BackendConfig::Anthropic {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
        }
    }
}

/// Top-level gradecraft configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradersConfig {
    /// Backend configurations keyed by name.
    #[serde(default)]
    pub backends: HashMap<String, BackendConfig>,
    /// Default backend to use.
    #[serde(default = "default_backend")]
    pub default_backend: String,
    /// Per-call timeout for grading requests, in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Max retries on transient service errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_backend() -> String {
    "openai".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}

impl Default for GradersConfig {
    fn default() -> Self {
        Self {
            backends: HashMap::new(),
            default_backend: default_backend(),
            request_timeout_secs: default_timeout(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl GradersConfig {
    /// The retry policy implied by this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
            max_delay: Duration::from_secs(60),
            call_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// The configured default backend, if present.
    pub fn default_backend_config(&self) -> Option<&BackendConfig> {
        self.backends.get(&self.default_backend)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_backend_config(config: &BackendConfig) -> BackendConfig {
    match config {
        BackendConfig::OpenAi {
            api_key,
            base_url,
            model,
        } => BackendConfig::OpenAi {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: model.clone(),
        },
        BackendConfig::Anthropic {
            api_key,
            base_url,
            model,
        } => BackendConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: model.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradecraft.toml` in the current directory
/// 2. `~/.config/gradecraft/config.toml`
///
/// Environment variable overrides: `GRADECRAFT_OPENAI_KEY`,
/// `GRADECRAFT_ANTHROPIC_KEY`.
pub fn load_config() -> Result<GradersConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradersConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("gradecraft.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<GradersConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradersConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("GRADECRAFT_OPENAI_KEY") {
        config
            .backends
            .entry("openai".into())
            .or_insert(BackendConfig::OpenAi {
                api_key: String::new(),
                base_url: None,
                model: None,
            });
        if let Some(BackendConfig::OpenAi { api_key, .. }) = config.backends.get_mut("openai") {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("GRADECRAFT_ANTHROPIC_KEY") {
        config
            .backends
            .entry("anthropic".into())
            .or_insert(BackendConfig::Anthropic {
                api_key: String::new(),
                base_url: None,
                model: None,
            });
        if let Some(BackendConfig::Anthropic { api_key, .. }) =
            config.backends.get_mut("anthropic")
        {
            *api_key = key;
        }
    }

    // Resolve env vars in all backend configs
    let resolved: HashMap<String, BackendConfig> = config
        .backends
        .iter()
        .map(|(k, v)| (k.clone(), resolve_backend_config(v)))
        .collect();
    config.backends = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradecraft"))
}

/// Create a grading backend from its configuration.
pub fn create_grader(config: &BackendConfig) -> Result<Box<dyn SemanticGrader>> {
    match config {
        BackendConfig::OpenAi {
            api_key,
            base_url,
            model,
        } => Ok(Box::new(OpenAiGrader::new(
            api_key,
            base_url.clone(),
            model.clone(),
        ))),
        BackendConfig::Anthropic {
            api_key,
            base_url,
            model,
        } => Ok(Box::new(AnthropicGrader::new(
            api_key,
            base_url.clone(),
            model.clone(),
        ))),
    }
}
