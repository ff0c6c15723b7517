//! Backend configuration and factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use proctor_core::session::{RetryPolicy, SessionConfig, SubmitPolicy};
use proctor_core::traits::ExamBackend;

use crate::http::{HttpBackend, DEFAULT_TIMEOUT_SECS};
use crate::local::LocalBackend;

/// Where exams come from and reports go to.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Http {
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default)]
        token: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Local {
        #[serde(default = "default_exams_dir")]
        exams_dir: PathBuf,
        #[serde(default = "default_reports_dir")]
        reports_dir: PathBuf,
        #[serde(default = "default_user_name")]
        user_name: String,
    },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Http {
                base_url,
                token,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("token", &token.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            BackendConfig::Local {
                exams_dir,
                reports_dir,
                user_name,
            } => f
                .debug_struct("Local")
                .field("exams_dir", exams_dir)
                .field("reports_dir", reports_dir)
                .field("user_name", user_name)
                .finish(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local {
            exams_dir: default_exams_dir(),
            reports_dir: default_reports_dir(),
            user_name: default_user_name(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_exams_dir() -> PathBuf {
    PathBuf::from("./exams")
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("./proctor-reports")
}
fn default_user_name() -> String {
    "candidate".to_string()
}

/// Top-level proctor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProctorConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Where a manual submit is accepted.
    #[serde(default)]
    pub submit_policy: SubmitPolicy,
    /// Automatic retries of a failed report submission.
    #[serde(default)]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_retry_delay() -> u64 {
    1000
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            submit_policy: SubmitPolicy::default(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl ProctorConfig {
    /// Session settings derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            submit_policy: self.submit_policy,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                retry_delay: Duration::from_millis(self.retry_delay_ms),
            },
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

fn resolve_backend_config(config: &BackendConfig) -> BackendConfig {
    match config {
        BackendConfig::Http {
            base_url,
            token,
            timeout_secs,
        } => BackendConfig::Http {
            base_url: resolve_env_vars(base_url),
            token: token.as_deref().map(resolve_env_vars),
            timeout_secs: *timeout_secs,
        },
        BackendConfig::Local {
            exams_dir,
            reports_dir,
            user_name,
        } => BackendConfig::Local {
            exams_dir: resolve_path(exams_dir),
            reports_dir: resolve_path(reports_dir),
            user_name: resolve_env_vars(user_name),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `proctor.toml` in the current directory
/// 2. `~/.config/proctor/config.toml`
///
/// Environment variable overrides: `PROCTOR_TOKEN`, `PROCTOR_BASE_URL`.
pub fn load_config() -> Result<ProctorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ProctorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("proctor.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ProctorConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ProctorConfig::default(),
    };

    apply_env_overrides(
        &mut config,
        std::env::var("PROCTOR_BASE_URL").ok(),
        std::env::var("PROCTOR_TOKEN").ok(),
    );
    config.backend = resolve_backend_config(&config.backend);

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// A base URL switches to the HTTP backend; a token only applies to it.
fn apply_env_overrides(
    config: &mut ProctorConfig,
    env_base_url: Option<String>,
    env_token: Option<String>,
) {
    if let Some(url) = env_base_url {
        match &mut config.backend {
            BackendConfig::Http { base_url, .. } => *base_url = url,
            BackendConfig::Local { .. } => {
                config.backend = BackendConfig::Http {
                    base_url: url,
                    token: None,
                    timeout_secs: default_timeout(),
                }
            }
        }
    }

    if let Some(value) = env_token {
        if let BackendConfig::Http { token, .. } = &mut config.backend {
            *token = Some(value);
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("proctor"))
}

/// Create a backend instance from its configuration.
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn ExamBackend>> {
    match config {
        BackendConfig::Http {
            base_url,
            token,
            timeout_secs,
        } => Ok(Box::new(HttpBackend::new(
            base_url,
            token.clone(),
            *timeout_secs,
        )?)),
        BackendConfig::Local {
            exams_dir,
            reports_dir,
            user_name,
        } => Ok(Box::new(LocalBackend::new(
            exams_dir,
            reports_dir,
            LocalBackend::local_user(user_name),
        ))),
    }
}
