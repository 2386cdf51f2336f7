//! Layered configuration for sitesync.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. built-in defaults ([`Config::default`]);
//! 2. the user configuration file (`config.toml` in the platform's config
//!    directory, e.g. `~/.config/sitesync/config.toml`);
//! 3. a file given explicitly ([`Loader::file`]), TOML, YAML or JSON by
//!    extension;
//! 4. `SITESYNC_*` environment variables, nested keys separated by `__`
//!    (`SITESYNC_SYNC__CONCURRENCY=8`);
//! 5. anything the caller merges on top of [`Loader::figment`], typically
//!    command-line flags.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use sitesync_compress::{Compression, CompressionPolicy, DEFAULT_MIN_SIZE, DEFAULT_SKIP_EXTENSIONS};
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SITESYNC_";
pub const DEFAULT_REGION: &str = "us-west-2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Region of the bucket (and of the website endpoint the CDN pulls from)
    pub region: String,
    /// S3-compatible endpoint override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Named profile from the shared credentials file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Explicit keys; when absent the provider's default chain is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    pub sync: SyncConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            profile: None,
            credentials: None,
            sync: SyncConfig::default(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub key_id: String,
    pub key_secret: String,
}
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("key_id", &self.key_id).field("key_secret", &"<redacted>").finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Number of upload workers
    pub concurrency: usize,
    /// Files discovered but not yet picked up by a worker
    pub queue_capacity: usize,
    pub cache_control: String,
    /// Canned ACL for uploads; empty to send none
    pub acl: String,
    pub compression: CompressionConfig,
}
impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queue_capacity: 100,
            cache_control: "max-age=900".to_string(),
            acl: "public-read".to_string(),
            compression: CompressionConfig::default(),
        }
    }
}
impl SyncConfig {
    pub fn acl(&self) -> Option<&str> {
        Some(self.acl.trim()).filter(|acl| !acl.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// `none`, `gzip`, `br` or `zstd`
    pub encoding: String,
    /// Files at or below this many bytes are not compressed
    pub min_size: u64,
    pub skip_extensions: Vec<String>,
}
impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            encoding: Compression::Gzip.to_string(),
            min_size: DEFAULT_MIN_SIZE,
            skip_extensions: DEFAULT_SKIP_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }
}
impl CompressionConfig {
    pub fn policy(&self) -> Result<CompressionPolicy> {
        let encoding = self.encoding.parse::<Compression>().or_raise(|| ErrorKind::Invalid {
            field: "sync.compression.encoding",
            reason: format!("unknown or disabled encoding {:?}", self.encoding),
        })?;
        Ok(CompressionPolicy::new(encoding, self.min_size, &self.skip_extensions))
    }
}

impl Config {
    /// Extract and validate a configuration from an assembled figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "region", reason: "must not be empty".to_string() });
        }
        if self.sync.concurrency < 1 {
            exn::bail!(ErrorKind::Invalid { field: "sync.concurrency", reason: "must be at least 1".to_string() });
        }
        if self.sync.queue_capacity < 1 {
            exn::bail!(ErrorKind::Invalid { field: "sync.queue_capacity", reason: "must be at least 1".to_string() });
        }
        self.sync.compression.policy()?;
        Ok(())
    }
}

/// Assembles the configuration sources.
#[derive(Debug, Clone)]
pub struct Loader {
    user_file: Option<PathBuf>,
    file: Option<PathBuf>,
}
impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
impl Loader {
    pub fn new() -> Self {
        let user_file = ProjectDirs::from("", "", "sitesync").map(|dirs| dirs.config_dir().join("config.toml"));
        Self { user_file, file: None }
    }

    /// Do not read the per-user configuration file.
    pub fn without_user_file(mut self) -> Self {
        self.user_file = None;
        self
    }

    /// Read this file in addition to (and over) the per-user one.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Every source except caller overrides, ready for more to be merged on top.
    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(user_file) = &self.user_file {
            tracing::debug!(path = %user_file.display(), exists = user_file.is_file(), "User configuration file");
            // A missing file contributes nothing.
            figment = figment.merge(Toml::file(user_file));
        }
        if let Some(file) = &self.file {
            if !file.is_file() {
                exn::bail!(ErrorKind::NotFound(file.clone()));
            }
            figment = merge_file(figment, file)?;
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn load(&self) -> Result<Config> {
        Config::from_figment(&self.figment()?)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
