//! Configuration management for the RingCaptcha server.
//!
//! Sources, lowest priority first: built-in defaults, the TOML file,
//! `RING__*` environment variables, then CLI flags.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use ring_common::constants::{
    CAPTCHA_IMAGE_MIN_HEIGHT, CAPTCHA_IMAGE_MIN_WIDTH, DEFAULT_CAPTCHA_TTL_SECS,
    DEFAULT_COMPOSE_TIMEOUT_SECS, DEFAULT_FILE_CACHE_MAX_BYTES, DEFAULT_IMAGE_SIZE,
    DEFAULT_LISTEN_ADDR, DEFAULT_MAX_RECORDS, DEFAULT_SERVER_NAME, DEFAULT_SWEEP_INTERVAL_SECS,
};
use ring_painter::ComposerSettings;

/// Prefix of environment overrides: RING__CAPTCHA__TTL_SECS=60
const ENV_PREFIX: &str = "RING";
const ENV_SEPARATOR: &str = "__";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Value of the `Server` header on image responses
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Captcha synthesis and registry
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Image persistence
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Captcha-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default = "default_image_size")]
    pub image_width: u32,

    #[serde(default = "default_image_size")]
    pub image_height: u32,

    /// Answer validity in seconds
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// Period of the expiry sweep in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Live record limit
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Upper bound on one image synthesis
    #[serde(default = "default_compose_timeout")]
    pub compose_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub use_brush_sample: bool,

    #[serde(default)]
    pub blend_strokes: bool,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            image_width: default_image_size(),
            image_height: default_image_size(),
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            max_records: default_max_records(),
            compose_timeout_secs: default_compose_timeout(),
            use_brush_sample: true,
            blend_strokes: false,
        }
    }
}

impl CaptchaConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn compose_timeout(&self) -> Duration {
        Duration::from_secs(self.compose_timeout_secs)
    }

    pub fn composer_settings(&self) -> ComposerSettings {
        ComposerSettings {
            use_brush_sample: self.use_brush_sample,
            blend_strokes: self.blend_strokes,
        }
    }
}

/// Image storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Keep images on disk and serve them from /image instead of inline
    #[serde(default)]
    pub store_images: bool,

    #[serde(default = "default_images_folder")]
    pub images_folder: String,

    /// Remove leftovers of a previous run on startup
    #[serde(default)]
    pub clear_images_folder_at_start: bool,

    /// In-memory cache volume in front of the folder
    #[serde(default = "default_file_cache_max_bytes")]
    pub file_cache_max_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_images: false,
            images_folder: default_images_folder(),
            clear_images_folder_at_start: false,
            file_cache_max_bytes: default_file_cache_max_bytes(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_server_name() -> String { DEFAULT_SERVER_NAME.to_string() }
fn default_image_size() -> u32 { DEFAULT_IMAGE_SIZE }
fn default_ttl() -> u64 { DEFAULT_CAPTCHA_TTL_SECS } // 5 minutes
fn default_sweep_interval() -> u64 { DEFAULT_SWEEP_INTERVAL_SECS } // 1 minute
fn default_max_records() -> usize { DEFAULT_MAX_RECORDS }
fn default_compose_timeout() -> u64 { DEFAULT_COMPOSE_TIMEOUT_SECS }
fn default_true() -> bool { true }
fn default_images_folder() -> String { "data/images".to_string() }
fn default_file_cache_max_bytes() -> usize { DEFAULT_FILE_CACHE_MAX_BYTES }

impl AppConfig {
    /// Load configuration from file and environment, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        if !Path::new(config_path).exists() {
            tracing::warn!("Config file not found, using defaults and environment");
        }

        let mut config = Self::from_sources(config_path)?;

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref folder) = args.images_folder {
            config.storage.images_folder = folder.clone();
        }
        if args.store_images {
            config.storage.store_images = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Merge the optional file with `RING__*` environment variables.
    pub fn from_sources(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server_name.trim().is_empty() {
            bail!("server_name is not set");
        }
        if self.captcha.image_width < CAPTCHA_IMAGE_MIN_WIDTH
            || self.captcha.image_height < CAPTCHA_IMAGE_MIN_HEIGHT
        {
            bail!(
                "captcha image must be at least {}x{}, got {}x{}",
                CAPTCHA_IMAGE_MIN_WIDTH,
                CAPTCHA_IMAGE_MIN_HEIGHT,
                self.captcha.image_width,
                self.captcha.image_height
            );
        }
        if self.captcha.ttl_secs == 0 {
            bail!("captcha.ttl_secs must be positive");
        }
        if self.captcha.sweep_interval_secs == 0 {
            bail!("captcha.sweep_interval_secs must be positive");
        }
        if self.captcha.compose_timeout_secs == 0 {
            bail!("captcha.compose_timeout_secs must be positive");
        }
        if self.captcha.max_records == 0 {
            bail!("captcha.max_records must be positive");
        }
        if self.storage.store_images && self.storage.images_folder.trim().is_empty() {
            bail!("storage.images_folder is not set");
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            server_name: default_server_name(),
            captcha: CaptchaConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}
