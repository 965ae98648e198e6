//! Application state and shared resources.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::captcha::{CaptchaManager, FileImageStore, ImageStore, ManagerSettings};
use crate::config::AppConfig;
use crate::registry::AnswerRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Captcha lifecycle
    pub manager: Arc<CaptchaManager>,

    /// RPC request counters
    pub stats: Arc<RpcStats>,
}

/// Diagnostic counters
#[derive(Debug, Default)]
pub struct RpcStats {
    total: AtomicU64,
    successful: AtomicU64,
}

impl RpcStats {
    pub fn record_request(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successful.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn successful(&self) -> u64 {
        self.successful.load(Ordering::Relaxed)
    }
}

impl AppState {
    /// Build the registry, the image store and the manager from config
    pub fn new(config: AppConfig) -> Result<Self> {
        let store: Option<Arc<dyn ImageStore>> = if config.storage.store_images {
            let store = FileImageStore::open(
                &config.storage.images_folder,
                config.storage.clear_images_folder_at_start,
                config.storage.file_cache_max_bytes,
            )
            .with_context(|| format!("Failed to open images folder {}", config.storage.images_folder))?;
            Some(Arc::new(store))
        } else {
            None
        };

        let registry = AnswerRegistry::new(config.captcha.ttl(), config.captcha.max_records);
        let manager = CaptchaManager::new(
            ManagerSettings {
                image_width: config.captcha.image_width,
                image_height: config.captcha.image_height,
                composer: config.captcha.composer_settings(),
            },
            registry,
            store,
        );

        Ok(Self::with_manager(config, Arc::new(manager)))
    }

    pub fn with_manager(config: AppConfig, manager: Arc<CaptchaManager>) -> Self {
        Self {
            config: Arc::new(config),
            manager,
            stats: Arc::new(RpcStats::default()),
        }
    }
}
