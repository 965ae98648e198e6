//! Captcha lifecycle: compose, encode, store, register, verify.

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use ring_common::constants::{ids, image_format};
use ring_common::{RingError, RingResult};
use ring_painter::{ComposerSettings, RandomSource, compose, encode_png};

use super::storage::ImageStore;
use crate::registry::AnswerRegistry;

/// Where the image of a new captcha went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptchaImageData {
    /// PNG bytes returned to the caller
    Inline(Vec<u8>),
    /// Stored under this key, served by /image
    Stored(String),
}

/// A freshly registered captcha.
#[derive(Debug, Clone)]
pub struct CreatedCaptcha {
    pub task_id: String,
    pub image: CaptchaImageData,
    /// The answer. Never sent to clients.
    pub ring_count: u32,
    /// Unix timestamp after which the answer is void
    pub expires_at: i64,
}

/// Manager settings
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub image_width: u32,
    pub image_height: u32,
    pub composer: ComposerSettings,
}

/// Ties the painter, the registry and the optional image store together.
pub struct CaptchaManager {
    settings: ManagerSettings,
    registry: AnswerRegistry,
    store: Option<Arc<dyn ImageStore>>,
}

impl CaptchaManager {
    /// `store` is `None` when images are returned inline
    pub fn new(
        settings: ManagerSettings,
        registry: AnswerRegistry,
        store: Option<Arc<dyn ImageStore>>,
    ) -> Self {
        Self {
            settings,
            registry: registry.with_release_tracking(store.is_some()),
            store,
        }
    }

    pub fn stores_images(&self) -> bool {
        self.store.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.registry.ttl()
    }

    /// Records held by the registry
    pub fn registry_len(&self) -> usize {
        self.registry.len()
    }

    /// Create a captcha using the thread-local generator.
    pub fn create_captcha(&self) -> RingResult<CreatedCaptcha> {
        self.create_captcha_with(&mut rand::rng())
    }

    /// Create a captcha drawing its layout from `rng`.
    ///
    /// Nothing is registered unless the image was composed, encoded and
    /// (when storing) written.
    pub fn create_captcha_with<R: RandomSource + ?Sized>(&self, rng: &mut R) -> RingResult<CreatedCaptcha> {
        let image = compose(
            self.settings.image_width,
            self.settings.image_height,
            &self.settings.composer,
            rng,
        )?;
        let png = encode_png(image.canvas())?;
        let ring_count = image.ring_count();

        let task_id = generate_task_id();

        let image = match &self.store {
            Some(store) => {
                let key = image_key(&task_id);
                store.put(&key, &png)?;
                CaptchaImageData::Stored(key)
            }
            None => CaptchaImageData::Inline(png),
        };

        if let Err(e) = self.registry.create(&task_id, ring_count) {
            if let (Some(store), CaptchaImageData::Stored(key)) = (&self.store, &image) {
                if let Err(forget_err) = store.forget(key) {
                    tracing::warn!(key = %key, error = %forget_err, "Failed to drop unregistered image");
                }
            }
            return Err(e);
        }

        let expires_at = chrono::Utc::now().timestamp() + self.ttl().as_secs() as i64;

        tracing::debug!(
            task_id = %task_id,
            ring_count = ring_count,
            stored = self.stores_images(),
            "Created captcha"
        );

        Ok(CreatedCaptcha {
            task_id,
            image,
            ring_count,
            expires_at,
        })
    }

    /// Verify a guess. The captcha is spent whatever the result.
    pub fn check_answer(&self, task_id: &str, guess: u32) -> RingResult<bool> {
        if task_id.is_empty() {
            return Err(RingError::IdNotSet);
        }
        if guess == 0 {
            return Err(RingError::AnswerNotSet);
        }

        let ok = self.registry.check(task_id, guess)?;
        tracing::debug!(task_id = %task_id, success = ok, "Checked captcha");
        Ok(ok)
    }

    /// True while the captcha can still be answered
    pub fn has_answer(&self, task_id: &str) -> RingResult<bool> {
        if task_id.is_empty() {
            return Err(RingError::IdNotSet);
        }
        Ok(self.registry.exists(task_id))
    }

    /// PNG bytes of a live, stored captcha.
    ///
    /// Unknown ids are reported before disabled storage.
    pub fn get_image(&self, task_id: &str) -> RingResult<Vec<u8>> {
        if task_id.is_empty() {
            return Err(RingError::IdNotSet);
        }
        if !self.registry.exists(task_id) {
            return Err(RingError::UnknownId(task_id.to_string()));
        }
        let store = self.store.as_ref().ok_or(RingError::StorageDisabled)?;
        store.get(&image_key(task_id))
    }

    /// Drop expired answers and the images of spent captchas.
    ///
    /// Returns the number of expired records.
    pub fn sweep(&self) -> usize {
        let report = self.registry.sweep_expired();

        if let Some(store) = &self.store {
            for id in &report.released {
                if let Err(e) = store.forget(&image_key(id)) {
                    tracing::warn!(task_id = %id, error = %e, "Failed to forget captcha image");
                }
            }
        }

        if report.expired > 0 || !report.released.is_empty() {
            tracing::debug!(
                expired = report.expired,
                released = report.released.len(),
                "Registry swept"
            );
        }

        report.expired
    }
}

/// Random task id: RCS-{base64url(16 bytes)}
fn generate_task_id() -> String {
    let mut bytes = [0u8; ids::TASK_ID_RANDOM_BYTES];
    rand::rng().fill(&mut bytes);
    format!("{}{}", ids::TASK_ID_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}

fn image_key(task_id: &str) -> String {
    format!("{}.{}", task_id, image_format::FILE_EXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::storage::MemoryImageStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ring_painter::ScriptedSource;

    const PNG_MAGIC: &[u8] = b"\x89PNG";

    fn settings() -> ManagerSettings {
        ManagerSettings {
            image_width: 128,
            image_height: 128,
            composer: ComposerSettings::default(),
        }
    }

    fn inline_manager() -> CaptchaManager {
        CaptchaManager::new(settings(), AnswerRegistry::new(Duration::from_secs(60), 100), None)
    }

    fn stored_manager(store: Arc<MemoryImageStore>) -> CaptchaManager {
        CaptchaManager::new(
            settings(),
            AnswerRegistry::new(Duration::from_secs(60), 100),
            Some(store),
        )
    }

    #[test]
    fn test_task_id_format() {
        let id = generate_task_id();
        assert!(id.starts_with("RCS-"));
        // 16 bytes -> 22 base64 characters without padding
        assert_eq!(id.len(), 4 + 22);
        assert!(!id.contains('/') && !id.contains('='));
        assert_ne!(id, generate_task_id());
    }

    #[test]
    fn test_inline_captcha_round_trip() {
        let manager = inline_manager();
        let mut rng = StdRng::seed_from_u64(11);
        let created = manager.create_captcha_with(&mut rng).unwrap();

        let CaptchaImageData::Inline(png) = &created.image else {
            panic!("expected inline image");
        };
        assert!(png.starts_with(PNG_MAGIC));
        assert!((3..=4).contains(&created.ring_count));
        assert!(created.expires_at > chrono::Utc::now().timestamp());

        assert_eq!(manager.has_answer(&created.task_id), Ok(true));
        assert_eq!(manager.get_image(&created.task_id), Err(RingError::StorageDisabled));
        assert_eq!(manager.check_answer(&created.task_id, created.ring_count), Ok(true));
        assert_eq!(manager.has_answer(&created.task_id), Ok(false));
    }

    #[test]
    fn test_stored_captcha_is_served_then_forgotten() {
        let store = Arc::new(MemoryImageStore::new());
        let manager = stored_manager(store.clone());
        let created = manager.create_captcha().unwrap();

        assert_eq!(created.image, CaptchaImageData::Stored(format!("{}.png", created.task_id)));
        assert!(manager.get_image(&created.task_id).unwrap().starts_with(PNG_MAGIC));

        // Wrong answer still spends the captcha
        let wrong = if created.ring_count == 3 { 4 } else { 3 };
        assert_eq!(manager.check_answer(&created.task_id, wrong), Ok(false));
        assert!(matches!(manager.get_image(&created.task_id), Err(RingError::UnknownId(_))));

        // The file goes on the next sweep
        assert_eq!(store.len(), 1);
        assert_eq!(manager.sweep(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_request_validation() {
        let manager = inline_manager();
        assert_eq!(manager.check_answer("", 3), Err(RingError::IdNotSet));
        assert_eq!(manager.check_answer("RCS-x", 0), Err(RingError::AnswerNotSet));
        assert_eq!(manager.has_answer(""), Err(RingError::IdNotSet));
        assert!(matches!(manager.check_answer("RCS-x", 3), Err(RingError::UnknownId(_))));
        assert_eq!(manager.has_answer("RCS-x"), Ok(false));
    }

    #[test]
    fn test_inline_get_image_checks_id_first() {
        let manager = inline_manager();
        assert_eq!(manager.get_image(""), Err(RingError::IdNotSet));
        assert!(matches!(manager.get_image("RCS-never-issued"), Err(RingError::UnknownId(_))));

        let created = manager.create_captcha().unwrap();
        assert_eq!(manager.get_image(&created.task_id), Err(RingError::StorageDisabled));
    }

    #[test]
    fn test_inline_manager_releases_nothing() {
        let manager = inline_manager();
        let created = manager.create_captcha().unwrap();
        manager.check_answer(&created.task_id, 1).unwrap();

        // Nothing queued for image cleanup without a store
        assert_eq!(manager.registry.sweep_expired().released, Vec::<String>::new());
    }

    #[test]
    fn test_failed_synthesis_registers_nothing() {
        let store = Arc::new(MemoryImageStore::new());
        let manager = stored_manager(store.clone());

        // Background and ring count only; the first layer runs dry
        let mut src = ScriptedSource::new([1, 3]);
        assert!(matches!(manager.create_captcha_with(&mut src), Err(RingError::Random(_))));
        assert_eq!(manager.registry_len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_full_registry_drops_stored_image() {
        let store = Arc::new(MemoryImageStore::new());
        let manager = CaptchaManager::new(
            settings(),
            AnswerRegistry::new(Duration::from_secs(60), 1),
            Some(store.clone()),
        );

        manager.create_captcha().unwrap();
        assert_eq!(manager.create_captcha().unwrap_err(), RingError::RegistryFull(1));
        assert_eq!(store.len(), 1);
        assert_eq!(manager.registry_len(), 1);
    }
}
