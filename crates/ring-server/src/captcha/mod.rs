//! Captcha creation, verification and image storage.

mod manager;
mod storage;
mod sweeper;

pub use manager::{CaptchaImageData, CaptchaManager, CreatedCaptcha, ManagerSettings};
pub use storage::{FileImageStore, ImageStore, MemoryImageStore};
pub use sweeper::sweeper_worker;
