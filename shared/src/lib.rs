pub mod catalog;
pub mod etag;
pub mod health;
pub mod i18n;

pub use catalog::*;
pub use health::{HealthReport, ServiceHealth, ServiceStatus};
pub use i18n::{FALLBACK_LOCALE, Translatable};
