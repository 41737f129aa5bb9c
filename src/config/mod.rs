//! Closed configuration structure (spec §6). Loading itself is an external
//! collaborator's concern — the caller decides whether the bytes come from a
//! file, an env-embedded blob, or a test fixture — but the parsed shape and
//! its defaults live here, the way the teacher's `config::defaults` owns
//! `Config`'s `Default` impl independent of who reads the bytes off disk.

mod loader;
mod types;

pub use loader::{load_from_str, ConfigError};
pub use types::{
    BehaviorConfig, CacheConfig, Config, HttpConfig, LanguageConfig, ProxyConfig,
    ProxyProviderConfig, ProxyRotationConfig, RateConfig, RatePattern, RetryConfig,
    SearchDefaultsConfig,
};
