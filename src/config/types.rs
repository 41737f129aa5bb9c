//! Enumerated configuration surface (spec §6). `#[serde(deny_unknown_fields)]`
//! on every level makes an unrecognized option a load-time error rather than
//! a silently ignored typo (spec §9 redesign: "the port must define a single
//! closed configuration structure... options not in the enumerated set are a
//! load-time error").

use serde::{Deserialize, Serialize};

use crate::model::behavior::TimingProfile;
use crate::model::proxy::ProxyKind;
use crate::model::query::Language;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub proxy: ProxyConfig,
    pub rate: RateConfig,
    pub behavior: BehaviorConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub search: SearchDefaultsConfig,
    pub http: HttpConfig,
    pub language: LanguageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            rate: RateConfig::default(),
            behavior: BehaviorConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            search: SearchDefaultsConfig::default(),
            http: HttpConfig::default(),
            language: LanguageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub providers: Vec<ProxyProviderConfig>,
    pub rotation: ProxyRotationConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            providers: Vec::new(),
            rotation: ProxyRotationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyProviderConfig {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub kind: ProxyKind,
    pub region: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProxyRotationConfig {
    pub requests_per_handle: u32,
    pub window_seconds: u64,
}

impl Default for ProxyRotationConfig {
    fn default() -> Self {
        Self {
            requests_per_handle: 20,
            window_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePattern {
    Steady,
    Burst,
    Ramp,
    Random,
    Adaptive,
}

impl Default for RatePattern {
    fn default() -> Self {
        RatePattern::Adaptive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RateConfig {
    pub requests_per_minute: u32,
    pub burst_allowance: u32,
    pub pattern: RatePattern,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 20,
            burst_allowance: 5,
            pattern: RatePattern::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BehaviorConfig {
    pub profile: TimingProfile,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            profile: TimingProfile::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SearchDefaultsConfig {
    pub default_confidence_threshold: f64,
    pub default_fuzzy: bool,
}

impl Default for SearchDefaultsConfig {
    fn default() -> Self {
        Self {
            default_confidence_threshold: 0.75,
            default_fuzzy: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agents: Vec<String>,
    pub base_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15".to_string(),
            ],
            base_url: "https://locator.ice.gov".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LanguageConfig {
    pub default: Language,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self { default: Language::En }
    }
}
