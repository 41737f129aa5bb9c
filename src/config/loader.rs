//! TOML parsing for [`Config`]. *Triggering* a load (deciding which file,
//! when) is the embedding application's concern; this module only turns
//! bytes into a validated struct or a load-time error.

use super::types::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parses a TOML document into a [`Config`]. Unrecognized keys at any level
/// are a load-time error (spec §6, §9 redesign flag) rather than silently
/// ignored.
pub fn load_from_str(raw: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = load_from_str("").unwrap();
        assert!(config.proxy.enabled);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn partial_override_preserves_other_defaults() {
        let config = load_from_str("[cache]\nttl_seconds = 120\n").unwrap();
        assert_eq!(config.cache.ttl_seconds, 120);
        assert_eq!(config.cache.max_entries, 10_000);
    }

    #[test]
    fn unknown_option_is_a_load_time_error() {
        let err = load_from_str("[cache]\nbogus_option = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_out_of_enum_rate_pattern() {
        let err = load_from_str("[rate]\npattern = \"chaotic\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
