//! 配置值验证模块
//!
//! 启动时校验静态配置，非法值直接拒绝而不是静默回退默认值。

use super::StaticConfig;
use crate::errors::{Result, ShortenerError};

/// 短码长度上限
pub const MAX_ALIAS_LENGTH: usize = 32;

pub fn validate(config: &StaticConfig) -> Result<()> {
    if config.storage.ping_timeout_secs == 0 {
        return Err(ShortenerError::config(
            "storage.ping_timeout_secs must be at least 1",
        ));
    }

    let alias = &config.alias;
    if alias.length == 0 || alias.length > MAX_ALIAS_LENGTH {
        return Err(ShortenerError::config(format!(
            "alias.length must be within 1..={}, got {}",
            MAX_ALIAS_LENGTH, alias.length
        )));
    }
    if alias.max_attempts == 0 {
        return Err(ShortenerError::config("alias.max_attempts must be at least 1"));
    }

    let deletion = &config.deletion;
    if deletion.workers == 0 {
        return Err(ShortenerError::config("deletion.workers must be at least 1"));
    }
    if deletion.queue_depth == 0 {
        return Err(ShortenerError::config(
            "deletion.queue_depth must be at least 1",
        ));
    }
    if deletion.chunk_size == 0 {
        return Err(ShortenerError::config("deletion.chunk_size must be at least 1"));
    }

    if !matches!(config.logging.format.as_str(), "text" | "json") {
        return Err(ShortenerError::config(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            config.logging.format
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&StaticConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_ping_timeout_rejected() {
        let mut config = StaticConfig::default();
        config.storage.ping_timeout_secs = 0;
        assert!(matches!(validate(&config), Err(ShortenerError::Config(_))));
    }

    #[test]
    fn test_zero_alias_length_rejected() {
        let mut config = StaticConfig::default();
        config.alias.length = 0;
        assert!(matches!(validate(&config), Err(ShortenerError::Config(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = StaticConfig::default();
        config.deletion.workers = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = StaticConfig::default();
        config.logging.format = "yaml".to_string();
        assert!(validate(&config).is_err());
    }
}
