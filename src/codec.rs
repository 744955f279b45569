//! Deterministic alias generation
//!
//! The alias is a pure function of the canonical URL: the canonical string is
//! hashed with xxh64 and the hash seeds a `StdRng` that draws the characters.
//! Re-shortening the same URL therefore yields the same alias without a lookup.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use url::Url;
use xxhash_rust::xxh64::xxh64;

use crate::errors::Result;

/// 62 个字母数字字符
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 规范化 URL：解析后重新序列化
///
/// `http://ya.ru` 规范化为 `http://ya.ru/`，主机名转小写，默认端口被省略。
pub fn normalize(raw_url: &str) -> Result<String> {
    let parsed = Url::parse(raw_url.trim())?;
    Ok(parsed.into())
}

/// 为 URL 生成定长短码（不加盐）
pub fn generate(original_url: &str, length: usize) -> Result<String> {
    generate_salted(original_url, length, 0)
}

/// 加盐生成短码，salt 为 0 时与 [`generate`] 相同
///
/// 冲突重试时依次使用 1, 2, 3 … 作为 salt。
pub fn generate_salted(original_url: &str, length: usize, salt: u64) -> Result<String> {
    let canonical = normalize(original_url)?;
    Ok(alias_for_canonical(&canonical, length, salt))
}

fn alias_for_canonical(canonical: &str, length: usize, salt: u64) -> String {
    let seed = xxh64(canonical.as_bytes(), salt);
    let mut rng = StdRng::seed_from_u64(seed);

    (0..length)
        .map(|_| {
            let idx = (rng.random::<u64>() % ALPHABET.len() as u64) as usize;
            ALPHABET[idx] as char
        })
        .collect()
}

/// 绑定了短码长度的生成器
#[derive(Debug, Clone, Copy)]
pub struct AliasCodec {
    length: usize,
}

impl AliasCodec {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// 返回 (规范化 URL, 短码)
    pub fn encode(&self, raw_url: &str, salt: u64) -> Result<(String, String)> {
        let canonical = normalize(raw_url)?;
        let alias = alias_for_canonical(&canonical, self.length, salt);
        Ok((canonical, alias))
    }

    pub fn generate(&self, raw_url: &str) -> Result<String> {
        generate(raw_url, self.length)
    }

    /// 对已规范化的 URL 生成短码
    pub fn alias_for(&self, canonical_url: &str, salt: u64) -> String {
        alias_for_canonical(canonical_url, self.length, salt)
    }
}

impl Default for AliasCodec {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShortenerError;

    #[test]
    fn test_alias_only_uses_alphabet() {
        let alias = generate("https://example.com/some/long/path?q=1", 12).unwrap();
        assert_eq!(alias.len(), 12);
        assert!(alias.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_zero_length_is_empty() {
        assert_eq!(generate("https://example.com", 0).unwrap(), "");
    }

    #[test]
    fn test_relative_url_rejected() {
        let err = generate("/just/a/path", 6).unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidInput(_)));
    }

    #[test]
    fn test_encode_returns_canonical_form() {
        let codec = AliasCodec::new(6);
        let (canonical, alias) = codec.encode("HTTP://YA.RU", 0).unwrap();
        assert_eq!(canonical, "http://ya.ru/");
        assert_eq!(alias, generate("http://ya.ru", 6).unwrap());
    }
}
