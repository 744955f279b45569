//! AliasCodec tests

use shortener::codec::{ALPHABET, AliasCodec, generate, generate_salted, normalize};

#[test]
fn test_pinned_alias_for_ya_ru() {
    assert_eq!(generate("http://ya.ru", 6).unwrap(), "MPXIy2");
}

#[test]
fn test_pinned_aliases_for_other_urls() {
    assert_eq!(generate("https://ya.ru/", 6).unwrap(), "xmloKF");
    assert_eq!(generate("https://example.com/", 6).unwrap(), "izRKfC");
}

#[test]
fn test_equivalent_spellings_share_an_alias() {
    let canonical = generate("http://ya.ru/", 6).unwrap();
    assert_eq!(generate("http://ya.ru", 6).unwrap(), canonical);
    assert_eq!(generate("HTTP://YA.RU:80", 6).unwrap(), canonical);
    assert_eq!(generate("  http://ya.ru  ", 6).unwrap(), canonical);
}

#[test]
fn test_salt_changes_alias() {
    let unsalted = generate_salted("http://ya.ru", 6, 0).unwrap();
    let salted = generate_salted("http://ya.ru", 6, 1).unwrap();
    assert_eq!(unsalted, "MPXIy2");
    assert_ne!(unsalted, salted);
    assert_eq!(salted, generate_salted("http://ya.ru", 6, 1).unwrap());
}

#[test]
fn test_longer_alias_extends_shorter_one() {
    let short = generate("http://ya.ru", 6).unwrap();
    let long = generate("http://ya.ru", 10).unwrap();
    assert_eq!(long.len(), 10);
    assert!(long.starts_with(&short));
    assert!(long.bytes().all(|b| ALPHABET.contains(&b)));
}

#[test]
fn test_codec_uses_configured_length() {
    let codec = AliasCodec::new(8);
    let (canonical, alias) = codec.encode("http://ya.ru", 0).unwrap();
    assert_eq!(canonical, "http://ya.ru/");
    assert_eq!(alias.len(), 8);
    assert_eq!(codec.alias_for(&canonical, 0), alias);
    assert_eq!(AliasCodec::default().generate("http://ya.ru").unwrap(), "MPXIy2");
}

#[test]
fn test_normalize_rejects_garbage() {
    assert!(normalize("").is_err());
    assert!(normalize("not a url").is_err());
    assert!(normalize("example.com/path").is_err());
}
