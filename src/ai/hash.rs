//! Content fingerprinting and comment id minting.
//!
//! The content hash is an 8-hex-digit rolling hash over the SOURCE content a
//! comment was generated from. It is stored in the comment's frontmatter
//! entry so staleness can be detected after the note body is edited. It is a
//! fingerprint, not a cryptographic digest.

use chrono::Local;
use parking_lot::Mutex;

/// Rolling hash over UTF-16 code units, formatted as 8 lowercase hex digits.
///
/// Deterministic for identical input; distinct inputs diverge with high
/// probability. Output is always exactly 8 characters, zero-padded.
pub fn content_hash(content: &str) -> String {
    let mut hash: i32 = 0;
    for unit in content.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    format!("{:08x}", hash as u32)
}

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 4;

/// Mints unique comment ids: `<cli>-<type>-<date>T<time>-<suffix>`.
///
/// The time token is `YYYYMMDD` `T` `HHMMSS` plus two centisecond digits; the
/// suffix is 4 random `[a-z0-9]` characters. Instance-scoped: each minter
/// remembers its last id so two calls never return the same one, even for
/// identical `(cli, type)` within the same centisecond.
#[derive(Debug, Default)]
pub struct IdMinter {
    last: Mutex<Option<String>>,
}

impl IdMinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self, cli: &str, comment_type: &str) -> String {
        let now = Local::now();
        let centis = now.timestamp_subsec_millis() / 10;
        let token = format!("{}{:02}", now.format("%Y%m%dT%H%M%S"), centis);

        let mut last = self.last.lock();
        loop {
            let suffix: String = (0..SUFFIX_LEN)
                .map(|_| SUFFIX_ALPHABET[fastrand::usize(..SUFFIX_ALPHABET.len())] as char)
                .collect();
            let id = format!("{}-{}-{}-{}", cli, comment_type, token, suffix);
            if last.as_deref() != Some(id.as_str()) {
                *last = Some(id.clone());
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(content_hash("Content A"), content_hash("Content A"));
    }

    #[test]
    fn hash_distinguishes_inputs() {
        assert_ne!(content_hash("Content A"), content_hash("Content B"));
    }

    #[test]
    fn hash_is_eight_lowercase_hex() {
        for input in ["", "a", "Content A", "日本語のテキスト", &"x".repeat(10_000)] {
            let h = content_hash(input);
            assert_eq!(h.len(), 8, "hash of {:?} should be 8 chars", input);
            assert!(
                h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
                "hash {:?} should be lowercase hex",
                h
            );
        }
    }

    #[test]
    fn comment_ids_match_format() {
        let re = regex::Regex::new(r"^claude-summary-\d{8}T\d{8}-[a-z0-9]{4}$").unwrap();
        let id = IdMinter::new().mint("claude", "summary");
        assert!(re.is_match(&id), "id {:?} should match format", id);
    }

    #[test]
    fn comment_ids_are_unique_per_minter() {
        let minter = IdMinter::new();
        let a = minter.mint("gemini", "factcheck");
        let b = minter.mint("gemini", "factcheck");
        assert_ne!(a, b, "back-to-back ids must differ");
    }
}
