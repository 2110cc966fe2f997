//! SQL LIKE patterns
//!
//! `%` matches any run of characters, `_` exactly one. Everything else is
//! literal.

use regex::{Regex, RegexBuilder};

use super::errors::{StorageError, StorageResult};

/// Compiles a LIKE pattern into an anchored regex
pub fn like_regex(pattern: &str, case_insensitive: bool) -> StorageResult<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut literal = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c => source.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| StorageError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards() {
        let re = like_regex("A%", false).unwrap();
        assert!(re.is_match("Alice"));
        assert!(re.is_match("A"));
        assert!(!re.is_match("Carl"));
        assert!(!re.is_match("alice"));

        let re = like_regex("c_rl", false).unwrap();
        assert!(re.is_match("carl"));
        assert!(!re.is_match("caarl"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let re = like_regex("a.b(c)%", false).unwrap();
        assert!(re.is_match("a.b(c)d"));
        assert!(!re.is_match("axb(c)d"));
    }

    #[test]
    fn test_case_insensitive() {
        let re = like_regex("al%", true).unwrap();
        assert!(re.is_match("ALICE"));
    }
}
