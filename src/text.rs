// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hashtag and mention extraction for rants and comments.
//!
//! A token is the prefix character followed by one or more ASCII word
//! characters (`[A-Za-z0-9_]`). Tokens are lowercased, kept in order of
//! appearance (duplicates included) and capped.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum hashtags stored per rant or comment.
pub const MAX_HASHTAGS: usize = 5;
/// Maximum mentions stored per rant or comment.
pub const MAX_MENTIONS: usize = 10;

static HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("Invalid hashtag regex"));

static MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("Invalid mention regex"));

/// Extract up to [`MAX_HASHTAGS`] `#tag` tokens.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    extract_tokens(&HASHTAG_REGEX, content, MAX_HASHTAGS)
}

/// Extract up to [`MAX_MENTIONS`] `@user` tokens.
pub fn extract_mentions(content: &str) -> Vec<String> {
    extract_tokens(&MENTION_REGEX, content, MAX_MENTIONS)
}

fn extract_tokens(pattern: &Regex, content: &str, max: usize) -> Vec<String> {
    pattern
        .captures_iter(content)
        .take(max)
        .map(|caps| caps[1].to_ascii_lowercase())
        .collect()
}

/// Normalize a user-supplied hashtag for lookup (`#Rust` -> `rust`).
pub fn normalize_hashtag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashtags_capped_at_five() {
        let tags = extract_hashtags("Hello #World #foo #bar #baz #qux #extra");
        assert_eq!(tags, vec!["world", "foo", "bar", "baz", "qux"]);
    }

    #[test]
    fn test_mentions_capped_at_ten() {
        let content = (0..12)
            .map(|i| format!("@user{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let mentions = extract_mentions(&content);
        assert_eq!(mentions.len(), MAX_MENTIONS);
        assert_eq!(mentions[0], "user0");
        assert_eq!(mentions[9], "user9");
    }

    #[test]
    fn test_token_stops_at_non_word_char() {
        assert_eq!(
            extract_hashtags("#rust-lang and #C++ #snake_case!"),
            vec!["rust", "c", "snake_case"]
        );
    }

    #[test]
    fn test_bare_prefix_and_doubled_prefix() {
        assert_eq!(extract_hashtags("# alone ##twice"), vec!["twice"]);
        assert_eq!(extract_mentions("email me @ home or@Bob"), vec!["bob"]);
    }

    #[test]
    fn test_non_ascii_letters_end_token() {
        assert_eq!(extract_hashtags("#café #naïve"), vec!["caf", "na"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        assert_eq!(extract_hashtags("#a #A #a"), vec!["a", "a", "a"]);
    }

    #[test]
    fn test_normalize_hashtag() {
        assert_eq!(normalize_hashtag("  #Rust "), "rust");
        assert_eq!(normalize_hashtag("Go"), "go");
    }
}
