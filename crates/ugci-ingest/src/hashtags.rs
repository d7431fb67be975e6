use std::sync::LazyLock;

use regex::Regex;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid regex"));

/// Every `#tag` in `text`, lowercased, in order of appearance.
///
/// `\w` is Unicode-aware, so CJK tags are kept whole. Duplicates are kept.
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_lowercase())
        .collect()
}
