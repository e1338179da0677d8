//! Query normalization.

/// Punctuation stripped from queries. ASCII `-` is kept so ISO dates survive.
const STRIPPED_PUNCTUATION: &[char] = &[
    '，', '。', '！', '？', '、', '；', '：', '“', '”', '‘', '’', '（', '）', '【', '】', '《', '》',
    ',', '.', '!', '?', ';', ':', '"', '\'', '(', ')', '[', ']', '<', '>',
];

/// Lowercases the query and removes whitespace and punctuation.
///
/// Pure and idempotent: `normalize(&normalize(q)) == normalize(q)`.
pub fn normalize(query: &str) -> String {
    query
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED_PUNCTUATION.contains(c))
        .collect()
}
