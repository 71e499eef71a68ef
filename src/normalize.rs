//! Canonical form used whenever two artist names are compared.

const ARTICLE: &str = "the ";

/// Lowercase, trim, fold typographic quotes, collapse whitespace and drop any
/// leading "the ". Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(name: &str) -> String {
    let folded = name
        .to_lowercase()
        .replace('’', "'")
        .replace('‘', "'")
        .replace('`', "'")
        .replace('“', "\"")
        .replace('”', "\"");

    let mut collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");

    // "The The" strips down to "the", never to an empty string
    while let Some(rest) = collapsed.strip_prefix(ARTICLE) {
        collapsed = rest.trim_start().to_string();
    }

    collapsed
}
