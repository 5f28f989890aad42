//! Composite context / n-gram keys.
//!
//! Keys are tokens joined by a single space. Tokens come from whitespace
//! splitting and so never contain the separator, which keeps every key
//! unambiguous and lets a key be split back into its parts.

/// Separator between tokens inside a key.
pub const KEY_SEPARATOR: &str = " ";

/// Join a run of tokens into a key.
pub fn join(tokens: &[&str]) -> String {
    tokens.join(KEY_SEPARATOR)
}

/// Key of the n-gram formed by `context` followed by `token`.
///
/// An empty context (order 1) yields the bare token.
pub fn ngram_key(context: &str, token: &str) -> String {
    if context.is_empty() {
        token.to_string()
    } else {
        format!("{context}{KEY_SEPARATOR}{token}")
    }
}

/// Split an n-gram key into `(context, next token)`.
pub fn split_ngram(key: &str) -> (&str, &str) {
    key.rsplit_once(KEY_SEPARATOR).unwrap_or(("", key))
}
