//! Substring-scan search predicate.
//!
//! Matches SQLite `LIKE` semantics: ASCII case-insensitive, with the user's
//! `%`, `_` and `\` escaped so they match literally.

use super::SearchFilter;
use rusqlite::types::Value;

/// Builds the `title OR content` substring filter.
pub fn scan_filter(query: &str) -> SearchFilter {
    let pattern = like_pattern(query);
    SearchFilter {
        sql: " AND (title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\')".to_string(),
        binds: vec![Value::Text(pattern.clone()), Value::Text(pattern)],
    }
}

/// Wraps an escaped query in `%...%`.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern("plain"), "%plain%");
    }
}
