//! Pagination and search helpers for listing endpoints.

/// Default page size for user listings.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Maximum page size for user listings.
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Clamp a user-provided limit to `[1, max]`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Escape `LIKE`/`ILIKE` metacharacters so the term matches literally.
///
/// Uses the PostgreSQL default escape character (`\`).
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Normalize an optional search term: trimmed, `None` when blank.
pub fn normalize_search(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
