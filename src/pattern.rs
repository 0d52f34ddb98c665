//! # Fact-Pattern Normalization
//!
//! Rewrites a tracked attribute's serialized value into the query syntax
//! the fact store understands. Pure functions — no I/O, no state.
//!
//! The transform is deliberately a best-effort token replacement against
//! the store's documented query syntax, not a parser:
//!
//! | Input token | Rewritten as | Effect |
//! |-------------|--------------|--------|
//! | `AND`       | `]] [[`      | splits into adjacent clauses (conjunction) |
//! | `OR`        | `]] OR [[`   | explicit alternation between clauses |
//! | list separator (configured) | ` \|\| ` | in-clause alternation |
//!
//! A trailing list separator is stripped before rewriting; the separator
//! convention comes from an optional companion form-input module that
//! stores multi-value properties joined by a custom character, which
//! otherwise breaks query parsing. The result is wrapped in `[[…]]`.

/// Normalize one serialized fact value into a full linked-page query.
///
/// `"A AND B"` → `[[A ]] [[ B]]` (both required),
/// `"A OR B"` → `[[A ]] OR [[ B]]` (either),
/// `"A;B;"` with separator `;` → `[[A || B]]`.
pub fn normalize(raw: &str, list_separator: Option<char>) -> String {
    let mut query = raw.replace("AND", "]] [[");
    query = query.replace("OR", "]] OR [[");

    if let Some(sep) = list_separator {
        query = query.trim_end_matches(sep).to_string();
        query = query.replace(sep, " || ");
    }

    format!("[[{query}]]")
}
