//! Read-only statement policy
//!
//! Generated SQL is untrusted model text. The prompt forbids mutating
//! statements, but the same rule is enforced here as an explicit check and
//! re-applied by the executor immediately before running anything.

use thiserror::Error;

/// Statement keywords that are never executed, matched as whole words,
/// case-insensitive, with string literals masked out first.
pub const FORBIDDEN_KEYWORDS: &[&str] =
    &["INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER"];

/// Keywords whose presence marks an aggregated query, which is exempt from
/// the programmatic row cap.
const AGGREGATION_KEYWORDS: &[&str] = &["COUNT", "SUM", "AVG", "MIN", "MAX", "GROUP"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Statement contains forbidden keyword {keyword}: only read (SELECT) queries are executed")]
pub struct PolicyViolation {
    pub keyword: String,
}

/// Reject any statement containing a forbidden (DML/DDL) keyword.
///
/// Matching is word-based so that identifiers like `created_at` or
/// `last_update` pass, and literal-aware so that a quoted value such as
/// `'DROP'` does not trip the check.
pub fn check_statement(sql: &str) -> Result<(), PolicyViolation> {
    let masked = mask_string_literals(sql);
    for word in words(&masked) {
        for keyword in FORBIDDEN_KEYWORDS {
            if word.eq_ignore_ascii_case(keyword) {
                return Err(PolicyViolation {
                    keyword: (*keyword).to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Append `LIMIT <cap>` to a sanitized statement that has no aggregation
/// and no limit of its own. Aggregated queries return few rows by nature
/// and are left untouched, as is anything that already carries a LIMIT.
pub fn enforce_row_cap(sql: &str, cap: u32) -> String {
    let masked = mask_string_literals(sql);
    let mut has_limit = false;
    let mut has_aggregation = false;
    for word in words(&masked) {
        if word.eq_ignore_ascii_case("LIMIT") {
            has_limit = true;
        }
        if AGGREGATION_KEYWORDS
            .iter()
            .any(|k| word.eq_ignore_ascii_case(k))
        {
            has_aggregation = true;
        }
    }
    if has_limit || has_aggregation {
        return sql.to_string();
    }

    let body = sql.trim_end().trim_end_matches(';').trim_end();
    format!("{body} LIMIT {cap};")
}

fn words(sql: &str) -> impl Iterator<Item = &str> + '_ {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

/// Blank out the contents of single-quoted strings and backtick-quoted
/// identifiers. Keyword scanning runs on the masked text only.
fn mask_string_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
            None => {
                if c == '\'' || c == '`' || c == '"' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}
