//! Output sanitizer for raw model completions
//!
//! Models are told not to wrap SQL in markdown fences, but smaller ones do
//! it anyway. This is a pure text transform: strip one surrounding fence if
//! present, normalize the trailing terminator, touch nothing in between.

/// Strip surrounding code-fence markers and normalize statement termination.
///
/// The result always ends with exactly one `;`. Idempotent by construction:
/// sanitized output contains no fence and exactly one trailing terminator,
/// so a second pass is a no-op.
pub fn sanitize(raw: &str) -> String {
    let mut s = raw.trim();

    if let Some(rest) = s.strip_prefix("```") {
        // Optional language tag on the fence line ("sql", "SQL", "mysql", ...).
        let rest = match rest.split_once('\n') {
            Some((tag, body)) if is_fence_tag(tag) => body,
            _ => rest,
        };
        s = rest;
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }

    let s = s.trim();
    let s = s.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    format!("{s};")
}

fn is_fence_tag(tag: &str) -> bool {
    let tag = tag.trim();
    tag.is_empty() || tag.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sql_fence() {
        assert_eq!(
            sanitize("```sql\nSELECT * FROM employees\n```"),
            "SELECT * FROM employees;"
        );
    }

    #[test]
    fn strips_uppercase_fence_tag() {
        assert_eq!(
            sanitize("```SQL\nSELECT 1\n```"),
            "SELECT 1;"
        );
    }

    #[test]
    fn strips_dialect_tagged_fence() {
        assert_eq!(
            sanitize("```mysql\nSELECT emp_no FROM employees LIMIT 10\n```"),
            "SELECT emp_no FROM employees LIMIT 10;"
        );
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(sanitize("```\nSELECT 1;\n```"), "SELECT 1;");
    }

    #[test]
    fn appends_missing_terminator() {
        assert_eq!(sanitize("SELECT 1"), "SELECT 1;");
    }

    #[test]
    fn collapses_repeated_terminators() {
        assert_eq!(sanitize("SELECT 1;;;"), "SELECT 1;");
        assert_eq!(sanitize("SELECT 1; ; ;"), "SELECT 1;");
    }

    #[test]
    fn preserves_plain_statement() {
        assert_eq!(
            sanitize("SELECT COUNT(*) AS total FROM employees;"),
            "SELECT COUNT(*) AS total FROM employees;"
        );
    }

    #[test]
    fn preserves_interior_semicolons_and_quotes() {
        assert_eq!(
            sanitize("SELECT * FROM t WHERE note = 'a;b'"),
            "SELECT * FROM t WHERE note = 'a;b';"
        );
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "```sql\nSELECT * FROM employees\n```",
            "SELECT 1;;",
            "  SELECT x FROM y  ",
            "```\nSELECT 1\n```",
        ];
        for raw in inputs {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn fence_on_single_line_is_not_mistaken_for_tag() {
        // No language tag: the statement begins right after the fence.
        assert_eq!(sanitize("```SELECT 1```"), "SELECT 1;");
    }

    #[test]
    fn multiline_statement_survives() {
        let raw = "```sql\nSELECT d.dept_name,\n       COUNT(*) AS headcount\nFROM dept_emp de\nJOIN departments d ON d.dept_no = de.dept_no\nGROUP BY d.dept_name\n```";
        let clean = sanitize(raw);
        assert!(clean.starts_with("SELECT d.dept_name,"));
        assert!(clean.ends_with("GROUP BY d.dept_name;"));
        assert!(!clean.contains("```"));
    }
}
