//! Shared helpers for locating sub-ranges in raw log text.

/// Byte offset of the first line that starts with `prefix`.
pub(crate) fn find_line_start(log: &str, prefix: &str) -> Option<usize> {
    if log.starts_with(prefix) {
        return Some(0);
    }
    log.find(&format!("\n{prefix}")).map(|idx| idx + 1)
}

/// Expands `at` outward to the nearest enclosing blank-line-delimited
/// paragraph.
pub(crate) fn enclosing_paragraph(log: &str, at: usize) -> &str {
    let start = log[..at].rfind("\n\n").map(|idx| idx + 2).unwrap_or(0);
    let end = log[at..].find("\n\n").map(|idx| at + idx).unwrap_or(log.len());
    log[start..end].trim_matches('\n')
}
