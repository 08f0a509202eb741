//! Small helpers shared by the solver adapters

/// Whether `needle` appears anywhere in the raw bytes of `haystack`,
/// used to scan solver stdout without requiring it to be valid UTF-8.
///
/// ```
/// use prod_planning::util::buf_contains;
///
/// assert!(buf_contains(b"Optimal solution found (tolerance 1.00e-04)", "Optimal solution found"));
/// assert!(!buf_contains(b"Model is infeasible", "Optimal"));
/// assert!(!buf_contains(b"", "x"));
/// ```
pub fn buf_contains(haystack: &[u8], needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

/// Last `max_lines` non-empty lines of a process output, for error messages
pub(crate) fn tail_lines(output: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(output);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let out = b"first\n\nsecond\nthird\n";
        assert_eq!(tail_lines(out, 2), "second\nthird");
        assert_eq!(tail_lines(out, 10), "first\nsecond\nthird");
        assert_eq!(tail_lines(b"", 3), "");
    }
}
