//! Shared helpers

/// Shorten user-supplied text for log lines.
///
/// Keeps at most `max_chars` characters and marks the cut with `…`.
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((end, _)) => format!("{}…", &s[..end]),
    }
}
