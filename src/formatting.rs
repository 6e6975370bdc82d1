//! Shared formatting utilities used by both CLI and TUI
//!
//! String truncation for table cells and log titles, and parsing of the
//! elapsed-time strings squeue prints.

/// Truncate a string to a maximum length (in characters), adding "..." at the end if truncated.
///
/// This function is Unicode-safe and counts characters, not bytes.
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        // Edge case: if max_len is very small, just truncate without ellipsis
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Truncate a path, keeping the end visible (opposite of truncate_string).
///
/// Log file names matter more than their directory prefix.
#[must_use]
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let char_count = path.chars().count();
    if char_count <= max_len {
        path.to_string()
    } else if max_len <= 3 {
        let skip = char_count.saturating_sub(max_len);
        path.chars().skip(skip).collect()
    } else {
        let suffix: String = path
            .chars()
            .skip(char_count.saturating_sub(max_len - 3))
            .collect();
        format!("...{}", suffix)
    }
}

/// Parse squeue's TimeUsed column into seconds.
///
/// Accepts `SS`, `MM:SS`, `HH:MM:SS` and `D-HH:MM:SS`. Returns `None` for
/// anything else (e.g. `INVALID`), which sorts before every real duration.
#[must_use]
pub fn parse_squeue_duration(value: &str) -> Option<u64> {
    let value = value.trim();
    let (days, clock) = match value.split_once('-') {
        Some((days, clock)) => (days.parse::<u64>().ok()?, clock),
        None => (0, value),
    };

    let mut seconds = 0u64;
    let mut parts = 0;
    for part in clock.split(':') {
        let value = part.parse::<u64>().ok()?;
        seconds = seconds.checked_mul(60)?.checked_add(value)?;
        parts += 1;
    }
    if parts == 0 || parts > 3 {
        return None;
    }

    days.checked_mul(86_400)?.checked_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("ab", 2), "ab");
        assert_eq!(truncate_string("abcdef", 3), "abc");
    }

    #[test]
    fn test_truncate_string_unicode() {
        assert_eq!(truncate_string("日本語テキスト", 5), "日本...");
    }

    #[test]
    fn test_truncate_path() {
        assert_eq!(
            truncate_path("/home/user/file.txt", 30),
            "/home/user/file.txt"
        );
        assert_eq!(
            truncate_path("/very/long/path/to/file.txt", 15),
            ".../to/file.txt"
        );
    }

    #[test]
    fn test_parse_squeue_duration() {
        assert_eq!(parse_squeue_duration("0:00"), Some(0));
        assert_eq!(parse_squeue_duration("59:59"), Some(3599));
        assert_eq!(parse_squeue_duration("1:02:03"), Some(3723));
        assert_eq!(parse_squeue_duration("2-00:00:01"), Some(172_801));
        assert_eq!(parse_squeue_duration("45"), Some(45));
        assert_eq!(parse_squeue_duration("INVALID"), None);
        assert_eq!(parse_squeue_duration("1:2:3:4"), None);
        assert_eq!(parse_squeue_duration(""), None);
    }
}
