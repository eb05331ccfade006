//! Output truncation that keeps both ends of the stream.

/// Maximum length, in bytes, of stdout and of stderr returned to the model.
pub const MAX_OUTPUT_LENGTH: usize = 30_000;

/// Truncate `content` to [`MAX_OUTPUT_LENGTH`].
pub fn truncate_output(content: &str) -> String {
    truncate_to(content, MAX_OUTPUT_LENGTH)
}

/// Truncate captured output to [`MAX_OUTPUT_LENGTH`], counting lines the
/// capture already dropped from its middle.
pub fn truncate_captured(content: &str, dropped_newlines: Option<usize>) -> String {
    match dropped_newlines {
        None => truncate_output(content),
        Some(_) => truncate_with_dropped(content, MAX_OUTPUT_LENGTH, dropped_newlines),
    }
}

/// Keep the first and last `max_len / 2` bytes of `content` and replace the
/// middle with a marker counting the lines dropped.
///
/// Cut points never split a UTF-8 character; each kept half is at most
/// `max_len / 2` bytes.
pub fn truncate_to(content: &str, max_len: usize) -> String {
    truncate_with_dropped(content, max_len, None)
}

/// [`truncate_to`] for text whose middle was already cut at capture time.
///
/// `dropped_newlines` counts the newlines in that missing middle. The
/// marker is always emitted when it is `Some`, and the reported count
/// covers both the missing bytes and whatever is cut here.
pub fn truncate_with_dropped(
    content: &str,
    max_len: usize,
    dropped_newlines: Option<usize>,
) -> String {
    if dropped_newlines.is_none() && content.len() <= max_len {
        return content.to_string();
    }

    let half = max_len / 2;
    let head_end = floor_boundary(content, half.min(content.len()));
    let tail_start = ceil_boundary(content, content.len().saturating_sub(half).max(head_end));

    let start = &content[..head_end];
    let end = &content[tail_start..];
    let middle = &content[head_end..tail_start];
    let truncated_lines = match dropped_newlines {
        None => count_lines(middle),
        Some(newlines) => middle.matches('\n').count() + newlines + 1,
    };

    format!(
        "{}\n\n... [{} lines truncated] ...\n\n{}",
        start, truncated_lines, end
    )
}

fn floor_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Number of newline-delimited segments; empty text has none.
fn count_lines(s: &str) -> usize {
    if s.is_empty() {
        return 0;
    }
    s.split('\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_budget_is_unchanged() {
        assert_eq!(truncate_output(""), "");
        assert_eq!(truncate_output("hello\nworld"), "hello\nworld");

        let exact = "x".repeat(MAX_OUTPUT_LENGTH);
        assert_eq!(truncate_output(&exact), exact);
        assert_eq!(truncate_output(&truncate_output(&exact)), exact);
    }

    #[test]
    fn test_keeps_both_ends() {
        let half = MAX_OUTPUT_LENGTH / 2;
        let input = format!(
            "{}{}{}",
            "a".repeat(half),
            "m".repeat(7),
            "z".repeat(half)
        );

        let out = truncate_output(&input);
        assert!(out.starts_with(&input[..half]));
        assert!(out.ends_with(&input[input.len() - half..]));
        assert!(out.contains("\n\n... [1 lines truncated] ...\n\n"));
        assert!(!out.contains('m'));
    }

    #[test]
    fn test_counts_only_elided_lines() {
        // head "0123", middle "4\n5\n6\n7", tail "89ab"
        let out = truncate_to("01234\n5\n6\n789ab", 8);
        assert_eq!(out, "0123\n\n... [4 lines truncated] ...\n\n89ab");
    }

    #[test]
    fn test_line_count_over_large_output() {
        let input: String = (0..10_000).map(|i| format!("line {}\n", i)).collect();
        let out = truncate_output(&input);
        let marker = out
            .split("... [")
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
            .unwrap();
        let expected = count_lines(
            &input[MAX_OUTPUT_LENGTH / 2..input.len() - MAX_OUTPUT_LENGTH / 2],
        );
        assert_eq!(marker, expected.to_string());
    }

    #[test]
    fn test_never_splits_characters() {
        let input = "é".repeat(10);
        let out = truncate_to(&input, 5);
        // 2-byte chars: each half holds at most 2 bytes, i.e. one char.
        assert!(out.starts_with("é\n\n"));
        assert!(out.ends_with("\n\né"));
        assert!(out.contains("[1 lines truncated]"));
    }

    #[test]
    fn test_dropped_lines_are_counted() {
        // Three newlines were dropped at capture between "x" and "\ny".
        let out = truncate_with_dropped("0123x\ny89ab", 8, Some(3));
        assert_eq!(out, "0123\n\n... [5 lines truncated] ...\n\n89ab");
    }

    #[test]
    fn test_dropped_marker_even_within_budget() {
        let out = truncate_with_dropped("abcd", 100, Some(0));
        assert_eq!(out, "abcd\n\n... [1 lines truncated] ...\n\n");
        assert_eq!(truncate_captured("short", None), "short");
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("one"), 1);
        assert_eq!(count_lines("one\ntwo"), 2);
        assert_eq!(count_lines("one\n"), 2);
    }
}
