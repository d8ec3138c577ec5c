//! Breaks formatted text into segments short enough for any sink.
//!
//! Many log backends truncate or drop oversized lines, so text is first split
//! into logical lines and every line longer than the limit is carved into
//! chunks, preferably right after a delimiter so words stay intact.

pub const MAX_LINE_LENGTH: usize = 4000;

/// Characters a long line may be broken after.
pub const DELIMITERS: &str = " \t,.;:?!{}()[]/\\";

/// Splits `text` into segments of at most `max` characters.
///
/// Empty lines between newlines survive as empty segments, trailing empty
/// lines are dropped, and text without any newline is always one line even
/// when it is empty. Lengths count `char`s. A `max` of zero behaves as one.
pub fn split(text: &str, max: usize) -> Vec<&str> {
    let max = max.max(1);
    let mut segments = Vec::new();
    for line in lines(text) {
        chunks(line, max, &mut segments);
    }
    segments
}

fn lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 {
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
    }
    lines
}

fn chunks<'t>(mut line: &'t str, max: usize, out: &mut Vec<&'t str>) {
    loop {
        let Some((limit, _)) = line.char_indices().nth(max) else {
            out.push(line);
            return;
        };

        let cut = line[..limit]
            .char_indices()
            .rev()
            .find(|(_, c)| DELIMITERS.contains(*c))
            .map_or(limit, |(i, c)| i + c.len_utf8());

        let (head, tail) = line.split_at(cut);
        out.push(head);
        line = tail;
        if line.is_empty() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn short_text_is_one_segment() {
        assert_eq!(split("hello", MAX_LINE_LENGTH), ["hello"]);
        assert_eq!(split("", MAX_LINE_LENGTH), [""]);
    }

    #[test]
    fn newlines_split_lines() {
        assert_eq!(split("a\nb\nc", 10), ["a", "b", "c"]);
    }

    #[test]
    fn interior_empty_lines_are_kept() {
        assert_eq!(split("a\n\nb", 10), ["a", "", "b"]);
    }

    #[test]
    fn trailing_empty_lines_are_dropped() {
        assert_eq!(split("a\nb\n\n", 10), ["a", "b"]);
        assert!(split("\n", 10).is_empty());
    }

    #[test]
    fn hard_cuts_without_delimiters() {
        let text = "x".repeat(MAX_LINE_LENGTH * 2 + 123);
        let segments = split(&text, MAX_LINE_LENGTH);
        let lengths: Vec<_> = segments.iter().map(|s| s.len()).collect();
        assert_eq!(lengths, [MAX_LINE_LENGTH, MAX_LINE_LENGTH, 123]);
        assert_eq!(segments.concat(), text);
    }

    #[test]
    fn exact_multiple_leaves_no_empty_tail() {
        let text = "x".repeat(20);
        assert_eq!(split(&text, 10).len(), 2);
        assert_eq!(split(&text[..10], 10).len(), 1);
    }

    #[test]
    fn cuts_after_the_nearest_delimiter() {
        let text = format!("{} {}", "a".repeat(3990), "b".repeat(100));
        let segments = split(&text, MAX_LINE_LENGTH);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 3991);
        assert!(segments[0].ends_with(' '));
        assert_eq!(segments[1], "b".repeat(100));
    }

    #[test]
    fn delimiter_exactly_at_limit_belongs_to_next_scan() {
        // "aaaa,bbbbbb": the comma sits at index 4, inside the first 5 chars.
        assert_eq!(split("aaaa,bbbbbb", 5), ["aaaa,", "bbbbb", "b"]);
        // Comma at index 5 is past the first window, so the cut is hard.
        assert_eq!(split("aaaaa,bbbb", 5), ["aaaaa", ",bbbb"]);
    }

    #[test]
    fn every_delimiter_is_a_break_point() {
        for d in DELIMITERS.chars() {
            let text = format!("ab{d}cdefg");
            assert_eq!(split(&text, 5)[0], format!("ab{d}"), "delimiter {d:?}");
        }
    }

    #[test]
    fn delimiter_at_start_still_makes_progress() {
        assert_eq!(split(" bbbbbbbb", 4), [" ", "bbbb", "bbbb"]);
    }

    #[test]
    fn lengths_count_chars_not_bytes() {
        let text = "é".repeat(7);
        let segments = split(&text, 3);
        assert_eq!(segments, ["ééé", "ééé", "é"]);
    }

    #[test]
    fn zero_limit_behaves_as_one() {
        assert_eq!(split("abc", 0), ["a", "b", "c"]);
    }
}
