//! Text width estimation, wrapping and truncation.
//!
//! Widths come from the Helvetica AFM advance widths (units of 1/1000 em) for printable ASCII.
//! Anything outside that range is estimated with an average glyph width, which is close enough
//! for deciding where to break a line on a paper form.

/// Appended to text that had to be cut short.
pub const ELLIPSIS: &str = "...";

const AVERAGE_WIDTH: u16 = 556;

// Helvetica advance widths for code points 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

fn char_units(c: char) -> u16 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        HELVETICA_WIDTHS[(code - 32) as usize]
    } else {
        AVERAGE_WIDTH
    }
}

fn char_width(c: char, size: f32) -> f32 {
    f32::from(char_units(c)) * size / 1000.0
}

/// Estimated width of `text` set in Helvetica at `size` points.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_units(c))).sum();
    units as f32 * size / 1000.0
}

/// Returns `text` unchanged if it fits in `max_width`, otherwise the longest prefix that fits
/// together with a trailing [`ELLIPSIS`].
///
/// The result always fits; when not even the ellipsis fits, the result is empty.
pub fn truncate_to_width(text: &str, size: f32, max_width: f32) -> String {
    if text_width(text, size) <= max_width {
        return text.to_string();
    }
    with_ellipsis(text, size, max_width)
}

/// Appends [`ELLIPSIS`] to `text`, dropping trailing characters until the result fits.
pub fn with_ellipsis(text: &str, size: f32, max_width: f32) -> String {
    let budget = max_width - text_width(ELLIPSIS, size);
    if budget < 0.0 {
        return String::new();
    }

    let mut kept = String::new();
    let mut used = 0.0;
    for c in text.chars() {
        let w = char_width(c, size);
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(c);
    }
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

/// Greedy word wrap.
///
/// Explicit newlines always start a new line (blank input lines are kept as empty lines). A
/// word wider than `max_width` on its own is broken between characters. No produced line is
/// wider than `max_width` unless it consists of a single character that is.
pub fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, size) <= max_width {
                current = word.to_string();
                continue;
            }

            for c in word.chars() {
                let mut next = current.clone();
                next.push(c);
                if !current.is_empty() && text_width(&next, size) > max_width {
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                } else {
                    current = next;
                }
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        // "Hi" = H(722) + i(222)
        let w = text_width("Hi", 10.0);
        assert!((w - 9.44).abs() < 1e-4, "got {w}");
        assert_eq!(text_width("", 12.0), 0.0);
    }

    #[test]
    fn test_non_ascii_uses_average_width() {
        let w = text_width("é", 10.0);
        assert!((w - 5.56).abs() < 1e-4);
    }

    #[test]
    fn test_truncate_leaves_short_text_alone() {
        assert_eq!(truncate_to_width("Jane", 10.0, 100.0), "Jane");
    }

    #[test]
    fn test_truncate_fits_and_ends_with_ellipsis() {
        let text = "Extremely long primary diagnosis description that cannot fit";
        let out = truncate_to_width(text, 10.0, 80.0);
        assert!(out.ends_with(ELLIPSIS));
        assert!(text_width(&out, 10.0) <= 80.0);
        assert!(text.starts_with(out.trim_end_matches(ELLIPSIS)));
    }

    #[test]
    fn test_truncate_with_no_room_is_empty() {
        assert_eq!(truncate_to_width("Anything", 10.0, 3.0), "");
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0) <= 60.0, "line too wide: {line}");
        }
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_keeps_explicit_newlines() {
        let lines = wrap_text("first\n\nthird", 10.0, 200.0);
        assert_eq!(lines, vec!["first", "", "third"]);
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let lines = wrap_text("Supercalifragilisticexpialidocious", 10.0, 40.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0) <= 40.0, "line too wide: {line}");
        }
        assert_eq!(lines.concat(), "Supercalifragilisticexpialidocious");
    }

    #[test]
    fn test_wrap_empty_input() {
        assert!(wrap_text("", 10.0, 100.0).is_empty());
    }

    #[test]
    fn test_with_ellipsis_fits() {
        let out = with_ellipsis("a full line of text here", 10.0, 60.0);
        assert!(out.ends_with(ELLIPSIS));
        assert!(text_width(&out, 10.0) <= 60.0);
    }
}
