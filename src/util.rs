//! Text helpers shared by the banner builders and the font resolver.

/// Description wrap width, in characters.
pub const DESCRIPTION_WIDTH: usize = 50;

/// Maximum number of description lines the two-pass template renders.
pub const DESCRIPTION_MAX_LINES: usize = 2;

/// Format a star/fork count for display.
///
/// | range               | output        |
/// |---------------------|---------------|
/// | `< 1_000`           | `999`         |
/// | `< 10_000`          | `1.2k`        |
/// | `< 1_000_000`       | `12k`         |
/// | otherwise           | `1.5M`        |
///
/// # Examples
///
/// ```
/// use repo_banner::util::format_count;
///
/// assert_eq!(format_count(999), "999");
/// assert_eq!(format_count(1000), "1.0k");
/// assert_eq!(format_count(12000), "12k");
/// assert_eq!(format_count(1_500_000), "1.5M");
/// ```
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        count.to_string()
    } else if count < 10_000 {
        format!("{:.1}k", count as f64 / 1_000.0)
    } else if count < 1_000_000 {
        format!("{}k", count / 1_000)
    } else {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    }
}

/// Break text into lines of at most `width` characters without splitting words.
///
/// Words longer than `width` get a line of their own. Whitespace-only input
/// yields no lines; a zero width returns the text unchanged as a single line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Wrap a description and keep at most `max_lines` lines.
pub fn split_description(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = wrap_text(text, width);
    lines.truncate(max_lines);
    lines
}

/// Convert a font family name into a safe identifier.
///
/// `"GT Pressura"` becomes `"gt_pressura"`, `"gt-pressura"` likewise.
pub fn normalize_font_name(name: &str) -> String {
    name.replace([' ', '-'], "_").to_lowercase()
}

/// Point size for the repository name, shrinking as the name gets longer.
pub fn name_font_size(name: &str) -> u32 {
    match name.chars().count() {
        n if n > 30 => 80,
        n if n > 20 => 100,
        n if n > 12 => 120,
        _ => 153,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_count_thresholds() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1.0k");
        assert_eq!(format_count(1234), "1.2k");
        assert_eq!(format_count(12000), "12k");
        assert_eq!(format_count(999_999), "999k");
        assert_eq!(format_count(1_500_000), "1.5M");
    }

    #[test]
    fn test_wrap_text_basic() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 15);
        assert_eq!(lines, vec!["the quick brown", "fox jumps over", "the lazy dog"]);
    }

    #[test]
    fn test_wrap_text_long_word_stands_alone() {
        let lines = wrap_text("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert!(wrap_text("", 50).is_empty());
        assert!(wrap_text("   \n\t ", 50).is_empty());
        assert_eq!(wrap_text("keep  as is", 0), vec!["keep  as is"]);
    }

    #[test]
    fn test_wrap_counts_characters_not_bytes() {
        // Each word is 5 chars but 10 bytes
        let lines = wrap_text("ééééé ééééé", 11);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_split_description_caps_lines() {
        let desc = "word ".repeat(40);
        let lines = split_description(&desc, DESCRIPTION_WIDTH, DESCRIPTION_MAX_LINES);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.len() <= DESCRIPTION_WIDTH));
    }

    #[test]
    fn test_normalize_font_name() {
        assert_eq!(normalize_font_name("GT Pressura"), "gt_pressura");
        assert_eq!(normalize_font_name("gt-pressura"), "gt_pressura");
        assert_eq!(normalize_font_name("Inter"), "inter");
    }

    #[test]
    fn test_name_font_size() {
        assert_eq!(name_font_size("foo"), 153);
        assert_eq!(name_font_size("twelve-chars"), 153);
        assert_eq!(name_font_size("thirteen-char"), 120);
        assert_eq!(name_font_size(&"x".repeat(21)), 100);
        assert_eq!(name_font_size(&"x".repeat(31)), 80);
    }

    proptest! {
        #[test]
        fn prop_wrap_preserves_words(words in prop::collection::vec("[a-z]{1,10}", 0..30)) {
            let text = words.join(" ");
            let lines = wrap_text(&text, 20);
            prop_assert_eq!(lines.join(" "), text);
        }

        #[test]
        fn prop_wrap_respects_width(words in prop::collection::vec("[a-z]{1,10}", 0..30)) {
            let text = words.join(" ");
            for line in wrap_text(&text, 20) {
                prop_assert!(line.chars().count() <= 20);
            }
        }

        #[test]
        fn prop_format_count_suffix(count in 0u64..10_000_000) {
            let formatted = format_count(count);
            match count {
                0..=999 => prop_assert_eq!(formatted, count.to_string()),
                1_000..=999_999 => prop_assert!(formatted.ends_with('k')),
                _ => prop_assert!(formatted.ends_with('M')),
            }
        }
    }
}
