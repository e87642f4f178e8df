//! Default display filename derivation

use regex::Regex;
use std::sync::LazyLock;

/// Characters that are not allowed in filenames on common filesystems
static INVALID_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1f\x7f]"#).expect("invalid filename character class")
});

/// Longest filename stem we produce
const MAX_STEM_LEN: usize = 200;

/// Convert a title to a filename stem (no extension) safe on common filesystems
pub fn safe_filename(title: &str) -> String {
    let replaced = INVALID_CHARS.replace_all(title, "_");

    let mut safe_title = replaced
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string();

    if safe_title.len() > MAX_STEM_LEN {
        let mut cut = MAX_STEM_LEN;
        while !safe_title.is_char_boundary(cut) {
            cut -= 1;
        }
        safe_title.truncate(cut);
        safe_title = safe_title.trim_end().to_string();
    }

    if safe_title.is_empty() {
        safe_title = "video".to_string();
    }

    safe_title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("Test Video: Title"), "Test Video_ Title");
        assert_eq!(
            safe_filename("Video with <invalid> chars"),
            "Video with _invalid_ chars"
        );
        assert_eq!(safe_filename("  ..dots and spaces.. "), "dots and spaces");
        assert_eq!(safe_filename("tab\there"), "tab_here");
        assert_eq!(safe_filename("a/b\\c|d?e*f"), "a_b_c_d_e_f");
        assert_eq!(safe_filename("bell\u{7}del\u{7f}"), "bell_del_");
        assert_eq!(safe_filename(""), "video");
        assert_eq!(safe_filename("..."), "video");
    }

    #[test]
    fn test_safe_filename_truncates_on_char_boundary() {
        let title = "é".repeat(150);
        let name = safe_filename(&title);
        assert!(name.len() <= MAX_STEM_LEN);
        assert_eq!(name, "é".repeat(100));
    }
}
