use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive, dangerous
/// tags (like <script>, <iframe>) and attributes (like onclick) are stripped.
/// Applied to doubt descriptions, answers, comments, and junior-space posts
/// as a fail-safe against stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let dirty = "hello <script>alert(1)</script> world";
        let clean = clean_html(dirty);
        assert!(!clean.contains("<script>"));
        assert!(clean.contains("hello"));
    }

    #[test]
    fn keeps_safe_markup() {
        assert_eq!(clean_html("<b>use borrows</b>"), "<b>use borrows</b>");
    }
}
