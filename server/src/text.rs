/// Number of words kept in list-view descriptions.
pub const SHORT_DESCRIPTION_WORDS: usize = 20;

const ELLIPSIS: &str = " …";

/// Keep the first `max_words` whitespace-separated words, appending an
/// ellipsis when anything was cut. Runs of whitespace collapse to one space.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    let mut out = kept.join(" ");
    if words.next().is_some() {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(truncate_words("A quick weeknight dal", 20), "A quick weeknight dal");
    }

    #[test]
    fn test_long_text_gets_ellipsis() {
        assert_eq!(truncate_words("one two three four", 2), "one two …");
    }

    #[test]
    fn test_exact_length_has_no_ellipsis() {
        assert_eq!(truncate_words("one two", 2), "one two");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(truncate_words("  one\n\ttwo   three ", 5), "one two three");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(truncate_words("", SHORT_DESCRIPTION_WORDS), "");
    }
}
