/// Scrubs control characters that would break downstream JSON extraction,
/// keeping `\n` and `\t`.
pub fn sanitize(content: &str) -> String {
    content
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_characters_but_keeps_newlines() {
        let input = "hello\u{0000}\u{0007}world\n\ttab";
        assert_eq!(sanitize(input), "helloworld\n\ttab");
    }

    #[test]
    fn leaves_clean_text_untouched() {
        let input = "plain json-safe text";
        assert_eq!(sanitize(input), input);
    }
}
