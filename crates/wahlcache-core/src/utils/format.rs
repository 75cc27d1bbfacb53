/// Shorten to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars == 0 {
        String::new()
    } else {
        let mut truncated: String = s.chars().take(max_chars - 1).collect();
        truncated.push('…');
        truncated
    }
}

/// The trimmed value, or `placeholder` when blank.
pub fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("Acme", 10), "Acme");
        assert_eq!(truncate_chars("Müllerwerke", 5), "Müll…");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_or_placeholder() {
        assert_eq!(or_placeholder("  ", "–"), "–");
        assert_eq!(or_placeholder(" Nord ", "–"), "Nord");
    }
}
