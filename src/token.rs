const WORD_MULTIPLIER: f64 = 1.3;

/// Estimates the token count of a prompt for diagnostics.
///
/// Counts whitespace-separated words and multiplies by 1.3, truncating
/// toward zero. Four words estimate to 5 tokens.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn estimate_token_count(text: &str) -> usize {
    (count_words(text) as f64 * WORD_MULTIPLIER) as usize
}

/// Counts words in text (whitespace-separated).
#[inline]
fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_four_words() {
        assert_eq!(estimate_token_count("one two three four"), 5);
    }

    #[test]
    fn test_estimate_truncates() {
        // 3 * 1.3 = 3.9
        assert_eq!(estimate_token_count("a b c"), 3);
        // 10 * 1.3 = 13.0
        assert_eq!(estimate_token_count(&"w ".repeat(10)), 13);
    }

    #[test]
    fn test_estimate_empty() {
        assert_eq!(estimate_token_count(""), 0);
        assert_eq!(estimate_token_count("   \n\t "), 0);
    }

    #[test]
    fn test_estimate_ignores_character_count() {
        assert_eq!(estimate_token_count("supercalifragilistic"), 1);
        assert_eq!(estimate_token_count("fn main() { println!(\"hi\"); }"), 6);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("hello"), 1);
        assert_eq!(count_words("  hello   world  "), 2);
    }
}
