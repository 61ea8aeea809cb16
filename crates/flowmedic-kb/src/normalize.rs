//! Text normalisation shared by the rule matcher, the embedder, and the
//! fact checker.

/// Normalise error text for matching: lowercase with whitespace collapsed
/// to single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Tokenize text into lowercase alphanumeric terms of at least two
/// characters. Underscores are kept so error codes survive intact.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|s| s.len() >= 2)
        .map(|s| s.to_lowercase())
        .collect()
}

/// Truncate a string to `max` characters, appending an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_lowercases() {
        assert_eq!(
            normalize("  Login\tFailed   for\nuser  "),
            "login failed for user"
        );
    }

    #[test]
    fn tokenize_keeps_error_codes() {
        let toks = tokenize("ErrorCode=PathNotFound, status_code 404");
        assert!(toks.contains(&"errorcode".to_string()));
        assert!(toks.contains(&"pathnotfound".to_string()));
        assert!(toks.contains(&"status_code".to_string()));
        assert!(toks.contains(&"404".to_string()));
    }

    #[test]
    fn tokenize_drops_single_characters() {
        let toks = tokenize("a b cd");
        assert_eq!(toks, vec!["cd".to_string()]);
    }

    #[test]
    fn truncate_only_cuts_long_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789abc", 10), "0123456789...");
    }
}
