//! Single-layer escaping of command-line tokens.
//!
//! Only backslashes and spaces are escaped. Quotes, `$`, globs and the
//! like are copied unchanged, so shell features such as `>` and `|` keep
//! working when the joined line is handed to `sh -c`.

/// Escape one token so a POSIX shell splitting on whitespace gives it back.
pub fn escape(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ' ' => escaped.push_str("\\ "),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escape every token and join them with single spaces.
pub fn escape_all<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| escape(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_space() {
        assert_eq!(escape(" "), "\\ ");
    }

    #[test]
    fn test_escape_backslash() {
        assert_eq!(escape("\\"), "\\\\");
    }

    #[test]
    fn test_quotes_untouched() {
        assert_eq!(escape("'"), "'");
        assert_eq!(escape("\""), "\"");
    }

    #[test]
    fn test_plain_token() {
        assert_eq!(escape("a"), "a");
        assert_eq!(escape("file-1.txt"), "file-1.txt");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_mixed_token() {
        assert_eq!(escape("a b\\c"), "a\\ b\\\\c");
        assert_eq!(escape("$HOME *"), "$HOME\\ *");
    }

    #[test]
    fn test_escape_all() {
        assert_eq!(
            escape_all(&["cat", "first second.txt"]),
            "cat first\\ second.txt"
        );
        assert_eq!(escape_all(&["echo", "test", ">", "out"]), "echo test > out");
    }
}
