use std::fmt;

/// Number of leading characters of a token that may appear in logs.
const LOG_PREFIX_LEN: usize = 20;

/// An opaque Seqera Platform bearer token.
///
/// `Debug` and `Display` never print the secret; use [`Token::log_prefix`] for
/// diagnostics and [`Token::as_str`] only when building an outbound request.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The first few characters followed by an ellipsis, for log lines.
    pub fn log_prefix(&self) -> String {
        let prefix: String = self.0.chars().take(LOG_PREFIX_LEN).collect();
        format!("{prefix}...")
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
