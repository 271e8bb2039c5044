use thiserror::Error;

/// Shorthand result type used across the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// The single error sum type shared by the tree, query, and XPath crates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed XML encountered by the document parser.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed XPath expression or malformed qualified name.
    #[error("Syntax error: {message}{}", snippet_suffix(.snippet))]
    Syntax {
        message: String,
        /// Absolute character offset into the offending expression, when known.
        offset: Option<usize>,
        /// A ±20-char window around the offending position with a caret line.
        snippet: Option<String>,
    },

    /// Unknown namespace alias or missing lookup target.
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Out-of-bounds index or percentile.
    #[error("Range error: {0}")]
    Range(String),

    /// Invariant violation; unreachable in a correct build.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn snippet_suffix(snippet: &Option<String>) -> String {
    match snippet {
        Some(s) => format!("\n{s}"),
        None => String::new(),
    }
}

impl Error {
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Error::Syntax {
            message: message.into(),
            offset: None,
            snippet: None,
        }
    }

    /// Builds a syntax error pointing at `offset` within `source`, with a
    /// ±20-character context window and a caret line under the offending spot.
    pub fn syntax_at(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let pos = offset.min(chars.len());
        let start = pos.saturating_sub(20);
        let end = (pos + 20).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let caret = format!("{}^", " ".repeat(pos - start));
        Error::Syntax {
            message: message.into(),
            offset: Some(pos),
            snippet: Some(format!("  {window}\n  {caret}")),
        }
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        Error::Lookup(message.into())
    }

    pub fn range(message: impl Into<String>) -> Self {
        Error::Range(message.into())
    }

    /// The character offset carried by a syntax error, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Syntax { offset, .. } => *offset,
            _ => None,
        }
    }

    /// The context snippet carried by a syntax error, if any.
    pub fn snippet(&self) -> Option<&str> {
        match self {
            Error::Syntax { snippet, .. } => snippet.as_deref(),
            _ => None,
        }
    }
}
