use std::fmt;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// The input has been fully consumed.
    Eof,
    /// A run of text outside `{{ }}`, copied verbatim.
    Literal,
    /// The tag opener `{{`.
    ScriptBegin,
    /// The tag closer `}}`.
    ScriptEnd,
    /// A name inside a tag: `[A-Za-z][A-Za-z0-9]*`.
    Identifier,
    /// The keyword `#loop`.
    LoopBegin,
    /// The keyword `/loop`.
    LoopEnd,
}

impl TokenKind {
    /// Diagnostic name of the kind, as it appears in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Literal => "LITERAL",
            Self::ScriptBegin => "SCRIPT_BEGIN",
            Self::ScriptEnd => "SCRIPT_END",
            Self::Identifier => "IDENTIFIER",
            Self::LoopBegin => "LOOP_BEGIN",
            Self::LoopEnd => "LOOP_END",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single token with its kind, text, and source location.
///
/// Two tokens are equal when their kind and text match; the span is
/// only carried for diagnostics.
#[derive(Debug, Clone, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text
    }
}
