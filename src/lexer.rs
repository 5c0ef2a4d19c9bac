use std::fmt;

use tracing::trace;

use crate::token::{Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Character that cannot start any token inside a tag.
    UnexpectedCharacter(char),
    /// `#` or `/` not followed by the keyword `loop`.
    InvalidKeyword(char),
    /// End of input reached before the closing `}}`.
    UnterminatedTag,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(ch) => {
                write!(f, "cannot recognize character '{ch}'")
            }
            Self::InvalidKeyword(sigil) => {
                write!(f, "invalid keyword after '{sigil}', expected 'loop'")
            }
            Self::UnterminatedTag => {
                write!(f, "end of input inside a tag, expected '}}}}'")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{span}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Outside `{{ }}`: text is copied through.
    Literate,
    /// Between `{{` and `}}`: tags are tokenized.
    Script,
}

/// Saved lexer cursor.
///
/// Restoring it with [`Lexer::set_stream_pos`] resumes scanning exactly
/// where it was captured, reproducing the same tokens and spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPos {
    offset: usize,
    line: usize,
    column: usize,
    mode: Mode,
    /// Position of a script-begin token owed but not yet returned.
    pending: Option<Span>,
}

impl StreamPos {
    /// Byte offset into the template.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Source location of the cursor.
    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }
}

/// Tokenize a whole template, up to and including the end-of-input
/// token.
///
/// # Errors
///
/// Returns `LexError` on unknown characters inside a tag, invalid
/// keywords, or an unterminated tag.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.scan()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// Two-mode scanner over a template.
///
/// Each call to [`Lexer::scan`] returns exactly one token. Loop bodies
/// are replayed by saving the position after the opening tag and
/// rewinding to it.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    mode: Mode,
    loop_ids: u64,
    /// Script-begin owed after a literal that ended at `{{`.
    pending: Option<Token>,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
            mode: Mode::Literate,
            loop_ids: 0,
            pending: None,
        }
    }

    /// Scan the next token.
    ///
    /// # Errors
    ///
    /// Returns `LexError` when the text inside a tag is malformed or
    /// the input ends inside a tag.
    pub fn scan(&mut self) -> Result<Token, LexError> {
        let token = if let Some(token) = self.pending.take() {
            token
        } else {
            match self.mode {
                Mode::Literate => self.scan_literate(),
                Mode::Script => self.scan_script()?,
            }
        };
        trace!(
            kind = %token.kind,
            text = %token.text,
            line = token.span.line,
            column = token.span.column,
            "scanned token"
        );
        Ok(token)
    }

    #[must_use]
    pub fn current_stream_pos(&self) -> StreamPos {
        StreamPos {
            offset: self.pos,
            line: self.line,
            column: self.col,
            mode: self.mode,
            pending: self.pending.as_ref().map(|token| token.span),
        }
    }

    pub fn set_stream_pos(&mut self, pos: StreamPos) {
        self.pos = pos.offset;
        self.line = pos.line;
        self.col = pos.column;
        self.mode = pos.mode;
        self.pending = pos
            .pending
            .map(|span| Token::new(TokenKind::ScriptBegin, "{{", span));
    }

    const fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Consume one character, keeping line and column in step.
    fn bump(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn bump_n(&mut self, count: usize) {
        for _ in 0..count {
            self.bump();
        }
    }

    fn scan_literate(&mut self) -> Token {
        let start = self.span();
        let mut text = String::new();

        while let Some(ch) = self.peek() {
            match (ch, self.peek_at(1), self.peek_at(2)) {
                (b'{', Some(b'{'), _) => {
                    let open = Token::new(TokenKind::ScriptBegin, "{{", self.span());
                    self.bump_n(2);
                    self.mode = Mode::Script;
                    if text.is_empty() {
                        return open;
                    }
                    self.pending = Some(open);
                    return Token::new(TokenKind::Literal, text, start);
                }
                // `{\{` is an escaped `{{`
                (b'{', Some(b'\\'), Some(b'{')) => {
                    text.push_str("{{");
                    self.bump_n(3);
                }
                // `\{` right before `{` keeps the pair literal
                (b'\\', Some(b'{'), Some(b'{')) => {
                    text.push('{');
                    self.bump_n(2);
                    text.push('{');
                    self.bump();
                }
                _ => {
                    if let Some(ch) = self.bump() {
                        text.push(ch);
                    }
                }
            }
        }

        if text.is_empty() {
            Token::new(TokenKind::Eof, "", start)
        } else {
            Token::new(TokenKind::Literal, text, start)
        }
    }

    fn scan_script(&mut self) -> Result<Token, LexError> {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.bump();
        }

        let start = self.span();
        match self.peek() {
            None => Err(LexError {
                kind: LexErrorKind::UnterminatedTag,
                span: start,
            }),
            Some(b'#') => {
                self.read_loop_keyword('#', start)?;
                let tag = format!("loop{}", self.loop_ids);
                self.loop_ids += 1;
                Ok(Token::new(TokenKind::LoopBegin, tag, start))
            }
            Some(b'/') => {
                self.read_loop_keyword('/', start)?;
                Ok(Token::new(TokenKind::LoopEnd, "/loop", start))
            }
            Some(b) if b.is_ascii_alphabetic() => Ok(self.read_identifier(start)),
            Some(b'}') if self.peek_at(1) == Some(b'}') => {
                self.bump_n(2);
                self.mode = Mode::Literate;
                Ok(Token::new(TokenKind::ScriptEnd, "}}", start))
            }
            Some(_) => {
                let ch = self.current_char().unwrap_or(char::REPLACEMENT_CHARACTER);
                Err(LexError {
                    kind: LexErrorKind::UnexpectedCharacter(ch),
                    span: start,
                })
            }
        }
    }

    /// Consume `<sigil>loop`, which must end at a non-alphanumeric
    /// boundary. The boundary itself is left in the input.
    fn read_loop_keyword(&mut self, sigil: char, start: Span) -> Result<(), LexError> {
        let rest = &self.input[self.pos + 1..];
        let bounded = rest
            .as_bytes()
            .get(4)
            .is_none_or(|b| !b.is_ascii_alphanumeric());
        if !rest.starts_with("loop") || !bounded {
            return Err(LexError {
                kind: LexErrorKind::InvalidKeyword(sigil),
                span: start,
            });
        }
        self.bump_n(5);
        Ok(())
    }

    fn read_identifier(&mut self, start: Span) -> Token {
        let begin = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric()) {
            self.bump();
        }
        Token::new(TokenKind::Identifier, &self.input[begin..self.pos], start)
    }
}
