use std::fmt;

use tracing::debug;

use crate::Error;
use crate::lexer::{Lexer, StreamPos};
use crate::scope::{Arrays, ResolutionError, ScopeStack, Values};
use crate::token::{Span, Token, TokenKind};

/// Classifies a syntax error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A specific token kind was required.
    Expected {
        expected: TokenKind,
        found: TokenKind,
        text: String,
    },
    /// The token cannot appear here at all.
    Unexpected { found: TokenKind, text: String },
    /// `{{/loop}}` with no open loop.
    UnmatchedLoopEnd,
}

/// Renders `'<text>'` after a token kind, or nothing for empty text.
struct Lexeme<'a>(&'a str);

impl fmt::Display for Lexeme<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, " ('{}')", self.0)
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected {
                expected,
                found,
                text,
            } => {
                write!(
                    f,
                    "Expected '{expected}' but got '{found}'{}",
                    Lexeme(text)
                )
            }
            Self::Unexpected { found, text } => {
                write!(f, "Unexpected token '{found}'{}", Lexeme(text))
            }
            Self::UnmatchedLoopEnd => {
                write!(f, "Unmatched '{}'", TokenKind::LoopEnd)
            }
        }
    }
}

/// Error produced when a token appears where the grammar forbids it.
///
/// An unmatched loop end is reported without its position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}", location(.kind, .span))]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

fn location(kind: &SyntaxErrorKind, span: &Span) -> String {
    match kind {
        SyntaxErrorKind::UnmatchedLoopEnd => String::new(),
        _ => format!(" at {span}"),
    }
}

impl SyntaxError {
    fn expected(expected: TokenKind, found: Token) -> Self {
        Self {
            kind: SyntaxErrorKind::Expected {
                expected,
                found: found.kind,
                text: found.text,
            },
            span: found.span,
        }
    }

    fn unexpected(found: Token) -> Self {
        Self {
            kind: SyntaxErrorKind::Unexpected {
                found: found.kind,
                text: found.text,
            },
            span: found.span,
        }
    }
}

/// Renders templates against a fixed set of root bindings.
///
/// The same renderer can render any number of templates one after the
/// other; loop scopes never outlive a single [`Renderer::render`] call.
#[derive(Debug, Clone)]
pub struct Renderer {
    scopes: ScopeStack,
}

impl Renderer {
    #[must_use]
    pub fn new(values: Values, arrays: Arrays) -> Self {
        Self {
            scopes: ScopeStack::new(values, arrays),
        }
    }

    /// Render `input` into `output`.
    ///
    /// Output is written as tokens are processed, so on failure it
    /// holds everything rendered before the error.
    ///
    /// # Errors
    ///
    /// Returns the first lex, syntax or resolution error in the
    /// template, or `Error::Write` if `output` rejects a write.
    pub fn render<W>(&mut self, input: &str, output: &mut W) -> Result<(), Error>
    where
        W: fmt::Write + ?Sized,
    {
        self.scopes.unwind();
        debug!(len = input.len(), "render start");
        let end = Interpreter {
            lexer: Lexer::new(input),
            scopes: &mut self.scopes,
            output,
        }
        .render_body(true)?;
        debug!(offset = end.offset(), "render finished");
        Ok(())
    }
}

/// State of one render pass: the lexer over the current template, the
/// renderer's scope chain and the sink.
struct Interpreter<'r, 'a, W: ?Sized> {
    lexer: Lexer<'a>,
    scopes: &'r mut ScopeStack,
    output: &'r mut W,
}

impl<W: fmt::Write + ?Sized> Interpreter<'_, '_, W> {
    /// Process tokens until end of input or the `{{/loop}}` closing the
    /// current loop body, returning the position right after it.
    fn render_body(&mut self, emit: bool) -> Result<StreamPos, Error> {
        loop {
            let token = self.lexer.scan()?;
            match token.kind {
                TokenKind::Eof => return Ok(self.lexer.current_stream_pos()),
                TokenKind::Literal => {
                    if emit {
                        self.output.write_str(&token.text)?;
                    }
                }
                TokenKind::ScriptBegin => {
                    let token = self.lexer.scan()?;
                    match token.kind {
                        TokenKind::Identifier => self.substitute(&token.text, emit)?,
                        TokenKind::LoopBegin => self.run_loop(&token.text, emit)?,
                        TokenKind::LoopEnd => {
                            if self.scopes.is_root() {
                                return Err(SyntaxError {
                                    kind: SyntaxErrorKind::UnmatchedLoopEnd,
                                    span: token.span,
                                }
                                .into());
                            }
                            self.expect(TokenKind::ScriptEnd)?;
                            return Ok(self.lexer.current_stream_pos());
                        }
                        _ => return Err(SyntaxError::unexpected(token).into()),
                    }
                }
                _ => return Err(SyntaxError::unexpected(token).into()),
            }
        }
    }

    fn substitute(&mut self, identifier: &str, emit: bool) -> Result<(), Error> {
        let value = self.scopes.get_value(identifier)?;
        if emit {
            self.output.write_str(value)?;
        }
        self.expect(TokenKind::ScriptEnd)?;
        Ok(())
    }

    /// Run `{{#loop array item}} ... {{/loop}}` once the loop-begin
    /// token tagged `frame_tag` has been consumed.
    fn run_loop(&mut self, frame_tag: &str, emit: bool) -> Result<(), Error> {
        let array = self.expect(TokenKind::Identifier)?;
        if !self.scopes.contains_iterable(&array.text) {
            return Err(ResolutionError::UndefinedArray(array.text).into());
        }
        let item = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::ScriptEnd)?;

        let body_start = self.lexer.current_stream_pos();
        self.scopes.push(frame_tag);
        let elements = self.scopes.get_iterable(&array.text)?.to_vec();
        debug!(
            frame = frame_tag,
            array = %array.text,
            item = %item.text,
            count = elements.len(),
            depth = self.scopes.depth(),
            emit,
            "loop start"
        );

        let loop_end = if emit && !elements.is_empty() {
            let last = elements.len() - 1;
            let mut end = body_start;
            for (index, element) in elements.into_iter().enumerate() {
                self.scopes.put_value(item.text.as_str(), element);
                end = self.render_body(true)?;
                if index != last {
                    self.lexer.set_stream_pos(body_start);
                }
            }
            end
        } else {
            self.scopes.put_value(item.text.as_str(), "");
            self.render_body(false)?
        };

        self.scopes.pop();
        self.lexer.set_stream_pos(loop_end);
        debug!(frame = frame_tag, depth = self.scopes.depth(), "loop end");
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        let token = self.lexer.scan()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(SyntaxError::expected(kind, token).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> Renderer {
        Renderer::new(
            Values::from([("foo".to_string(), "bar".to_string())]),
            Arrays::from([(
                "array".to_string(),
                vec!["first".to_string(), "second".to_string()],
            )]),
        )
    }

    fn render(renderer: &mut Renderer, input: &str) -> Result<String, Error> {
        let mut output = String::new();
        renderer.render(input, &mut output)?;
        Ok(output)
    }

    #[test]
    fn substitution_and_loop() {
        let mut r = renderer();
        assert_eq!(
            render(&mut r, "{{foo}}:{{#loop array x}}[{{x}}]{{/loop}}").expect("render"),
            "bar:[first][second]"
        );
    }

    #[test]
    fn renderer_is_reusable() {
        let mut r = renderer();
        assert_eq!(render(&mut r, "{{ foo }}").expect("render"), "bar");
        assert_eq!(render(&mut r, "{{foo}}{{foo}}").expect("render"), "barbar");
    }

    #[test]
    fn failed_render_leaves_renderer_usable() {
        let mut r = renderer();
        assert!(render(&mut r, "{{#loop array x}}{{missing}}{{/loop}}").is_err());
        assert_eq!(render(&mut r, "{{foo}}").expect("render"), "bar");
        assert!(matches!(
            render(&mut r, "{{/loop}}"),
            Err(Error::Syntax(SyntaxError {
                kind: SyntaxErrorKind::UnmatchedLoopEnd,
                ..
            }))
        ));
    }

    #[test]
    fn loop_scope_is_gone_after_loop() {
        let mut r = renderer();
        let err = render(&mut r, "{{#loop array x}}{{/loop}}{{x}}").unwrap_err();
        assert_eq!(
            err,
            Error::Resolution(ResolutionError::UndefinedIdentifier("x".to_string()))
        );
    }

    #[test]
    fn expected_message_omits_empty_text() {
        let err = render(&mut renderer(), "{{#loop array").unwrap_err();
        assert!(matches!(err, Error::Lex(_)));
        let err = SyntaxError::expected(
            TokenKind::ScriptEnd,
            Token::new(TokenKind::Eof, "", Span::new(3, 1)),
        );
        assert_eq!(
            err.to_string(),
            "Expected 'SCRIPT_END' but got 'EOF' at line 3 column 1"
        );
    }
}
