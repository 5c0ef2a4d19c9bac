//! Yet another template engine.
//!
//! Templates mix literal text with tags between `{{` and `}}`:
//!
//! - `{{ name }}` substitutes a bound value;
//! - `{{#loop items item}} ... {{/loop}}` repeats its body once per
//!   element of a bound array, with `item` bound to the element.
//!
//! A template is never turned into a tree. The [`Renderer`] pulls tokens
//! straight from the [`Lexer`] and replays a loop body by rewinding the
//! lexer to the position after the opening tag.
//!
//! # Quick start
//!
//! ```
//! use yate::{Arrays, Values, render_to_string};
//!
//! let values = Values::from([("name".to_string(), "World".to_string())]);
//! let arrays = Arrays::from([(
//!     "fruits".to_string(),
//!     vec!["apple".to_string(), "pear".to_string()],
//! )]);
//!
//! let output = render_to_string(
//!     values,
//!     arrays,
//!     "Hello {{name}}!{{#loop fruits fruit}} {{fruit}}{{/loop}}",
//! )
//! .unwrap();
//! assert_eq!(output, "Hello World! apple pear");
//! ```
//!
//! # Escaping
//!
//! `{\{` renders as a literal `{{`, as does `\{{`.

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod lexer;
pub mod renderer;
pub mod scope;
pub mod token;

use std::fmt;

pub use lexer::{LexError, LexErrorKind, Lexer, StreamPos, tokenize};
pub use renderer::{Renderer, SyntaxError, SyntaxErrorKind};
pub use scope::{Arrays, ResolutionError, Scope, ScopeStack, Values};
pub use token::{Span, Token, TokenKind};

/// Unified error type covering every way a render can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed text inside a tag.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A tag in the wrong place or with the wrong shape.
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    /// A name not bound in any enclosing scope.
    #[error("{0}")]
    Resolution(#[from] ResolutionError),
    /// The output sink refused a write.
    #[error("failed to write rendered output")]
    Write(#[from] fmt::Error),
}

/// Render `input` into `output` with `values` and `arrays` as the root
/// bindings.
///
/// Nothing is rolled back on failure: `output` keeps whatever was
/// rendered before the error.
pub fn render<W>(values: Values, arrays: Arrays, input: &str, output: &mut W) -> Result<(), Error>
where
    W: fmt::Write + ?Sized,
{
    Renderer::new(values, arrays).render(input, output)
}

/// Render `input` into a fresh `String`.
pub fn render_to_string(values: Values, arrays: Arrays, input: &str) -> Result<String, Error> {
    let mut output = String::new();
    render(values, arrays, input, &mut output)?;
    Ok(output)
}
