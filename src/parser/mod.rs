//! A small parser combinator library.
//!
//! A parser is a function from an [`Input`] cursor to either a [`Success`] carrying the
//! parsed value and the advanced cursor, or a [`Failure`] describing where and why it
//! stopped. Cursors are immutable values: a combinator that wants to backtrack simply
//! keeps the cursor it was handed and retries from it. Each cursor also carries a
//! caller-defined state value `S`, threaded through every successful step, which lets
//! grammars record facts about what they have parsed so far.
//!
//! Failures are ordinary values. Nothing in this module panics or unwinds on bad
//! input; alternation points absorb failures and only the outermost caller decides
//! what an unmatched input means.

pub mod combinators;

pub use combinators::*;

use std::fmt;

/// A position in the text being parsed, together with the parse state at that position.
#[derive(Debug, Clone, PartialEq)]
pub struct Input<'a, S> {
    text: &'a str,
    position: usize,
    line: usize,
    state: S,
}

impl<'a, S> Input<'a, S> {
    /// Creates a cursor at the start of `text` (line 1).
    pub fn new(text: &'a str, state: S) -> Self {
        Self {
            text,
            position: 0,
            line: 1,
            state,
        }
    }

    /// The complete text being parsed.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Byte offset of the cursor into [`Input::text`].
    pub fn position(&self) -> usize {
        self.position
    }

    /// 1-based line number of the cursor.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// The text that has not been consumed yet.
    pub fn remaining(&self) -> &'a str {
        self.text.get(self.position..).unwrap_or("")
    }

    /// True when there is nothing left to parse, including a cursor past the end of the text.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.text.len()
    }

    /// Replaces the parse state, keeping the position.
    pub fn with_state(self, state: S) -> Self {
        Self { state, ..self }
    }

    /// Applies `f` to the parse state, keeping the position.
    pub fn map_state(self, f: impl FnOnce(S) -> S) -> Self {
        let Self {
            text,
            position,
            line,
            state,
        } = self;
        Self {
            text,
            position,
            line,
            state: f(state),
        }
    }

    /// Moves the cursor forward by `len` bytes, counting the newlines it steps over.
    pub(crate) fn advance(self, len: usize) -> Self {
        let end = (self.position + len).min(self.text.len());
        let consumed = self.text.get(self.position..end).unwrap_or("");
        let line = self.line + consumed.matches('\n').count();
        Self {
            position: end,
            line,
            ..self
        }
    }

    /// Builds a [`Failure`] located at this cursor.
    pub fn fail(&self, message: impl Into<String>) -> Failure {
        Failure {
            position: self.position,
            line: self.line,
            message: message.into(),
        }
    }
}

/// The outcome of a parser that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct Success<'a, T, S> {
    pub value: T,
    pub rest: Input<'a, S>,
}

/// The outcome of a parser that did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub position: usize,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, offset {}: {}",
            self.line, self.position, self.message
        )
    }
}

pub type ParseResult<'a, T, S> = Result<Success<'a, T, S>, Failure>;

/// Anything that can parse a value out of an [`Input`].
///
/// Every closure of the shape `Fn(Input<'a, S>) -> ParseResult<'a, T, S>` is a parser,
/// which is how all of the combinators in this module are built.
pub trait Parser<'a, S> {
    type Output;

    fn parse(&self, input: Input<'a, S>) -> ParseResult<'a, Self::Output, S>;
}

impl<'a, S, T, F> Parser<'a, S> for F
where
    F: Fn(Input<'a, S>) -> ParseResult<'a, T, S>,
{
    type Output = T;

    fn parse(&self, input: Input<'a, S>) -> ParseResult<'a, T, S> {
        self(input)
    }
}

/// A type-erased parser, used where parsers of different concrete types must share a
/// collection (see [`sequence`]).
pub type BoxedParser<'a, S, T> = Box<dyn Fn(Input<'a, S>) -> ParseResult<'a, T, S> + 'a>;

/// Erases the concrete type of `parser`.
pub fn boxed<'a, S, P>(parser: P) -> BoxedParser<'a, S, P::Output>
where
    P: Parser<'a, S> + 'a,
{
    Box::new(move |input| parser.parse(input))
}

/// Runs `parser` over `text` from the beginning with the given initial state.
///
/// Empty input fails immediately without invoking the grammar.
pub fn run<'a, S, P>(parser: &P, text: &'a str, state: S) -> ParseResult<'a, P::Output, S>
where
    P: Parser<'a, S>,
{
    let input = Input::new(text, state);
    if input.is_exhausted() {
        return Err(input.fail("unexpected end of input"));
    }
    parser.parse(input)
}
