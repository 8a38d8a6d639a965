use crate::context::Namespace;
use crate::error::TemplateError;
use crate::parser::{self, Parser, Success};
use crate::parser::{
    alt, any_char, bind, character, left, literal, many, many1, map, not_followed_by, optional,
    pair, right, satisfy, update_state, verify, whitespace, whitespace1,
};
use itertools::Itertools;
use std::fmt;
use tracing::trace;

/// One piece of a tokenized template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, copied to the output unchanged.
    RegularText(String),
    /// A `{{ ... }}` span to be resolved against a data context.
    Handlebar(HandlebarExpression),
}

/// A parsed `{{ [function] namespace.key.path ["argument" ...] }}` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlebarExpression {
    pub function: Option<String>,
    pub arguments: Vec<String>,
    pub namespace: Namespace,
    pub key_path: Vec<String>,
}

impl fmt::Display for HandlebarExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{ ")?;
        if let Some(function) = &self.function {
            write!(f, "{function} ")?;
        }
        write!(f, "{}", self.namespace)?;
        for segment in &self.key_path {
            write!(f, ".{segment}")?;
        }
        for argument in &self.arguments {
            write!(f, " \"{argument}\"")?;
        }
        write!(f, " }}}}")
    }
}

/// Parse state threaded through the template grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerState {
    /// Number of handlebar expressions recognised so far.
    pub expressions: usize,
}

/// Splits `text` into literal text and handlebar expressions.
///
/// A `{{` that does not begin a well-formed expression is kept as literal text. The
/// only hard failure is a different number of `{{` and `}}` in the whole string.
pub fn tokenize(text: &str) -> Result<Vec<Token>, TemplateError> {
    let opening = text.matches("{{").count();
    let closing = text.matches("}}").count();
    if opening == 0 && closing == 0 {
        return Ok(vec![Token::RegularText(text.to_string())]);
    }
    if opening != closing {
        return Err(TemplateError::UnbalancedBraces { opening, closing });
    }

    let grammar = template();
    let tokens = match parser::run(&grammar, text, TokenizerState::default()) {
        Ok(Success { value, rest }) => {
            trace!(
                expressions = rest.state().expressions,
                unparsed = rest.remaining().len(),
                "Tokenized template."
            );
            let mut tokens = value;
            if !rest.is_exhausted() {
                tokens.push(Token::RegularText(rest.remaining().to_string()));
            }
            tokens
        }
        Err(failure) => {
            trace!(%failure, "No expressions found in template.");
            vec![Token::RegularText(text.to_string())]
        }
    };
    Ok(merge_text(tokens))
}

/// Joins runs of adjacent literal text into a single token.
fn merge_text(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .coalesce(|previous, current| match (previous, current) {
            (Token::RegularText(mut a), Token::RegularText(b)) => {
                a.push_str(&b);
                Ok(Token::RegularText(a))
            }
            (previous, current) => Err((previous, current)),
        })
        .collect()
}

type State = TokenizerState;

fn template<'a>() -> impl Parser<'a, State, Output = Vec<Token>> {
    // One brace at a time, so an expression opening inside a longer run still matches.
    let stray_brace = map(character('{'), |brace: char| Token::RegularText(brace.to_string()));
    many(alt(
        alt(
            map(expression(), Token::Handlebar),
            map(regular_text(), Token::RegularText),
        ),
        stray_brace,
    ))
}

/// The longest run of characters that does not start a `{{`.
fn regular_text<'a>() -> impl Parser<'a, State, Output = String> {
    map(
        many1(right(not_followed_by(literal("{{")), any_char())),
        |chars| chars.into_iter().collect::<String>(),
    )
}

fn expression<'a>() -> impl Parser<'a, State, Output = HandlebarExpression> {
    let open = pair(literal("{{"), whitespace());
    let head = optional(left(function_call(), whitespace1()));
    let path = pair(namespace(), many(key_segment()));
    let arguments = many(right(whitespace(), argument()));
    let close = pair(whitespace(), literal("}}"));

    let body = pair(pair(right(open, head), path), left(arguments, close));
    let expression = map(body, |((head, (namespace, key_path)), trailing)| {
        let (function, mut arguments) = match head {
            Some((name, leading)) => (Some(name), leading),
            None => (None, Vec::new()),
        };
        arguments.extend(trailing);
        HandlebarExpression {
            function,
            arguments,
            namespace,
            key_path,
        }
    });
    update_state(expression, |_, state: State| State {
        expressions: state.expressions + 1,
    })
}

fn identifier<'a>() -> impl Parser<'a, State, Output = String> {
    map(
        pair(
            satisfy("letter", |c| c.is_alphabetic() || c == '_'),
            many(satisfy("identifier character", |c| {
                c.is_alphanumeric() || c == '_'
            })),
        ),
        |(first, rest)| std::iter::once(first).chain(rest).collect::<String>(),
    )
}

/// A function name, optionally followed by one parenthesised argument: `uppercase` or
/// `replace("-")`.
fn function_call<'a>() -> impl Parser<'a, State, Output = (String, Vec<String>)> {
    let name = verify(identifier(), "a function name", |name: &String| {
        Namespace::from_keyword(name).is_none()
    });
    let parenthesised = right(
        pair(character('('), whitespace()),
        left(argument(), pair(whitespace(), character(')'))),
    );
    map(pair(name, optional(parenthesised)), |(name, argument)| {
        (name, argument.into_iter().collect::<Vec<_>>())
    })
}

fn namespace<'a>() -> impl Parser<'a, State, Output = Namespace> {
    alt(
        alt(
            map(literal("data"), |_| Namespace::Data),
            map(literal("user"), |_| Namespace::User),
        ),
        map(literal("url"), |_| Namespace::Url),
    )
}

fn key_segment<'a>() -> impl Parser<'a, State, Output = String> {
    right(
        character('.'),
        map(
            many1(satisfy("key character", |c| {
                !c.is_whitespace() && !matches!(c, '.' | '{' | '}' | '(' | ')') && !is_quote(c)
            })),
            |chars| chars.into_iter().collect::<String>(),
        ),
    )
}

/// A quoted string or a bare integer.
fn argument<'a>() -> impl Parser<'a, State, Output = String> {
    alt(
        quoted(),
        map(many1(satisfy("digit", |c| c.is_ascii_digit())), |digits| {
            digits.into_iter().collect::<String>()
        }),
    )
}

/// A string between matching quotes. The opening quote decides which character closes it.
fn quoted<'a>() -> impl Parser<'a, State, Output = String> {
    bind(satisfy("opening quote", is_opening_quote), |open| {
        let close = closing_quote(open);
        left(
            map(
                many(satisfy("quoted character", move |c| c != close)),
                |chars| chars.into_iter().collect::<String>(),
            ),
            character(close),
        )
    })
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '\u{201C}' | '\u{201D}')
}

fn is_opening_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '\u{201C}')
}

fn closing_quote(open: char) -> char {
    match open {
        '\u{201C}' => '\u{201D}',
        other => other,
    }
}

/// Tokenizes from an arbitrary cursor; used by tests that need the final parse state.
#[cfg(test)]
fn tokenize_from(input: crate::parser::Input<'_, State>) -> Option<(Vec<Token>, State)> {
    template()
        .parse(input)
        .ok()
        .map(|success| (success.value, *success.rest.state()))
}
