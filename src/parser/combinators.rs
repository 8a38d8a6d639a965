use super::{BoxedParser, Input, Parser, Success};

/// Matches one character for which `predicate` holds.
///
/// `expected` names the character class in failure messages.
pub fn satisfy<'a, S, F>(expected: &'static str, predicate: F) -> impl Parser<'a, S, Output = char>
where
    F: Fn(char) -> bool,
{
    move |input: Input<'a, S>| match input.remaining().chars().next() {
        Some(c) if predicate(c) => Ok(Success {
            value: c,
            rest: input.advance(c.len_utf8()),
        }),
        Some(c) => Err(input.fail(format!("expected {expected}, found '{c}'"))),
        None => Err(input.fail(format!("expected {expected}, found end of input"))),
    }
}

/// Matches any single character.
pub fn any_char<'a, S>() -> impl Parser<'a, S, Output = char> {
    satisfy("any character", |_| true)
}

/// Matches exactly the character `expected`.
pub fn character<'a, S>(expected: char) -> impl Parser<'a, S, Output = char> {
    move |input: Input<'a, S>| match input.remaining().chars().next() {
        Some(c) if c == expected => Ok(Success {
            value: c,
            rest: input.advance(c.len_utf8()),
        }),
        Some(c) => Err(input.fail(format!("expected '{expected}', found '{c}'"))),
        None => Err(input.fail(format!("expected '{expected}', found end of input"))),
    }
}

/// Matches exactly the string `expected`, yielding the matched slice of the input.
pub fn literal<'a, S>(expected: &'static str) -> impl Parser<'a, S, Output = &'a str> {
    move |input: Input<'a, S>| {
        let remaining = input.remaining();
        if remaining.is_empty() {
            return Err(input.fail(format!("expected '{expected}', found end of input")));
        }
        if remaining.starts_with(expected) {
            let matched = &remaining[..expected.len()];
            Ok(Success {
                value: matched,
                rest: input.advance(expected.len()),
            })
        } else {
            Err(input.fail(format!("expected '{expected}'")))
        }
    }
}

/// Runs every parser in order, collecting their values. Fails on the first parser that fails.
pub fn sequence<'a, S, T>(parsers: Vec<BoxedParser<'a, S, T>>) -> impl Parser<'a, S, Output = Vec<T>> {
    move |input: Input<'a, S>| {
        let mut values = Vec::with_capacity(parsers.len());
        let mut rest = input;
        for parser in &parsers {
            let step = parser.parse(rest)?;
            values.push(step.value);
            rest = step.rest;
        }
        Ok(Success { value: values, rest })
    }
}

/// Runs `first` then `second`, yielding both values.
pub fn pair<'a, S, P, Q>(first: P, second: Q) -> impl Parser<'a, S, Output = (P::Output, Q::Output)>
where
    P: Parser<'a, S>,
    Q: Parser<'a, S>,
{
    move |input: Input<'a, S>| {
        let a = first.parse(input)?;
        let b = second.parse(a.rest)?;
        Ok(Success {
            value: (a.value, b.value),
            rest: b.rest,
        })
    }
}

/// Runs `first` then `second`, keeping only the value of `first`.
pub fn left<'a, S, P, Q>(first: P, second: Q) -> impl Parser<'a, S, Output = P::Output>
where
    P: Parser<'a, S>,
    Q: Parser<'a, S>,
{
    map(pair(first, second), |(value, _)| value)
}

/// Runs `first` then `second`, keeping only the value of `second`.
pub fn right<'a, S, P, Q>(first: P, second: Q) -> impl Parser<'a, S, Output = Q::Output>
where
    P: Parser<'a, S>,
    Q: Parser<'a, S>,
{
    map(pair(first, second), |(_, value)| value)
}

/// Tries `first`; if it fails, tries `second` from the same position.
///
/// When both fail, the failure that got further into the input is reported.
pub fn alt<'a, S, T, P, Q>(first: P, second: Q) -> impl Parser<'a, S, Output = T>
where
    S: Clone,
    P: Parser<'a, S, Output = T>,
    Q: Parser<'a, S, Output = T>,
{
    move |input: Input<'a, S>| match first.parse(input.clone()) {
        Ok(success) => Ok(success),
        Err(first_failure) => match second.parse(input) {
            Ok(success) => Ok(success),
            Err(second_failure) if second_failure.position >= first_failure.position => {
                Err(second_failure)
            }
            Err(_) => Err(first_failure),
        },
    }
}

/// Succeeds with `None` instead of failing when `parser` does not match.
pub fn optional<'a, S, P>(parser: P) -> impl Parser<'a, S, Output = Option<P::Output>>
where
    S: Clone,
    P: Parser<'a, S>,
{
    move |input: Input<'a, S>| match parser.parse(input.clone()) {
        Ok(Success { value, rest }) => Ok(Success {
            value: Some(value),
            rest,
        }),
        Err(_) => Ok(Success {
            value: None,
            rest: input,
        }),
    }
}

/// Applies `parser` as many times as it matches, greedily. Never fails.
pub fn many<'a, S, P>(parser: P) -> impl Parser<'a, S, Output = Vec<P::Output>>
where
    S: Clone,
    P: Parser<'a, S>,
{
    move |input: Input<'a, S>| {
        let mut values = Vec::new();
        let mut rest = input;
        while !rest.is_exhausted() {
            match parser.parse(rest.clone()) {
                // A match that consumes nothing would repeat forever.
                Ok(step) if step.rest.position() == rest.position() => break,
                Ok(step) => {
                    values.push(step.value);
                    rest = step.rest;
                }
                Err(_) => break,
            }
        }
        Ok(Success {
            value: values,
            rest,
        })
    }
}

/// Like [`many`], but requires at least one match.
pub fn many1<'a, S, P>(parser: P) -> impl Parser<'a, S, Output = Vec<P::Output>>
where
    S: Clone,
    P: Parser<'a, S>,
{
    let repeated = many(parser);
    move |input: Input<'a, S>| {
        let start = input.fail("expected at least one match");
        let success = repeated.parse(input)?;
        if success.value.is_empty() {
            Err(start)
        } else {
            Ok(success)
        }
    }
}

/// Transforms the value of a successful parse.
pub fn map<'a, S, P, F, U>(parser: P, f: F) -> impl Parser<'a, S, Output = U>
where
    P: Parser<'a, S>,
    F: Fn(P::Output) -> U,
{
    move |input: Input<'a, S>| {
        let Success { value, rest } = parser.parse(input)?;
        Ok(Success {
            value: f(value),
            rest,
        })
    }
}

/// Feeds the value of a successful parse into `f` and continues with the parser it returns.
pub fn bind<'a, S, P, Q, F>(parser: P, f: F) -> impl Parser<'a, S, Output = Q::Output>
where
    P: Parser<'a, S>,
    Q: Parser<'a, S>,
    F: Fn(P::Output) -> Q,
{
    move |input: Input<'a, S>| {
        let Success { value, rest } = parser.parse(input)?;
        f(value).parse(rest)
    }
}

/// Fails, without consuming input, when the parsed value does not satisfy `predicate`.
pub fn verify<'a, S, P, F>(
    parser: P,
    expected: &'static str,
    predicate: F,
) -> impl Parser<'a, S, Output = P::Output>
where
    P: Parser<'a, S>,
    F: Fn(&P::Output) -> bool,
{
    move |input: Input<'a, S>| {
        let start = input.fail(format!("expected {expected}"));
        let success = parser.parse(input)?;
        if predicate(&success.value) {
            Ok(success)
        } else {
            Err(start)
        }
    }
}

/// Succeeds without consuming input only when `parser` would fail here.
pub fn not_followed_by<'a, S, P>(parser: P) -> impl Parser<'a, S, Output = ()>
where
    S: Clone,
    P: Parser<'a, S>,
{
    move |input: Input<'a, S>| match parser.parse(input.clone()) {
        Ok(_) => Err(input.fail("unexpected match")),
        Err(_) => Ok(Success {
            value: (),
            rest: input,
        }),
    }
}

/// Runs `parser`, then replaces the parse state with `f(&value, state)`.
pub fn update_state<'a, S, P, F>(parser: P, f: F) -> impl Parser<'a, S, Output = P::Output>
where
    P: Parser<'a, S>,
    F: Fn(&P::Output, S) -> S,
{
    move |input: Input<'a, S>| {
        let Success { value, rest } = parser.parse(input)?;
        let rest = rest.map_state(|state| f(&value, state));
        Ok(Success { value, rest })
    }
}

/// Yields a copy of the current parse state without consuming input.
pub fn state<'a, S: Clone>() -> impl Parser<'a, S, Output = S> {
    move |input: Input<'a, S>| {
        Ok(Success {
            value: input.state().clone(),
            rest: input,
        })
    }
}

/// Zero or more whitespace characters.
pub fn whitespace<'a, S: Clone>() -> impl Parser<'a, S, Output = ()> {
    map(many(satisfy("whitespace", char::is_whitespace)), |_| ())
}

/// One or more whitespace characters.
pub fn whitespace1<'a, S: Clone>() -> impl Parser<'a, S, Output = ()> {
    map(many1(satisfy("whitespace", char::is_whitespace)), |_| ())
}
