use super::functions::FunctionRegistry;
use super::tokenizer::{HandlebarExpression, Token, tokenize};
use crate::context::{DataContext, stringify};
use crate::error::TemplateError;
use serde_json::Value;

/// Substitutes handlebar expressions in author-supplied strings.
#[derive(Debug, Clone, Copy)]
pub struct Interpolator<'a> {
    context: DataContext<'a>,
    functions: &'a FunctionRegistry,
}

impl<'a> Interpolator<'a> {
    pub fn new(context: DataContext<'a>, functions: &'a FunctionRegistry) -> Self {
        Self { context, functions }
    }

    pub fn context(&self) -> &DataContext<'a> {
        &self.context
    }

    /// Interpolates every expression in `text`.
    ///
    /// Returns `Ok(None)` when any expression references a value that does not exist
    /// (or is `null`): the string as a whole cannot be interpolated, and the caller picks
    /// the fallback. Returns an error for unbalanced braces and for function calls that
    /// cannot be applied.
    pub fn interpolate(&self, text: &str) -> Result<Option<String>, TemplateError> {
        let tokens = tokenize(text)?;
        let mut output = String::with_capacity(text.len());
        for token in &tokens {
            match token {
                Token::RegularText(literal) => output.push_str(literal),
                Token::Handlebar(expression) => match self.evaluate(expression)? {
                    Some(value) => output.push_str(&value),
                    None => return Ok(None),
                },
            }
        }
        Ok(Some(output))
    }

    /// Interpolates `text`, falling back to the original text when it cannot be interpolated.
    pub fn interpolate_or_original(&self, text: &str) -> String {
        match self.interpolate(text) {
            Ok(Some(interpolated)) => interpolated,
            _ => text.to_string(),
        }
    }

    fn evaluate(&self, expression: &HandlebarExpression) -> Result<Option<String>, TemplateError> {
        let resolved = self
            .context
            .resolve(expression.namespace, &expression.key_path);
        let value = match resolved.as_deref() {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => stringify(value),
        };
        match &expression.function {
            Some(name) => self
                .functions
                .apply(name, &value, &expression.arguments)
                .map(Some),
            None => Ok(Some(value)),
        }
    }
}
