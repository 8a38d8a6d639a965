//! Handlebar templates: tokenizing `{{ ... }}` expressions out of text and substituting
//! them from a [`DataContext`](crate::context::DataContext).

pub mod functions;
pub mod interpolator;
pub mod tokenizer;

pub use functions::{FunctionRegistry, TemplateFunction};
pub use interpolator::Interpolator;
pub use tokenizer::{HandlebarExpression, Token, TokenizerState, tokenize};
