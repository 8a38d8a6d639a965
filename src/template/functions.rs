use crate::error::TemplateError;
use ahash::AHashMap;
use std::fmt;

/// A named helper that can be applied inside a handlebar expression, e.g.
/// `{{ uppercase data.title }}`.
pub trait TemplateFunction: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, input: &str, arguments: &[String]) -> Result<String, TemplateError>;
}

/// The set of template functions available to an interpolator.
pub struct FunctionRegistry {
    functions: AHashMap<String, Box<dyn TemplateFunction>>,
}

impl FunctionRegistry {
    /// A registry without any functions.
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// Registers `function`, replacing any function of the same name.
    pub fn register(&mut self, function: Box<dyn TemplateFunction>) {
        self.functions.insert(function.name().to_string(), function);
    }

    pub fn get(&self, name: &str) -> Option<&dyn TemplateFunction> {
        self.functions.get(name).map(|function| function.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Applies the function called `name` to `input`.
    pub fn apply(
        &self,
        name: &str,
        input: &str,
        arguments: &[String],
    ) -> Result<String, TemplateError> {
        let function = self
            .get(name)
            .ok_or_else(|| TemplateError::UnknownFunction(name.to_string()))?;
        function.apply(input, arguments)
    }
}

impl Default for FunctionRegistry {
    /// A registry holding every built-in function.
    fn default() -> Self {
        let mut registry = Self::empty();
        register_default_functions(&mut registry);
        registry
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

fn require_arguments<'a>(
    function: &str,
    arguments: &'a [String],
    count: usize,
) -> Result<&'a [String], TemplateError> {
    if arguments.len() != count {
        Err(TemplateError::InvalidArguments {
            function: function.to_string(),
            message: format!(
                "expected {} argument(s), but received {}",
                count,
                arguments.len()
            ),
        })
    } else {
        Ok(arguments)
    }
}

fn character_count(function: &str, argument: &str) -> Result<usize, TemplateError> {
    argument
        .trim()
        .parse()
        .map_err(|_| TemplateError::InvalidArguments {
            function: function.to_string(),
            message: format!("'{argument}' is not a character count"),
        })
}

/// Defines the built-in functions and the function that registers them.
macro_rules! define_template_functions {
    ( $( ($struct_name:ident, $name:expr, $arity:expr, |$input:ident, $args:ident| $body:expr) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl TemplateFunction for $struct_name {
                fn name(&self) -> &str { $name }
                fn apply(&self, $input: &str, arguments: &[String]) -> Result<String, TemplateError> {
                    let $args = require_arguments($name, arguments, $arity)?;
                    $body
                }
            }
        )*

        fn register_default_functions(registry: &mut FunctionRegistry) {
            $( registry.register(Box::new($struct_name)); )*
        }
    };
}

define_template_functions! {
    (LowercaseFunction, "lowercase", 0, |input, _args| Ok(input.to_lowercase())),
    (UppercaseFunction, "uppercase", 0, |input, _args| Ok(input.to_uppercase())),
    (ReplaceFunction, "replace", 2, |input, args| Ok(input.replace(args[0].as_str(), &args[1]))),
    (DropFirstFunction, "dropFirst", 1, |input, args| {
        let count = character_count("dropFirst", &args[0])?;
        Ok(input.chars().skip(count).collect())
    }),
    (DropLastFunction, "dropLast", 1, |input, args| {
        let count = character_count("dropLast", &args[0])?;
        let keep = input.chars().count().saturating_sub(count);
        Ok(input.chars().take(keep).collect())
    }),
    (PrefixFunction, "prefix", 1, |input, args| {
        let count = character_count("prefix", &args[0])?;
        Ok(input.chars().take(count).collect())
    }),
    (SuffixFunction, "suffix", 1, |input, args| {
        let count = character_count("suffix", &args[0])?;
        let skip = input.chars().count().saturating_sub(count);
        Ok(input.chars().skip(skip).collect())
    }),
}
