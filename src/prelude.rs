//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the tenkai crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use tenkai::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let experience = Experience::from_file("path/to/experience.json")?;
//! let runtime = RuntimeData::from_file("path/to/context.json")?;
//!
//! let transformer = Transformer::builder(&experience)
//!     .with_runtime_data(runtime)
//!     .build();
//! let screen = transformer.transform_initial_screen()?;
//!
//! println!("{}", OutlineFormatter::format_screen(&screen));
//! # Ok(())
//! # }
//! ```

// Document model
pub use crate::document::Experience;
pub use crate::node::{Collection, Conditional, DataSource, Metadata, Node, NodeKind, Screen};

// Transformation
pub use crate::transform::{
    RuntimeData, TransformedScreen, Transformer, TransformerBuilder, resolve_items,
};

// Conditions and data scopes
pub use crate::condition::{Condition, Predicate};
pub use crate::context::{DataContext, Namespace, UrlParameters, UserInfo};

// Templating
pub use crate::template::{FunctionRegistry, Interpolator, TemplateFunction};

// Outline formatting
pub use crate::outline::OutlineFormatter;

// Error types
pub use crate::error::{DocumentError, TemplateError, TransformError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
