use thiserror::Error;

/// Errors raised while tokenizing or interpolating a single template string.
///
/// A template error is local to the one string being interpolated; it never
/// aborts the transformation of the surrounding tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unbalanced handlebars: found {opening} '{{{{' but {closing} '}}}}'")]
    UnbalancedBraces { opening: usize, closing: usize },

    #[error("Template function '{0}' is not registered")]
    UnknownFunction(String),

    #[error("Invalid arguments for template function '{function}': {message}")]
    InvalidArguments { function: String, message: String },
}

/// Errors raised when the node graph handed to the transformer violates its input contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Screen '{0}' not found in the experience")]
    ScreenNotFound(String),

    #[error("Node '{node_id}' is a {type_name}, not a Screen")]
    NotAScreen { node_id: String, type_name: String },

    #[error(
        "Node '{missing_node_id}' not found, which is referenced as a child of node '{parent_node_id}'"
    )]
    NodeNotFound {
        missing_node_id: String,
        parent_node_id: String,
    },

    #[error("Node '{0}' is reachable from itself; the node graph must be a tree")]
    CycleDetected(String),

    #[error("Node ID '{0}' would appear more than once in the transformed screen")]
    DuplicateOutputId(String),
}

/// Errors that can occur while loading an experience document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Failed to parse experience JSON: {0}")]
    JsonParseError(String),

    #[error("Node ID '{0}' appears more than once in the experience")]
    DuplicateNodeId(String),

    #[error("Initial screen '{0}' is not a Screen node of the experience")]
    InitialScreenNotFound(String),

    #[error("Node '{node_id}' has an unknown type: '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },

    #[error("Node '{node_id}' is invalid: {message}")]
    InvalidNode { node_id: String, message: String },
}
