//! The screen transformation pipeline.
//!
//! A [`Transformer`] rewrites the author-time tree rooted at a screen into the concrete
//! tree the render stage draws:
//!
//! - data sources disappear and their payload becomes the `data` scope of their subtree,
//! - conditionals disappear and their subtree is kept only if every condition holds,
//! - collections disappear and their children are replicated once per item, with every
//!   ID inside a replica prefixed by `{collectionID}-{index}-`.
//!
//! Every other node is copied through with its children rewritten. Nodes are emitted in
//! pre-order, so the screen is always the first node of a [`TransformedScreen`].

mod items;
mod walk;

pub use items::resolve_items;

use crate::context::{DataContext, UrlParameters, UserInfo};
use crate::document::Experience;
use crate::error::{DocumentError, TransformError};
use crate::node::{Node, NodeKind};
use crate::template::{FunctionRegistry, Interpolator, TemplateFunction};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use tracing::debug;
use walk::Walk;

/// Externally resolved data a screen is transformed against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeData {
    /// Fetched payload per data source ID.
    #[serde(default)]
    pub payloads: AHashMap<String, Value>,
    /// Item array per collection ID. `null` counts as no items.
    #[serde(default)]
    pub items: AHashMap<String, Option<Vec<Value>>>,
    #[serde(default, rename = "user")]
    pub user_info: UserInfo,
    #[serde(default, rename = "url")]
    pub url_parameters: UrlParameters,
}

impl RuntimeData {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::JsonParseError(e.to_string()))
    }

    /// Load runtime data from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DocumentError::JsonParseError(format!("Could not read file '{}': {}", path, e))
        })?;
        Self::from_json(&content)
    }
}

/// Configures a [`Transformer`].
pub struct TransformerBuilder<'e> {
    experience: &'e Experience,
    runtime: RuntimeData,
    functions: FunctionRegistry,
    resolve_missing_items: bool,
}

impl<'e> TransformerBuilder<'e> {
    pub fn new(experience: &'e Experience) -> Self {
        Self {
            experience,
            runtime: RuntimeData::default(),
            functions: FunctionRegistry::default(),
            resolve_missing_items: false,
        }
    }

    /// Replaces all runtime data at once.
    pub fn with_runtime_data(mut self, runtime: RuntimeData) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_payload(mut self, data_source_id: impl Into<String>, payload: Value) -> Self {
        self.runtime.payloads.insert(data_source_id.into(), payload);
        self
    }

    pub fn with_payloads(mut self, payloads: AHashMap<String, Value>) -> Self {
        self.runtime.payloads.extend(payloads);
        self
    }

    pub fn with_items(mut self, collection_id: impl Into<String>, items: Vec<Value>) -> Self {
        self.runtime.items.insert(collection_id.into(), Some(items));
        self
    }

    pub fn with_items_map(mut self, items: AHashMap<String, Vec<Value>>) -> Self {
        self.runtime
            .items
            .extend(items.into_iter().map(|(id, items)| (id, Some(items))));
        self
    }

    /// Records an explicitly `null` item array, which replicates nothing.
    pub fn with_null_items(mut self, collection_id: impl Into<String>) -> Self {
        self.runtime.items.insert(collection_id.into(), None);
        self
    }

    pub fn with_user_info(mut self, user_info: UserInfo) -> Self {
        self.runtime.user_info = user_info;
        self
    }

    pub fn with_url_parameters(mut self, url_parameters: UrlParameters) -> Self {
        self.runtime.url_parameters = url_parameters;
        self
    }

    /// Registers a template function, replacing any built-in of the same name.
    pub fn with_function(mut self, function: Box<dyn TemplateFunction>) -> Self {
        self.functions.register(function);
        self
    }

    /// When enabled, a collection with no supplied items resolves them itself from its
    /// key-path in the current `data` scope.
    pub fn resolve_missing_items(mut self, enabled: bool) -> Self {
        self.resolve_missing_items = enabled;
        self
    }

    pub fn build(self) -> Transformer<'e> {
        Transformer {
            experience: self.experience,
            runtime: self.runtime,
            functions: self.functions,
            resolve_missing_items: self.resolve_missing_items,
        }
    }
}

/// Transforms the screens of one experience against one set of runtime data.
///
/// Immutable once built; [`Transformer::transform`] can be called from several threads
/// at once.
#[derive(Debug)]
pub struct Transformer<'e> {
    experience: &'e Experience,
    runtime: RuntimeData,
    functions: FunctionRegistry,
    resolve_missing_items: bool,
}

impl<'e> Transformer<'e> {
    pub fn builder(experience: &'e Experience) -> TransformerBuilder<'e> {
        TransformerBuilder::new(experience)
    }

    pub fn experience(&self) -> &'e Experience {
        self.experience
    }

    pub fn runtime(&self) -> &RuntimeData {
        &self.runtime
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// The context at the screen root: `user` and `url`, no `data`.
    pub fn root_context(&self) -> DataContext<'_> {
        DataContext::new(&self.runtime.user_info, &self.runtime.url_parameters)
    }

    /// Rewrites the tree rooted at `screen_id`.
    pub fn transform(&self, screen_id: &str) -> Result<TransformedScreen, TransformError> {
        let screen = self
            .experience
            .node(screen_id)
            .ok_or_else(|| TransformError::ScreenNotFound(screen_id.to_string()))?;
        if !matches!(screen.kind, NodeKind::Screen(_)) {
            return Err(TransformError::NotAScreen {
                node_id: screen_id.to_string(),
                type_name: screen.type_name().to_string(),
            });
        }

        let transformed = Walk::new(self).run(screen, self.root_context())?;
        debug!(
            screen_id,
            nodes = transformed.len(),
            collection_node_ids = transformed.collection_node_ids().len(),
            "Transformed screen."
        );
        Ok(transformed)
    }

    /// Rewrites the experience's initial screen.
    pub fn transform_initial_screen(&self) -> Result<TransformedScreen, TransformError> {
        let screen_id = self
            .experience
            .initial_screen_id()
            .ok_or_else(|| TransformError::ScreenNotFound(String::new()))?;
        self.transform(screen_id)
    }

    /// The context a transformed node was emitted in. Unknown IDs get the root context.
    pub fn context_for<'s>(&'s self, screen: &'s TransformedScreen, node_id: &str) -> DataContext<'s> {
        let root = self.root_context();
        match screen.data_for(node_id) {
            Some(data) => root.with_data(data),
            None => root,
        }
    }

    pub fn interpolator_for<'s>(
        &'s self,
        screen: &'s TransformedScreen,
        node_id: &str,
    ) -> Interpolator<'s> {
        Interpolator::new(self.context_for(screen, node_id), &self.functions)
    }
}

/// Transforms `screen_id` of `experience` with default configuration.
pub fn transform(
    experience: &Experience,
    screen_id: &str,
    runtime: RuntimeData,
) -> Result<TransformedScreen, TransformError> {
    Transformer::builder(experience)
        .with_runtime_data(runtime)
        .build()
        .transform(screen_id)
}

/// The concrete tree of one screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedScreen {
    #[serde(rename = "screenID")]
    pub screen_id: String,
    nodes: Vec<Node>,
    #[serde(rename = "collectionNodeIDs")]
    collection_node_ids: Vec<String>,
    #[serde(skip)]
    index: AHashMap<String, usize>,
    #[serde(skip)]
    scopes: Vec<Value>,
    #[serde(skip)]
    node_scopes: AHashMap<String, usize>,
}

impl TransformedScreen {
    fn new(
        screen_id: String,
        nodes: Vec<Node>,
        collection_node_ids: Vec<String>,
        scopes: Vec<Value>,
        node_scopes: AHashMap<String, usize>,
    ) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.id.clone(), position))
            .collect();
        Self {
            screen_id,
            nodes,
            collection_node_ids,
            index,
            scopes,
            node_scopes,
        }
    }

    pub fn screen(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Every surviving node, in pre-order, starting with the screen.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The effective children of every collection replica. Grouped by owning collection
    /// in pre-order, then by item index. A collection that is itself an effective child
    /// of a replica contributes to its enclosing collection's group.
    pub fn collection_node_ids(&self) -> &[String] {
        &self.collection_node_ids
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index
            .get(id)
            .and_then(|&position| self.nodes.get(position))
    }

    /// Hands the nodes over to the caller, dropping the lookup index and data scopes.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// The transformed children of `id`, in order.
    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        self.node(id)
            .map(|node| {
                node.child_ids
                    .iter()
                    .filter_map(|child_id| self.node(child_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.id.as_str())
    }

    /// The `data` value in effect where `id` was emitted: the item of the nearest
    /// enclosing replica or the payload of the nearest data source.
    pub fn data_for(&self, id: &str) -> Option<&Value> {
        self.node_scopes
            .get(id)
            .and_then(|&scope| self.scopes.get(scope))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
