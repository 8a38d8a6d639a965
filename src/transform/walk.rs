use super::{RuntimeData, TransformedScreen, Transformer};
use super::items::resolve_items;
use crate::condition::all_satisfied;
use crate::context::DataContext;
use crate::document::Experience;
use crate::error::TransformError;
use crate::node::{Collection, Conditional, Node, NodeKind};
use crate::template::FunctionRegistry;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde_json::Value;
use tracing::{debug, trace};

/// What a node inherits from the position it is expanded at.
#[derive(Clone, Copy)]
struct Frame<'f> {
    context: DataContext<'f>,
    /// Index into `Walk::scopes` of the `data` value in effect, if any.
    scope: Option<usize>,
    /// Accumulated `{collectionID}-{index}-` prefixes of the enclosing replicas.
    prefix: &'f str,
    /// The `collectionNodeIDs` group that effective children of a replica are recorded
    /// in. Cleared below every emitted node.
    replica_group: Option<usize>,
}

/// A single depth-first rewrite of one screen.
pub(super) struct Walk<'t> {
    experience: &'t Experience,
    runtime: &'t RuntimeData,
    functions: &'t FunctionRegistry,
    resolve_missing_items: bool,
    nodes: Vec<Node>,
    emitted: AHashSet<String>,
    collection_groups: Vec<Vec<String>>,
    scopes: Vec<Value>,
    node_scopes: AHashMap<String, usize>,
    ancestors: Vec<&'t str>,
}

impl<'t> Walk<'t> {
    pub(super) fn new(transformer: &'t Transformer<'_>) -> Self {
        Self {
            experience: transformer.experience,
            runtime: &transformer.runtime,
            functions: &transformer.functions,
            resolve_missing_items: transformer.resolve_missing_items,
            nodes: Vec::new(),
            emitted: AHashSet::new(),
            collection_groups: Vec::new(),
            scopes: Vec::new(),
            node_scopes: AHashMap::new(),
            ancestors: Vec::new(),
        }
    }

    pub(super) fn run(
        mut self,
        screen: &'t Node,
        root: DataContext<'_>,
    ) -> Result<TransformedScreen, TransformError> {
        let frame = Frame {
            context: root,
            scope: None,
            prefix: "",
            replica_group: None,
        };
        self.ancestors.push(&screen.id);
        let mut spliced = Vec::with_capacity(1);
        self.emit(screen, &frame, &mut spliced)?;

        Ok(TransformedScreen::new(
            screen.id.clone(),
            self.nodes,
            self.collection_groups.into_iter().concat(),
            self.scopes,
            self.node_scopes,
        ))
    }

    fn expand_children(
        &mut self,
        parent: &'t Node,
        frame: &Frame<'_>,
        spliced: &mut Vec<String>,
    ) -> Result<(), TransformError> {
        for child_id in parent.children() {
            self.expand(child_id, parent, frame, spliced)?;
        }
        Ok(())
    }

    /// Expands one child reference, appending the IDs it contributes to `spliced`.
    fn expand(
        &mut self,
        node_id: &str,
        parent: &Node,
        frame: &Frame<'_>,
        spliced: &mut Vec<String>,
    ) -> Result<(), TransformError> {
        let experience = self.experience;
        let node = experience
            .node(node_id)
            .ok_or_else(|| TransformError::NodeNotFound {
                missing_node_id: node_id.to_string(),
                parent_node_id: parent.id.clone(),
            })?;
        if self.ancestors.contains(&node.id.as_str()) {
            return Err(TransformError::CycleDetected(node.id.clone()));
        }

        self.ancestors.push(&node.id);
        let result = match &node.kind {
            NodeKind::DataSource(_) => self.splice_data_source(node, frame, spliced),
            NodeKind::Conditional(conditional) => {
                self.splice_conditional(node, conditional, frame, spliced)
            }
            NodeKind::Collection(collection) => {
                self.splice_collection(node, collection, frame, spliced)
            }
            _ => self.emit(node, frame, spliced),
        };
        self.ancestors.pop();
        result
    }

    /// Emits a concrete node before its descendants, then fills in its rewritten children.
    fn emit(
        &mut self,
        node: &'t Node,
        frame: &Frame<'_>,
        spliced: &mut Vec<String>,
    ) -> Result<(), TransformError> {
        let id = format!("{}{}", frame.prefix, node.id);
        if !self.emitted.insert(id.clone()) {
            return Err(TransformError::DuplicateOutputId(id));
        }
        if let Some(group) = frame.replica_group {
            self.collection_groups[group].push(id.clone());
        }
        if let Some(scope) = frame.scope {
            self.node_scopes.insert(id.clone(), scope);
        }
        trace!(node_id = %id, type_name = node.type_name(), "Emitting node.");

        let slot = self.nodes.len();
        let mut rewritten = node.clone();
        rewritten.id = id.clone();
        rewritten.child_ids = Vec::new();
        self.nodes.push(rewritten);

        let inner = Frame {
            replica_group: None,
            ..*frame
        };
        let mut children = Vec::with_capacity(node.children().len());
        self.expand_children(node, &inner, &mut children)?;
        self.nodes[slot].child_ids = children;

        spliced.push(id);
        Ok(())
    }

    fn splice_data_source(
        &mut self,
        node: &'t Node,
        frame: &Frame<'_>,
        spliced: &mut Vec<String>,
    ) -> Result<(), TransformError> {
        let runtime = self.runtime;
        match runtime.payloads.get(&node.id) {
            Some(payload) => {
                let scope = self.push_scope(payload);
                let scoped = Frame {
                    context: frame.context.with_data(payload),
                    scope: Some(scope),
                    ..*frame
                };
                self.expand_children(node, &scoped, spliced)
            }
            None => {
                trace!(data_source_id = %node.id, "No payload; splicing children without data.");
                let scoped = Frame {
                    context: frame.context.without_data(),
                    scope: None,
                    ..*frame
                };
                self.expand_children(node, &scoped, spliced)
            }
        }
    }

    fn splice_conditional(
        &mut self,
        node: &'t Node,
        conditional: &Conditional,
        frame: &Frame<'_>,
        spliced: &mut Vec<String>,
    ) -> Result<(), TransformError> {
        if all_satisfied(&conditional.conditions, &frame.context, self.functions) {
            self.expand_children(node, frame, spliced)
        } else {
            debug!(conditional_id = %node.id, prefix = frame.prefix, "Pruning conditional subtree.");
            Ok(())
        }
    }

    fn splice_collection(
        &mut self,
        node: &'t Node,
        collection: &Collection,
        frame: &Frame<'_>,
        spliced: &mut Vec<String>,
    ) -> Result<(), TransformError> {
        let runtime = self.runtime;
        let resolved: Vec<Value>;
        let items: &[Value] = match runtime.items.get(&node.id) {
            Some(Some(items)) => items,
            Some(None) => &[],
            None if self.resolve_missing_items => {
                resolved = resolve_items(collection, &frame.context, self.functions);
                &resolved
            }
            None => &[],
        };
        trace!(collection_id = %node.id, prefix = frame.prefix, items = items.len(), "Replicating collection.");

        // A collection that is itself an effective child of a replica records into the
        // enclosing group; any other collection opens a group of its own.
        let group = match frame.replica_group {
            Some(group) => group,
            None => {
                self.collection_groups.push(Vec::new());
                self.collection_groups.len() - 1
            }
        };

        for (index, item) in items.iter().enumerate() {
            let prefix = format!("{}{}-{}-", frame.prefix, node.id, index);
            let scope = self.push_scope(item);
            let replica = Frame {
                context: frame.context.with_data(item),
                scope: Some(scope),
                prefix: &prefix,
                replica_group: Some(group),
            };
            self.expand_children(node, &replica, spliced)?;
        }
        Ok(())
    }

    fn push_scope(&mut self, value: &Value) -> usize {
        self.scopes.push(value.clone());
        self.scopes.len() - 1
    }
}
