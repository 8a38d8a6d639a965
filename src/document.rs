//! Loading and indexing experience documents.

use crate::error::DocumentError;
use crate::node::{Node, NodeKind};
use ahash::AHashMap;
use serde::Deserialize;
use std::fs;

/// The JSON envelope of an experience document.
#[derive(Deserialize)]
struct RawExperience {
    nodes: Vec<Node>,
    #[serde(rename = "initialScreenID", default)]
    initial_screen_id: Option<String>,
}

/// A validated, indexed node graph.
#[derive(Debug, Clone)]
pub struct Experience {
    nodes: Vec<Node>,
    index: AHashMap<String, usize>,
    initial_screen_id: Option<String>,
}

impl Experience {
    /// Indexes `nodes`, rejecting duplicate IDs.
    pub fn new(nodes: Vec<Node>) -> Result<Self, DocumentError> {
        let mut index = AHashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), position).is_some() {
                return Err(DocumentError::DuplicateNodeId(node.id.clone()));
            }
        }
        Ok(Self {
            nodes,
            index,
            initial_screen_id: None,
        })
    }

    /// Sets the screen shown when the experience opens.
    pub fn with_initial_screen(mut self, screen_id: &str) -> Result<Self, DocumentError> {
        match self.node(screen_id).map(|node| &node.kind) {
            Some(NodeKind::Screen(_)) => {
                self.initial_screen_id = Some(screen_id.to_string());
                Ok(self)
            }
            _ => Err(DocumentError::InitialScreenNotFound(screen_id.to_string())),
        }
    }

    /// Parses `{ "nodes": [...], "initialScreenID": "..." }`.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let raw: RawExperience = serde_json::from_str(json)
            .map_err(|e| DocumentError::JsonParseError(e.to_string()))?;
        let experience = Self::new(raw.nodes)?;
        match raw.initial_screen_id {
            Some(screen_id) => experience.with_initial_screen(&screen_id),
            None => Ok(experience),
        }
    }

    /// Load an experience document from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DocumentError::JsonParseError(format!("Could not read file '{}': {}", path, e))
        })?;
        Self::from_json(&content)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn screens(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Screen(_)))
    }

    /// The initial screen, or the first screen of the document when none was declared.
    pub fn initial_screen_id(&self) -> Option<&str> {
        self.initial_screen_id
            .as_deref()
            .or_else(|| self.screens().next().map(|screen| screen.id.as_str()))
    }
}
