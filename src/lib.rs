//! # Tenkai - Document Tree Transformation & Templating Engine
//!
//! **Tenkai** turns the author-time node graph of an experience into the concrete tree a
//! renderer draws. Given a screen and the data resolved for it at runtime, it inlines
//! data-source subtrees, prunes conditional subtrees whose conditions fail, and replicates
//! collection subtrees once per item with collision-free identifiers. Author strings can
//! reference data through handlebar expressions such as `{{ data.author.name }}` or
//! `{{ uppercase user.firstName }}`.
//!
//! ## Core Workflow
//!
//! 1.  **Load the document**: parse an experience with [`Experience::from_json`] (or build
//!     the `Node` list yourself and call [`Experience::new`]).
//! 2.  **Supply runtime data**: use [`Transformer::builder`] to attach data-source payloads,
//!     collection items, user info and URL parameters.
//! 3.  **Transform**: call [`Transformer::transform`] with a screen ID. The result holds the
//!     rewritten nodes in pre-order plus the IDs of every collection replica root.
//! 4.  **Interpolate**: use [`Transformer::interpolator_for`] to substitute the handlebar
//!     expressions of a transformed node against the data it was emitted with.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tenkai::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let experience = Experience::new(vec![
//!         Node::new("home", NodeKind::Screen(Screen::default())).with_children(["feed"]),
//!         Node::new("feed", NodeKind::collection("data.posts")).with_children(["title"]),
//!         Node::new("title", NodeKind::text("{{ data.title }} by {{ user.name }}")),
//!     ])?;
//!
//!     let transformer = Transformer::builder(&experience)
//!         .with_items("feed", vec![json!({ "title": "Hello" }), json!({ "title": "World" })])
//!         .with_user_info([("name".to_string(), json!("Ada"))].into_iter().collect())
//!         .build();
//!
//!     let screen = transformer.transform("home")?;
//!     assert_eq!(screen.collection_node_ids(), vec!["feed-0-title", "feed-1-title"]);
//!
//!     for node in screen.children_of("home") {
//!         let interpolator = transformer.interpolator_for(&screen, &node.id);
//!         for text in node.template_strings() {
//!             println!("{} -> {}", node.id, interpolator.interpolate_or_original(text));
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod condition;
pub mod context;
pub mod document;
pub mod error;
pub mod node;
pub mod outline;
pub mod parser;
pub mod prelude;
pub mod template;
pub mod transform;

pub use document::Experience;
pub use transform::{TransformedScreen, Transformer};
