//! Common test utilities for building experiences and runtime data.
use serde_json::Value;
use tenkai::prelude::*;

#[allow(dead_code)]
pub fn screen(id: &str, children: &[&str]) -> Node {
    Node::new(id, NodeKind::Screen(Screen::default())).with_children(children.iter().copied())
}

#[allow(dead_code)]
pub fn vstack(id: &str, children: &[&str]) -> Node {
    Node::new(id, NodeKind::VStack(Default::default())).with_children(children.iter().copied())
}

#[allow(dead_code)]
pub fn rect(id: &str) -> Node {
    Node::new(id, NodeKind::Rectangle)
}

#[allow(dead_code)]
pub fn text(id: &str, text: &str) -> Node {
    Node::new(id, NodeKind::text(text))
}

#[allow(dead_code)]
pub fn data_source(id: &str, children: &[&str]) -> Node {
    Node::new(id, NodeKind::data_source(format!("https://example.com/{id}")))
        .with_children(children.iter().copied())
}

#[allow(dead_code)]
pub fn conditional(id: &str, conditions: Vec<Condition>, children: &[&str]) -> Node {
    Node::new(id, NodeKind::conditional(conditions)).with_children(children.iter().copied())
}

#[allow(dead_code)]
pub fn collection(id: &str, children: &[&str]) -> Node {
    Node::new(id, NodeKind::collection("data.items")).with_children(children.iter().copied())
}

#[allow(dead_code)]
pub fn experience(nodes: Vec<Node>) -> Experience {
    Experience::new(nodes).expect("Failed to build experience")
}

/// `n` distinct item objects `{ "index": i }`.
#[allow(dead_code)]
pub fn items(n: usize) -> Vec<Value> {
    (0..n).map(|i| serde_json::json!({ "index": i })).collect()
}

#[allow(dead_code)]
pub fn child_ids<'s>(screen: &'s TransformedScreen, id: &str) -> Vec<&'s str> {
    screen
        .node(id)
        .map(|node| node.child_ids.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

#[allow(dead_code)]
pub fn user_info(entries: &[(&str, Value)]) -> UserInfo {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[allow(dead_code)]
pub fn url_parameters(entries: &[(&str, &str)]) -> UrlParameters {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// A small experience document in its JSON form: a header, a product list filtered on
/// stock, and a premium-only banner.
#[allow(dead_code)]
pub const SHOP_EXPERIENCE_JSON: &str = r##"{
  "initialScreenID": "shop",
  "nodes": [
    {
      "__typeName": "Screen",
      "id": "shop",
      "name": "Shop",
      "childIDs": ["header", "catalog", "premium"],
      "statusBarStyle": "light",
      "backgroundColor": { "default": "#FFFFFF" }
    },
    { "__typeName": "Text", "id": "header", "text": "Hi {{ user.firstName }}", "font": { "size": 20 } },
    { "__typeName": "DataSource", "id": "catalog", "url": "https://example.com/products", "httpMethod": "GET", "headers": [], "childIDs": ["products"] },
    {
      "__typeName": "Collection",
      "id": "products",
      "keyPath": "data.products",
      "filters": [{ "keyPath": "data.stock", "predicate": "isGreaterThan", "value": 0 }],
      "sortDescriptors": [{ "keyPath": "data.price", "ascending": true }],
      "limit": { "show": 2, "startAt": 1 },
      "childIDs": ["card"]
    },
    { "__typeName": "HStack", "id": "card", "spacing": 8, "childIDs": ["name", "price"] },
    { "__typeName": "Text", "id": "name", "text": "{{ uppercase data.name }}" },
    { "__typeName": "Text", "id": "price", "text": "{{ data.price }} EUR" },
    {
      "__typeName": "Conditional",
      "id": "premium",
      "conditions": [{ "keyPath": "user.isPremium", "predicate": "isTrue" }],
      "childIDs": ["banner"]
    },
    { "__typeName": "Image", "id": "banner", "url": "https://example.com/banner.png?ref={{ url.ref }}" }
  ]
}"##;

#[allow(dead_code)]
pub const SHOP_CONTEXT_JSON: &str = r#"{
  "payloads": {
    "catalog": {
      "products": [
        { "name": "lamp", "price": 40, "stock": 3 },
        { "name": "chair", "price": 25, "stock": 0 },
        { "name": "desk", "price": 120, "stock": 1 },
        { "name": "mug", "price": 8, "stock": 12 }
      ]
    }
  },
  "items": {},
  "user": { "firstName": "Ada", "isPremium": "TRUE" },
  "url": { "ref": "newsletter" }
}"#;
