//! The author-time node graph of an experience.

use crate::condition::Condition;
use crate::error::DocumentError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Free-form annotations an author can attach to any node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// One element of the experience graph.
///
/// Nodes reference their children by ID only. `attributes` keeps every JSON field the
/// node kind does not model itself (frames, colours, fonts, ...), untouched, so that the
/// render stage receives them with the transformed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    pub id: String,
    pub name: Option<String>,
    pub metadata: Option<Metadata>,
    pub child_ids: Vec<String>,
    pub kind: NodeKind,
    pub attributes: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: None,
            metadata: None,
            child_ids: Vec::new(),
            kind,
            attributes: Map::new(),
        }
    }

    pub fn with_children<I, S>(mut self, child_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_ids = child_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn is_transparent(&self) -> bool {
        self.kind.is_transparent()
    }

    /// The ordered child IDs. Always empty for node kinds that cannot have children.
    pub fn children(&self) -> &[String] {
        if self.is_container() {
            &self.child_ids
        } else {
            &[]
        }
    }

    /// Author strings of this node that may contain handlebar expressions.
    pub fn template_strings(&self) -> Vec<&str> {
        let mut strings = Vec::new();
        match &self.kind {
            NodeKind::Text(text) => strings.push(text.text.as_str()),
            NodeKind::Image(image) => {
                strings.extend(image.url.as_deref());
                strings.extend(image.dark_mode_url.as_deref());
                strings.extend(image.accessibility_label.as_deref());
            }
            NodeKind::Audio(media) | NodeKind::Video(media) => {
                strings.push(media.source_url.as_str());
                strings.extend(media.poster_image_url.as_deref());
            }
            NodeKind::WebView(web_view) => strings.push(web_view.url.as_str()),
            NodeKind::DataSource(data_source) => {
                strings.push(data_source.url.as_str());
                strings.extend(
                    data_source
                        .headers
                        .iter()
                        .map(|header| header.value.as_str()),
                );
                strings.extend(data_source.http_body.as_deref());
            }
            _ => {}
        }
        strings
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Screen(Screen),
    VStack(Stack),
    HStack(Stack),
    ZStack(Stack),
    ScrollContainer(ScrollContainer),
    Carousel(Carousel),
    Text(Text),
    Rectangle,
    Image(Image),
    Audio(Media),
    Video(Media),
    Spacer,
    Divider,
    WebView(WebView),
    PageControl(PageControl),
    NamedIcon(NamedIcon),
    DataSource(DataSource),
    Conditional(Conditional),
    Collection(Collection),
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Screen(_) => "Screen",
            NodeKind::VStack(_) => "VStack",
            NodeKind::HStack(_) => "HStack",
            NodeKind::ZStack(_) => "ZStack",
            NodeKind::ScrollContainer(_) => "ScrollContainer",
            NodeKind::Carousel(_) => "Carousel",
            NodeKind::Text(_) => "Text",
            NodeKind::Rectangle => "Rectangle",
            NodeKind::Image(_) => "Image",
            NodeKind::Audio(_) => "Audio",
            NodeKind::Video(_) => "Video",
            NodeKind::Spacer => "Spacer",
            NodeKind::Divider => "Divider",
            NodeKind::WebView(_) => "WebView",
            NodeKind::PageControl(_) => "PageControl",
            NodeKind::NamedIcon(_) => "NamedIcon",
            NodeKind::DataSource(_) => "DataSource",
            NodeKind::Conditional(_) => "Conditional",
            NodeKind::Collection(_) => "Collection",
        }
    }

    /// Whether nodes of this kind list `childIDs`.
    pub fn is_container(&self) -> bool {
        match self {
            NodeKind::Screen(_)
            | NodeKind::VStack(_)
            | NodeKind::HStack(_)
            | NodeKind::ZStack(_)
            | NodeKind::ScrollContainer(_)
            | NodeKind::Carousel(_)
            | NodeKind::DataSource(_)
            | NodeKind::Conditional(_)
            | NodeKind::Collection(_) => true,
            NodeKind::Text(_)
            | NodeKind::Rectangle
            | NodeKind::Image(_)
            | NodeKind::Audio(_)
            | NodeKind::Video(_)
            | NodeKind::Spacer
            | NodeKind::Divider
            | NodeKind::WebView(_)
            | NodeKind::PageControl(_)
            | NodeKind::NamedIcon(_) => false,
        }
    }

    /// Whether nodes of this kind are replaced by their children during transformation.
    pub fn is_transparent(&self) -> bool {
        matches!(
            self,
            NodeKind::DataSource(_) | NodeKind::Conditional(_) | NodeKind::Collection(_)
        )
    }

    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text(Text { text: text.into() })
    }

    pub fn conditional(conditions: Vec<Condition>) -> Self {
        NodeKind::Conditional(Conditional { conditions })
    }

    pub fn collection(key_path: impl Into<String>) -> Self {
        NodeKind::Collection(Collection {
            key_path: key_path.into(),
            ..Collection::default()
        })
    }

    pub fn data_source(url: impl Into<String>) -> Self {
        NodeKind::DataSource(DataSource {
            url: url.into(),
            ..DataSource::default()
        })
    }

    fn from_attributes(
        node_id: &str,
        type_name: &str,
        attributes: &Map<String, Value>,
    ) -> Result<Self, DocumentError> {
        fn parse<T: DeserializeOwned>(
            node_id: &str,
            attributes: &Map<String, Value>,
        ) -> Result<T, DocumentError> {
            serde_json::from_value(Value::Object(attributes.clone())).map_err(|e| {
                DocumentError::InvalidNode {
                    node_id: node_id.to_string(),
                    message: e.to_string(),
                }
            })
        }

        let kind = match type_name {
            "Screen" => NodeKind::Screen(parse(node_id, attributes)?),
            "VStack" => NodeKind::VStack(parse(node_id, attributes)?),
            "HStack" => NodeKind::HStack(parse(node_id, attributes)?),
            "ZStack" => NodeKind::ZStack(parse(node_id, attributes)?),
            "ScrollContainer" => NodeKind::ScrollContainer(parse(node_id, attributes)?),
            "Carousel" => NodeKind::Carousel(parse(node_id, attributes)?),
            "Text" => NodeKind::Text(parse(node_id, attributes)?),
            "Rectangle" => NodeKind::Rectangle,
            "Image" => NodeKind::Image(parse(node_id, attributes)?),
            "Audio" => NodeKind::Audio(parse(node_id, attributes)?),
            "Video" => NodeKind::Video(parse(node_id, attributes)?),
            "Spacer" => NodeKind::Spacer,
            "Divider" => NodeKind::Divider,
            "WebView" => NodeKind::WebView(parse(node_id, attributes)?),
            "PageControl" => NodeKind::PageControl(parse(node_id, attributes)?),
            "NamedIcon" => NodeKind::NamedIcon(parse(node_id, attributes)?),
            "DataSource" => NodeKind::DataSource(parse(node_id, attributes)?),
            "Conditional" => NodeKind::Conditional(parse(node_id, attributes)?),
            "Collection" => NodeKind::Collection(parse(node_id, attributes)?),
            _ => {
                return Err(DocumentError::UnknownNodeType {
                    node_id: node_id.to_string(),
                    type_name: type_name.to_string(),
                });
            }
        };
        Ok(kind)
    }

    fn to_attributes(&self) -> Map<String, Value> {
        let value = match self {
            NodeKind::Screen(inner) => serde_json::to_value(inner),
            NodeKind::VStack(inner) | NodeKind::HStack(inner) | NodeKind::ZStack(inner) => {
                serde_json::to_value(inner)
            }
            NodeKind::ScrollContainer(inner) => serde_json::to_value(inner),
            NodeKind::Carousel(inner) => serde_json::to_value(inner),
            NodeKind::Text(inner) => serde_json::to_value(inner),
            NodeKind::Image(inner) => serde_json::to_value(inner),
            NodeKind::Audio(inner) | NodeKind::Video(inner) => serde_json::to_value(inner),
            NodeKind::WebView(inner) => serde_json::to_value(inner),
            NodeKind::PageControl(inner) => serde_json::to_value(inner),
            NodeKind::NamedIcon(inner) => serde_json::to_value(inner),
            NodeKind::DataSource(inner) => serde_json::to_value(inner),
            NodeKind::Conditional(inner) => serde_json::to_value(inner),
            NodeKind::Collection(inner) => serde_json::to_value(inner),
            NodeKind::Rectangle | NodeKind::Spacer | NodeKind::Divider => Ok(Value::Null),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_bar_style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    #[serde(default)]
    pub spacing: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollContainer {
    #[serde(default)]
    pub axis: Axis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carousel {
    #[serde(default)]
    pub is_loop_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Text {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_label: Option<String>,
}

/// Shared by audio and video nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default)]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_image_url: Option<String>,
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default)]
    pub looping: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebView {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageControl {
    #[serde(default, rename = "carouselID", skip_serializing_if = "Option::is_none")]
    pub carousel_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedIcon {
    #[serde(default)]
    pub symbol_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub key: String,
    pub value: String,
}

/// Fetch parameters of a data source. Fetching itself happens outside this crate; the
/// transformer only receives the resulting payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub http_method: HttpMethod,
    #[serde(default)]
    pub headers: Vec<HttpHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_body: Option<String>,
    /// Refresh interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortDescriptor {
    pub key_path: String,
    #[serde(default = "ascending_by_default")]
    pub ascending: bool,
}

fn ascending_by_default() -> bool {
    true
}

/// Pagination of collection items. `start_at` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limit {
    pub show: usize,
    #[serde(default = "first_item")]
    pub start_at: usize,
}

fn first_item() -> usize {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default)]
    pub key_path: String,
    #[serde(default)]
    pub filters: Vec<Condition>,
    #[serde(default)]
    pub sort_descriptors: Vec<SortDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
}

/// The JSON shape of a node: a `__typeName` tag, the common fields, and the kind's own
/// fields alongside any render attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "__typeName")]
    pub type_name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(rename = "childIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub child_ids: Vec<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl TryFrom<RawNode> for Node {
    type Error = DocumentError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let kind = NodeKind::from_attributes(&raw.id, &raw.type_name, &raw.attributes)?;
        let mut attributes = raw.attributes;
        for modelled in kind.to_attributes().keys() {
            attributes.remove(modelled);
        }
        Ok(Node {
            id: raw.id,
            name: raw.name,
            metadata: raw.metadata,
            child_ids: raw.child_ids,
            kind,
            attributes,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let mut attributes = node.attributes;
        attributes.extend(node.kind.to_attributes());
        RawNode {
            type_name: node.kind.type_name().to_string(),
            id: node.id,
            name: node.name,
            metadata: node.metadata,
            child_ids: node.child_ids,
            attributes,
        }
    }
}
