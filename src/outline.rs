use crate::context::stringify;
use crate::node::{Node, NodeKind};
use crate::transform::TransformedScreen;
use serde_json::Value;

/// Formats transformed screens into an indented, human-readable outline.
pub struct OutlineFormatter;

impl OutlineFormatter {
    /// One line per node, children indented under their parent.
    pub fn format_screen(screen: &TransformedScreen) -> String {
        let mut result = String::new();
        if let Some(root) = screen.screen() {
            Self::format_recursive(screen, root, 0, &mut result);
        }
        result
    }

    fn format_recursive(screen: &TransformedScreen, node: &Node, depth: usize, result: &mut String) {
        result.push_str(&"  ".repeat(depth));
        result.push_str(&format!("{} '{}'", node.type_name(), node.id));
        if let Some(name) = &node.name {
            result.push_str(&format!(" [{}]", name));
        }
        if let Some(summary) = Self::summary(node) {
            result.push_str(&format!(": {}", summary));
        }
        if let Some(data) = screen.data_for(&node.id) {
            result.push_str(&format!(" (data: {})", Self::format_value(data)));
        }
        result.push('\n');

        for child in screen.children_of(&node.id) {
            Self::format_recursive(screen, child, depth + 1, result);
        }
    }

    fn summary(node: &Node) -> Option<String> {
        match &node.kind {
            NodeKind::Text(text) => Some(format!("{:?}", text.text)),
            NodeKind::Image(image) => image.url.as_ref().map(|url| format!("{:?}", url)),
            NodeKind::Audio(media) | NodeKind::Video(media) => {
                Some(format!("{:?}", media.source_url))
            }
            NodeKind::WebView(web_view) => Some(format!("{:?}", web_view.url)),
            NodeKind::NamedIcon(icon) => Some(icon.symbol_name.clone()),
            _ => None,
        }
    }

    /// Scalars print as themselves, containers by their size only.
    fn format_value(value: &Value) -> String {
        match value {
            Value::Array(items) => format!("[{} items]", items.len()),
            Value::Object(fields) => format!("{{{} fields}}", fields.len()),
            scalar => stringify(scalar),
        }
    }
}
