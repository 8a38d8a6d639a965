use crate::condition::all_satisfied;
use crate::context::DataContext;
use crate::node::{Collection, SortDescriptor};
use crate::template::FunctionRegistry;
use itertools::Itertools;
use serde_json::Value;
use std::cmp::Ordering;

/// Resolves a collection's items from its key-path in `context`, then applies its
/// filters, sort descriptors and limit, in that order.
///
/// A key-path that does not resolve to an array yields no items.
pub fn resolve_items(
    collection: &Collection,
    context: &DataContext<'_>,
    functions: &FunctionRegistry,
) -> Vec<Value> {
    let Some(resolved) = context.resolve_key_path(&collection.key_path) else {
        return Vec::new();
    };
    let Some(array) = resolved.as_array() else {
        return Vec::new();
    };

    let filtered = array
        .iter()
        .filter(|item| all_satisfied(&collection.filters, &context.with_data(item), functions));

    let sorted: Vec<&Value> = if collection.sort_descriptors.is_empty() {
        filtered.collect()
    } else {
        filtered
            .sorted_by(|a, b| compare_items(&collection.sort_descriptors, a, b, context))
            .collect()
    };

    let limited: Vec<&Value> = match collection.limit {
        Some(limit) => sorted
            .into_iter()
            .skip(limit.start_at.saturating_sub(1))
            .take(limit.show)
            .collect(),
        None => sorted,
    };

    limited.into_iter().cloned().collect()
}

impl Collection {
    /// See [`resolve_items`].
    pub fn resolve_items(&self, context: &DataContext<'_>, functions: &FunctionRegistry) -> Vec<Value> {
        resolve_items(self, context, functions)
    }
}

fn compare_items(
    descriptors: &[SortDescriptor],
    a: &Value,
    b: &Value,
    context: &DataContext<'_>,
) -> Ordering {
    descriptors
        .iter()
        .map(|descriptor| compare_by(descriptor, a, b, context))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Numbers compare numerically and strings lexically. Items missing the key sort after
/// items that have it, whichever the direction.
fn compare_by(descriptor: &SortDescriptor, a: &Value, b: &Value, context: &DataContext<'_>) -> Ordering {
    let left = context.with_data(a).resolve_key_path(&descriptor.key_path);
    let right = context.with_data(b).resolve_key_path(&descriptor.key_path);
    let ordering = match (left.as_deref(), right.as_deref()) {
        (Some(Value::Number(l)), Some(Value::Number(r))) => l
            .as_f64()
            .partial_cmp(&r.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(l)), Some(Value::String(r))) => l.cmp(r),
        (Some(Value::Bool(l)), Some(Value::Bool(r))) => l.cmp(r),
        (Some(Value::Null) | None, Some(Value::Null) | None) => return Ordering::Equal,
        (Some(Value::Null) | None, Some(_)) => return Ordering::Greater,
        (Some(_), Some(Value::Null) | None) => return Ordering::Less,
        _ => Ordering::Equal,
    };
    if descriptor.ascending {
        ordering
    } else {
        ordering.reverse()
    }
}
