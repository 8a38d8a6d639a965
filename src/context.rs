//! Runtime data scopes and key-path resolution.

use ahash::AHashMap;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Free-form information about the current user, addressed as `user.<key>`.
pub type UserInfo = AHashMap<String, Value>;

/// Query parameters of the URL that opened the experience, addressed as `url.<key>`.
pub type UrlParameters = AHashMap<String, String>;

/// The root keyword of a key-path or handlebar expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Data,
    User,
    Url,
}

impl Namespace {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "data" => Some(Namespace::Data),
            "user" => Some(Namespace::User),
            "url" => Some(Namespace::Url),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Namespace::Data => "data",
            Namespace::User => "user",
            Namespace::Url => "url",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The data visible at one point of the node tree.
///
/// `data` is the innermost scope: entering a data source or one collection item
/// produces a new context whose `data` shadows the outer one for that subtree only.
/// `user` and `url` are shared by the whole document and never shadowed. Contexts are
/// cheap `Copy` values that borrow their scopes, so the tree walk passes them down by
/// value instead of mutating a shared stack.
#[derive(Debug, Clone, Copy)]
pub struct DataContext<'a> {
    data: Option<&'a Value>,
    user: &'a UserInfo,
    url: &'a UrlParameters,
}

impl<'a> DataContext<'a> {
    /// A root context with no `data` scope.
    pub fn new(user: &'a UserInfo, url: &'a UrlParameters) -> Self {
        Self {
            data: None,
            user,
            url,
        }
    }

    /// A child context whose `data` scope is `data`.
    pub fn with_data<'b>(&self, data: &'b Value) -> DataContext<'b>
    where
        'a: 'b,
    {
        DataContext {
            data: Some(data),
            user: self.user,
            url: self.url,
        }
    }

    /// A child context with the `data` scope cleared.
    pub fn without_data(&self) -> Self {
        Self { data: None, ..*self }
    }

    pub fn data(&self) -> Option<&'a Value> {
        self.data
    }

    pub fn user(&self) -> &'a UserInfo {
        self.user
    }

    pub fn url(&self) -> &'a UrlParameters {
        self.url
    }

    /// Resolves `path` inside `namespace`. An empty path addresses the namespace root,
    /// which only exists for `data`.
    pub fn resolve<K: AsRef<str>>(&self, namespace: Namespace, path: &[K]) -> Option<Cow<'a, Value>> {
        match namespace {
            Namespace::Data => value_at_path(self.data?, path).map(Cow::Borrowed),
            Namespace::User => {
                let (first, rest) = path.split_first()?;
                let value = self.user.get(first.as_ref())?;
                value_at_path(value, rest).map(Cow::Borrowed)
            }
            Namespace::Url => match path {
                [key] => self
                    .url
                    .get(key.as_ref())
                    .map(|value| Cow::Owned(Value::String(value.clone()))),
                _ => None,
            },
        }
    }

    /// Resolves a dotted key-path whose first segment names the namespace, such as
    /// `data.author.name` or `user.firstName`.
    pub fn resolve_key_path(&self, key_path: &str) -> Option<Cow<'a, Value>> {
        let segments: Vec<&str> = key_path.trim().split('.').collect();
        let (keyword, path) = segments.split_first()?;
        let namespace = Namespace::from_keyword(keyword)?;
        self.resolve(namespace, path)
    }
}

/// Walks `path` through nested JSON objects. Any missing key, or a segment applied to
/// something other than an object, yields `None`.
pub fn value_at_path<'v, K: AsRef<str>>(root: &'v Value, path: &[K]) -> Option<&'v Value> {
    path.iter()
        .try_fold(root, |value, key| value.as_object()?.get(key.as_ref()))
}

/// Renders a resolved value the way it is substituted into text and compared by the
/// string-based predicates.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
