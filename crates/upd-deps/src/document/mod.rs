//! Lossless JSON document model
//!
//! The tree keeps every byte of its source: containers store the raw text
//! between their children (whitespace, commas, colons, comments) and leaves
//! store their original token. Serializing an untouched tree reproduces the
//! input exactly, and replacing one leaf changes only that leaf's span.
//!
//! ```
//! use upd_deps::document::{Document, NodePath};
//!
//! let mut doc = Document::parse("{ \"a\" : 1 }").unwrap();
//! // document -> object -> first member -> value
//! let path = NodePath::from(vec![0, 0, 1]);
//! doc.node_mut(&path).unwrap().set_string("two").unwrap();
//! assert_eq!(doc.serialize(), "{ \"a\" : \"two\" }");
//! ```

mod parser;

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of a document node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The whole document: leading trivia, one value, trailing trivia
    Document,
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
    /// `"key": value` inside an object; children are the key and the value
    Member,
    /// String literal
    String,
    /// Number literal
    Number,
    /// `true` or `false`
    Bool,
    /// `null`
    Null,
}

impl NodeKind {
    /// Name used by the query language
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Member => "member",
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Bool => "bool",
            NodeKind::Null => "null",
        }
    }

    /// Whether nodes of this kind have children
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::Object | NodeKind::Array | NodeKind::Member
        )
    }

    fn delimiters(&self) -> (&'static str, &'static str) {
        match self {
            NodeKind::Object => ("{", "}"),
            NodeKind::Array => ("[", "]"),
            _ => ("", ""),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded value of a leaf node
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Unescaped string contents
    String(String),
    /// Number token text
    Number(String),
    /// Boolean
    Bool(bool),
    /// Null
    Null,
}

impl Scalar {
    fn kind(&self) -> NodeKind {
        match self {
            Scalar::String(_) => NodeKind::String,
            Scalar::Number(_) => NodeKind::Number,
            Scalar::Bool(_) => NodeKind::Bool,
            Scalar::Null => NodeKind::Null,
        }
    }
}

/// A node of the document tree
///
/// Containers hold `children.len() + 1` trivia segments; the serialized form
/// is `open + trivia[0] + child[0] + trivia[1] + ... + trivia[n] + close`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    raw: String,
    value: Option<Scalar>,
    children: Vec<Node>,
    trivia: Vec<String>,
}

impl Node {
    pub(crate) fn leaf(raw: String, value: Scalar) -> Self {
        Self {
            kind: value.kind(),
            raw,
            value: Some(value),
            children: Vec::new(),
            trivia: Vec::new(),
        }
    }

    pub(crate) fn container(kind: NodeKind, children: Vec<Node>, trivia: Vec<String>) -> Self {
        debug_assert!(kind.is_container());
        debug_assert_eq!(trivia.len(), children.len() + 1);
        Self {
            kind,
            raw: String::new(),
            value: None,
            children,
            trivia,
        }
    }

    /// Kind of this node
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Child nodes (empty for leaves)
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Original token text of a leaf (empty for containers)
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Decoded value of a leaf
    pub fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }

    /// Decoded contents of a string leaf
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Some(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Key of a member node
    pub fn key(&self) -> Option<&str> {
        if self.kind != NodeKind::Member {
            return None;
        }
        self.children.first().and_then(Node::as_str)
    }

    /// Replace the token text and decoded value of a leaf
    ///
    /// The caller is responsible for `raw` being valid JSON for `value`.
    ///
    /// # Errors
    /// Returns [`Error::NotALeaf`] if this node is a container
    pub fn set_leaf_value(&mut self, raw: impl Into<String>, value: Scalar) -> Result<()> {
        if self.kind.is_container() {
            return Err(Error::NotALeaf(self.kind.as_str()));
        }
        self.kind = value.kind();
        self.raw = raw.into();
        self.value = Some(value);
        Ok(())
    }

    /// Replace a leaf with a string, escaped as a JSON serializer would
    ///
    /// # Errors
    /// Returns [`Error::NotALeaf`] if this node is a container
    pub fn set_string(&mut self, value: &str) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_leaf_value(raw, Scalar::String(value.to_string()))
    }

    fn write_to(&self, out: &mut String) {
        if !self.kind.is_container() {
            out.push_str(&self.raw);
            return;
        }

        let (open, close) = self.kind.delimiters();
        out.push_str(open);
        for (trivia, child) in self.trivia.iter().zip(&self.children) {
            out.push_str(trivia);
            child.write_to(out);
        }
        if let Some(last) = self.trivia.last() {
            out.push_str(last);
        }
        out.push_str(close);
    }

    fn to_value(&self) -> Value {
        match self.kind {
            NodeKind::Document | NodeKind::Member => self
                .children
                .last()
                .map(Node::to_value)
                .unwrap_or(Value::Null),
            NodeKind::Object => {
                let mut map = Map::new();
                for member in &self.children {
                    if let (Some(key), Some(value)) = (member.key(), member.children.get(1)) {
                        map.insert(key.to_string(), value.to_value());
                    }
                }
                Value::Object(map)
            }
            NodeKind::Array => Value::Array(self.children.iter().map(Node::to_value).collect()),
            NodeKind::String | NodeKind::Number | NodeKind::Bool | NodeKind::Null => {
                match &self.value {
                    Some(Scalar::String(s)) => Value::String(s.clone()),
                    Some(Scalar::Number(n)) => serde_json::from_str(n).unwrap_or(Value::Null),
                    Some(Scalar::Bool(b)) => Value::Bool(*b),
                    Some(Scalar::Null) | None => Value::Null,
                }
            }
        }
    }
}

/// Address of a node: child indices walked from the document node
///
/// Paths order like the nodes they address appear in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The document node itself
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th child of this node
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Child indices from the root
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}

/// A parsed manifest that can be edited and re-emitted byte for byte
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Parse JSON text; `//` and `/* */` comments are accepted wherever
    /// whitespace is
    ///
    /// # Errors
    /// Returns [`Error::Parse`] with the 1-based line and column of the first
    /// syntax error
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            root: parser::parse(text)?,
        })
    }

    /// The document node
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Node at `path`
    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        path.indices()
            .iter()
            .try_fold(&self.root, |node, &index| node.children.get(index))
    }

    /// Mutable node at `path`
    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        path.indices()
            .iter()
            .try_fold(&mut self.root, |node, &index| node.children.get_mut(index))
    }

    /// Replace the string leaf at `path`
    ///
    /// # Errors
    /// Returns an error if `path` addresses no node or a container
    pub fn set_string(&mut self, path: &NodePath, value: &str) -> Result<()> {
        self.node_mut(path)
            .ok_or_else(|| Error::InvalidNodePath(path.to_string()))?
            .set_string(value)
    }

    /// Re-emit the document text
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.root.write_to(&mut out);
        out
    }

    /// Semantic value of the document
    ///
    /// Later duplicate keys win, as with `serde_json`.
    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}


#[cfg(feature = "property-tests")]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ._~^@/\\-\"\\\\\u{e9}]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("[a-z@/\\-]{0,8}", inner), 0..6)
                    .prop_map(|members| Value::Object(members.into_iter().collect())),
            ]
        })
    }

    /// Byte span of every string leaf (keys included), in document order
    fn string_spans(
        node: &Node,
        path: NodePath,
        offset: &mut usize,
        spans: &mut Vec<(NodePath, usize, usize)>,
    ) {
        if !node.kind.is_container() {
            let start = *offset;
            *offset += node.raw.len();
            if node.kind == NodeKind::String {
                spans.push((path, start, *offset));
            }
            return;
        }

        let (open, close) = node.kind.delimiters();
        *offset += open.len();
        for (index, (trivia, child)) in node.trivia.iter().zip(&node.children).enumerate() {
            *offset += trivia.len();
            string_spans(child, path.child(index), offset, spans);
        }
        if let Some(last) = node.trivia.last() {
            *offset += last.len();
        }
        *offset += close.len();
    }

    fn render(value: &Value, pretty: bool) -> String {
        if pretty {
            serde_json::to_string_pretty(value).unwrap()
        } else {
            serde_json::to_string(value).unwrap()
        }
    }

    proptest! {
        /// Property: replacing one string leaf rewrites exactly that leaf's
        /// bytes; everything before and after it is unchanged
        #[test]
        fn set_string_touches_only_its_span(
            value in json_value(),
            pretty in any::<bool>(),
            pick in any::<prop::sample::Index>(),
            replacement in "[a-zA-Z0-9 ._~^@/\\-\"\\\\\u{e9}\u{1F600}]{0,12}",
        ) {
            let text = render(&value, pretty);
            let mut doc = Document::parse(&text).unwrap();

            let mut spans = Vec::new();
            string_spans(doc.root(), NodePath::root(), &mut 0, &mut spans);
            prop_assume!(!spans.is_empty());
            let (path, start, end) = pick.get(&spans).clone();

            doc.set_string(&path, &replacement).unwrap();
            let output = doc.serialize();
            let encoded = serde_json::to_string(&replacement).unwrap();
            let suffix = text.len() - end;

            prop_assert_eq!(output.len(), start + encoded.len() + suffix);
            prop_assert_eq!(&output[..start], &text[..start]);
            prop_assert_eq!(&output[start..start + encoded.len()], encoded.as_str());
            prop_assert_eq!(&output[start + encoded.len()..], &text[end..]);
        }

        /// Property: an untouched tree re-emits its source byte for byte
        #[test]
        fn round_trip_is_identity(value in json_value(), pretty in any::<bool>()) {
            let text = render(&value, pretty);
            let doc = Document::parse(&text).unwrap();
            prop_assert_eq!(doc.serialize(), text);
            prop_assert_eq!(doc.to_value(), value);
        }
    }
}
