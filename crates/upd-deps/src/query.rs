//! Structural queries over the document tree
//!
//! A query is a sequence of steps, each selecting nodes relative to the
//! nodes selected by the previous step:
//!
//! ```text
//! query     := step+
//! step      := ('/' | '//') test predicate*
//! test      := '*' | document | object | array | member | string | number | bool | null
//! predicate := '[' ('key' | 'value') '=' operand ']' | '[' 'pos' '=' integer ']'
//! operand   := '"' text '"' | '{' name '}'
//! ```
//!
//! `/` walks to children and `//` to descendants at any depth. `key=`
//! matches members whose key equals the operand, `value=` string leaves with
//! that content, and `pos=` the 1-based position inside the parent.
//! `{name}` placeholders are bound at execution time.
//!
//! ```
//! use upd_deps::document::Document;
//! use upd_deps::query::{Bindings, Query};
//!
//! let doc = Document::parse(r#"{"dependencies": {"react": "^18.0.0"}}"#).unwrap();
//! let query = Query::compile("//member[key={section}]//member[key={module}]/*[pos=2]").unwrap();
//! let bindings = Bindings::new()
//!     .bind("section", "dependencies")
//!     .bind("module", "react");
//! let path = query.execute_one(&doc, &bindings).unwrap();
//! assert_eq!(doc.node(&path).unwrap().as_str(), Some("^18.0.0"));
//! ```

use crate::document::{Document, Node, NodeKind, NodePath};
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Values for the placeholders of a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: Vec<(String, String)>,
}

impl Bindings {
    /// No bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing an earlier binding of `name`
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(bound, _)| *bound == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    /// Value bound to `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:?}", name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Literal(String),
    Placeholder(String),
}

impl Operand {
    fn resolve<'a>(&'a self, bindings: &'a Bindings) -> Result<&'a str> {
        match self {
            Operand::Literal(text) => Ok(text.as_str()),
            Operand::Placeholder(name) => bindings
                .get(name)
                .ok_or_else(|| Error::UnboundPlaceholder(name.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Key(Operand),
    Value(Operand),
    Pos(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    kind: Option<NodeKind>,
    predicates: Vec<Predicate>,
}

/// Predicate with its operand resolved against the bindings
enum Resolved<'a> {
    Key(&'a str),
    Value(&'a str),
    Pos(usize),
}

impl Resolved<'_> {
    fn matches(&self, node: &Node, position: usize) -> bool {
        match self {
            Resolved::Key(key) => node.key() == Some(*key),
            Resolved::Value(value) => node.as_str() == Some(*value),
            Resolved::Pos(pos) => position == *pos,
        }
    }
}

/// A compiled structural query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    source: String,
    steps: Vec<Step>,
}

impl Query {
    /// Compile a query
    ///
    /// # Errors
    /// Returns [`Error::QuerySyntax`] with the byte offset of the problem
    pub fn compile(pattern: &str) -> Result<Self> {
        let steps = QueryParser {
            src: pattern,
            pos: 0,
        }
        .parse()?;
        Ok(Self {
            source: pattern.to_string(),
            steps,
        })
    }

    /// Query text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All matching nodes, in document order and without duplicates
    ///
    /// # Errors
    /// Returns [`Error::UnboundPlaceholder`] if a placeholder has no binding
    pub fn execute(&self, document: &Document, bindings: &Bindings) -> Result<Vec<NodePath>> {
        let mut steps = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let mut predicates = Vec::with_capacity(step.predicates.len());
            for predicate in &step.predicates {
                predicates.push(match predicate {
                    Predicate::Key(operand) => Resolved::Key(operand.resolve(bindings)?),
                    Predicate::Value(operand) => Resolved::Value(operand.resolve(bindings)?),
                    Predicate::Pos(pos) => Resolved::Pos(*pos),
                });
            }
            steps.push((step, predicates));
        }

        let mut context = BTreeSet::from([NodePath::root()]);
        for (step, predicates) in &steps {
            let mut selected = BTreeSet::new();
            for path in &context {
                let Some(node) = document.node(path) else {
                    continue;
                };
                select(node, path, step, predicates, &mut selected);
            }
            context = selected;
        }

        Ok(context.into_iter().collect())
    }

    /// The single matching node
    ///
    /// # Errors
    /// Returns [`Error::QueryCardinality`] if zero or several nodes match,
    /// or [`Error::UnboundPlaceholder`] if a placeholder has no binding
    pub fn execute_one(&self, document: &Document, bindings: &Bindings) -> Result<NodePath> {
        let mut matches = self.execute(document, bindings)?;
        if matches.len() != 1 {
            return Err(Error::QueryCardinality {
                bindings: bindings.to_string(),
                matches: matches.len(),
            });
        }
        Ok(matches.remove(0))
    }
}

fn select(
    node: &Node,
    path: &NodePath,
    step: &Step,
    predicates: &[Resolved<'_>],
    out: &mut BTreeSet<NodePath>,
) {
    for (index, child) in node.children().iter().enumerate() {
        let child_path = path.child(index);
        let kind_matches = step.kind.is_none_or(|kind| kind == child.kind());
        if kind_matches && predicates.iter().all(|p| p.matches(child, index + 1)) {
            out.insert(child_path.clone());
        }
        if step.axis == Axis::Descendant {
            select(child, &child_path, step, predicates, out);
        }
    }
}

struct QueryParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> QueryParser<'a> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::QuerySyntax {
            position: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(self.rest().len());
        self.pos += len;
        &self.src[start..self.pos]
    }

    fn parse(mut self) -> Result<Vec<Step>> {
        let mut steps = Vec::new();
        self.skip_whitespace();
        if self.rest().is_empty() {
            return Err(self.error("empty query"));
        }
        while !self.rest().is_empty() {
            steps.push(self.step()?);
            self.skip_whitespace();
        }
        Ok(steps)
    }

    fn step(&mut self) -> Result<Step> {
        let axis = if self.rest().starts_with("//") {
            self.pos += 2;
            Axis::Descendant
        } else if self.eat('/') {
            Axis::Child
        } else {
            return Err(self.error("expected '/' or '//'"));
        };

        self.skip_whitespace();
        let kind = if self.eat('*') {
            None
        } else {
            let start = self.pos;
            let kind = match self.identifier() {
                "document" => NodeKind::Document,
                "object" => NodeKind::Object,
                "array" => NodeKind::Array,
                "member" => NodeKind::Member,
                "string" => NodeKind::String,
                "number" => NodeKind::Number,
                "bool" => NodeKind::Bool,
                "null" => NodeKind::Null,
                "" => return Err(self.error("expected node test")),
                other => {
                    let message = format!("unknown node test '{}'", other);
                    self.pos = start;
                    return Err(self.error(message));
                }
            };
            Some(kind)
        };

        let mut predicates = Vec::new();
        loop {
            self.skip_whitespace();
            if !self.eat('[') {
                break;
            }
            predicates.push(self.predicate()?);
        }

        Ok(Step {
            axis,
            kind,
            predicates,
        })
    }

    fn predicate(&mut self) -> Result<Predicate> {
        self.skip_whitespace();
        let start = self.pos;
        let name = self.identifier();
        self.skip_whitespace();
        self.expect('=')?;
        self.eat('=');
        self.skip_whitespace();

        let predicate = match name {
            "key" => Predicate::Key(self.operand()?),
            "value" => Predicate::Value(self.operand()?),
            "pos" => {
                let digits_at = self.pos;
                let digits = self.identifier();
                match digits.parse::<usize>() {
                    Ok(pos) if pos > 0 => Predicate::Pos(pos),
                    _ => {
                        self.pos = digits_at;
                        return Err(self.error("expected positive integer position"));
                    }
                }
            }
            _ => {
                self.pos = start;
                return Err(self.error(format!("unknown predicate '{}'", name)));
            }
        };

        self.skip_whitespace();
        self.expect(']')?;
        Ok(predicate)
    }

    fn operand(&mut self) -> Result<Operand> {
        if self.eat('{') {
            let name = self.identifier().to_string();
            if name.is_empty() {
                return Err(self.error("expected placeholder name"));
            }
            self.expect('}')?;
            return Ok(Operand::Placeholder(name));
        }

        if !self.eat('"') {
            return Err(self.error("expected quoted literal or {placeholder}"));
        }
        let mut text = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.pos += 1;
                    return Ok(Operand::Literal(text));
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) => {
                            text.push(c);
                            self.pos += c.len_utf8();
                        }
                        None => return Err(self.error("unterminated literal")),
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.pos += c.len_utf8();
                }
                None => return Err(self.error("unterminated literal")),
            }
        }
    }
}
