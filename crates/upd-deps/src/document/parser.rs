//! Recursive-descent parser producing the lossless tree

use super::{Node, NodeKind, Scalar};
use crate::error::{Error, Result};

const MAX_DEPTH: usize = 512;
const BOM: char = '\u{feff}';

pub(super) fn parse(src: &str) -> Result<Node> {
    let mut parser = Parser { src, pos: 0 };

    let mut leading = String::new();
    if src.starts_with(BOM) {
        leading.push(BOM);
        parser.pos = BOM.len_utf8();
    }
    leading.push_str(&parser.trivia()?);

    let value = parser.value(0)?;
    let trailing = parser.trivia()?;
    if parser.pos < src.len() {
        return Err(parser.error("unexpected content after the document value"));
    }

    Ok(Node::container(
        NodeKind::Document,
        vec![value],
        vec![leading, trailing],
    ))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> Error {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> Error {
        let before = &self.src[..offset.min(self.src.len())];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    fn unexpected(&self) -> Error {
        match self.rest().chars().next() {
            Some(c) => self.error(format!("unexpected character {:?}", c)),
            None => self.error("unexpected end of input"),
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Whitespace and comments
    fn trivia(&mut self) -> Result<String> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.pos += 1,
                Some(b'/') if self.rest().starts_with("//") => {
                    self.pos += self.rest().find('\n').unwrap_or(self.rest().len());
                }
                Some(b'/') if self.rest().starts_with("/*") => match self.rest()[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => return Err(self.error("unterminated block comment")),
                },
                _ => break,
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn value(&mut self, depth: usize) -> Result<Node> {
        if depth > MAX_DEPTH {
            return Err(self.error("document nested too deeply"));
        }
        match self.peek() {
            Some(b'{') => self.object(depth),
            Some(b'[') => self.array(depth),
            Some(b'"') => self.string(),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(b't') => self.literal("true", Scalar::Bool(true)),
            Some(b'f') => self.literal("false", Scalar::Bool(false)),
            Some(b'n') => self.literal("null", Scalar::Null),
            _ => Err(self.unexpected()),
        }
    }

    fn object(&mut self, depth: usize) -> Result<Node> {
        self.expect(b'{')?;
        let mut children = Vec::new();
        let mut trivia = vec![self.trivia()?];

        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Node::container(NodeKind::Object, children, trivia));
        }

        loop {
            children.push(self.member(depth)?);
            let mut between = self.trivia()?;
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    between.push(',');
                    between.push_str(&self.trivia()?);
                    trivia.push(between);
                }
                Some(b'}') => {
                    self.pos += 1;
                    trivia.push(between);
                    return Ok(Node::container(NodeKind::Object, children, trivia));
                }
                _ => return Err(self.error("expected ',' or '}' after object member")),
            }
        }
    }

    fn member(&mut self, depth: usize) -> Result<Node> {
        if self.peek() != Some(b'"') {
            return Err(self.error("expected string key"));
        }
        let key = self.string()?;

        let mut separator = self.trivia()?;
        if self.peek() != Some(b':') {
            return Err(self.error("expected ':' after object key"));
        }
        self.pos += 1;
        separator.push(':');
        separator.push_str(&self.trivia()?);

        let value = self.value(depth + 1)?;
        Ok(Node::container(
            NodeKind::Member,
            vec![key, value],
            vec![String::new(), separator, String::new()],
        ))
    }

    fn array(&mut self, depth: usize) -> Result<Node> {
        self.expect(b'[')?;
        let mut children = Vec::new();
        let mut trivia = vec![self.trivia()?];

        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Node::container(NodeKind::Array, children, trivia));
        }

        loop {
            children.push(self.value(depth + 1)?);
            let mut between = self.trivia()?;
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    between.push(',');
                    between.push_str(&self.trivia()?);
                    trivia.push(between);
                }
                Some(b']') => {
                    self.pos += 1;
                    trivia.push(between);
                    return Ok(Node::container(NodeKind::Array, children, trivia));
                }
                _ => return Err(self.error("expected ',' or ']' after array element")),
            }
        }
    }

    fn string(&mut self) -> Result<Node> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => self.pos += 2,
                Some(byte) if byte < 0x20 => {
                    return Err(self.error("control character in string"));
                }
                Some(_) => self.pos += 1,
                None => return Err(self.error_at(start, "unterminated string")),
            }
        }

        let raw = &self.src[start..self.pos];
        let decoded: String = serde_json::from_str(raw)
            .map_err(|e| self.error_at(start, format!("invalid string literal: {}", e)))?;
        Ok(Node::leaf(raw.to_string(), Scalar::String(decoded)))
    }

    fn number(&mut self) -> Result<Node> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.digits(),
            _ => return Err(self.error("expected digit")),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("expected digit after decimal point"));
            }
            self.digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("expected digit in exponent"));
            }
            self.digits();
        }

        let raw = self.src[start..self.pos].to_string();
        Ok(Node::leaf(raw.clone(), Scalar::Number(raw)))
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn literal(&mut self, word: &'static str, value: Scalar) -> Result<Node> {
        if !self.rest().starts_with(word) {
            return Err(self.unexpected());
        }
        self.pos += word.len();
        Ok(Node::leaf(word.to_string(), value))
    }
}
