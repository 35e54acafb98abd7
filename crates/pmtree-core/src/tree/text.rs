//! Canonical text form and identity-free shapes.
//!
//! ```text
//! tree  := node
//! node  := KEYWORD '(' [ node { ',' node } ] ')'
//!        | label
//! label := any text without '(' ')' ','   (trimmed)
//! ```
//!
//! Operator nodes print their keyword, TASK nodes print their label.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::node::{Node, NodeIndex, Operator};
use super::{Tree, TreeError};

/// Identity-free view of a subtree: the input to structural hashing and
/// structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Shape {
    Task(String),
    Op(Operator, Vec<Shape>),
}

impl Shape {
    /// Shape of the subtree at `idx`. Nodes reached twice (aliasing) are
    /// cut off so a malformed tree still yields a finite shape.
    pub(crate) fn of(tree: &Tree, idx: NodeIndex) -> Option<Shape> {
        let mut seen = vec![false; tree.slots.len()];
        Self::build(tree, idx, &mut seen)
    }

    fn build(tree: &Tree, idx: NodeIndex, seen: &mut [bool]) -> Option<Shape> {
        let node = tree.node(idx)?;
        if std::mem::replace(&mut seen[idx.0], true) {
            return None;
        }
        if node.operator.is_task() {
            return Some(Shape::Task(node.label.clone()));
        }
        let children = node
            .children
            .iter()
            .filter_map(|&c| Self::build(tree, c, seen))
            .collect();
        Some(Shape::Op(node.operator, children))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Task(label) => f.write_str(label),
            Shape::Op(op, children) => {
                write!(f, "{op}(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape() {
            Some(shape) => write!(f, "{shape}"),
            None => Ok(()),
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    tree: Tree,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> TreeError {
        TreeError::Parse {
            position: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn token(&mut self) -> &'a str {
        let src = self.src;
        let rest = &src[self.pos..];
        let end = rest.find(&['(', ')', ','][..]).unwrap_or(rest.len());
        self.pos += end;
        rest[..end].trim()
    }

    fn node(&mut self) -> Result<NodeIndex, TreeError> {
        self.skip_ws();
        let start = self.pos;
        let token = self.token();
        if token.is_empty() {
            self.pos = start;
            return Err(self.error("expected a task label or operator"));
        }
        if self.peek() != Some('(') {
            return Ok(self.tree.add_node(Node::task(token)));
        }

        let op: Operator = token.parse().map_err(|e| {
            TreeError::Parse {
                position: start,
                message: format!("{e}"),
            }
        })?;
        if op.is_task() {
            return Err(TreeError::Parse {
                position: start,
                message: "TASK is written as a bare label".into(),
            });
        }
        self.pos += 1;
        let idx = self.tree.add_node(Node::operator(op));

        self.skip_ws();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(idx);
        }
        loop {
            let child = self.node()?;
            self.tree.push_child(idx, child)?;
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => {
                    self.pos += 1;
                    return Ok(idx);
                }
                _ => return Err(self.error("expected ',' or ')'")),
            }
        }
    }
}

impl FromStr for Tree {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            src: s,
            pos: 0,
            tree: Tree::new(),
        };
        parser.skip_ws();
        if parser.peek().is_none() {
            return Ok(Tree::new());
        }
        let root = parser.node()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("trailing input"));
        }
        parser.tree.set_root(Some(root))?;
        Ok(parser.tree)
    }
}
