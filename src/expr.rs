//! Concrete expressions in call notation: `op(child1,child2,...)` with bare terminal names at the
//! leaves.
//!
//! Like [`Shape`], an [`Expression`] is stored flat in pre-order, and printing and parsing both
//! run on explicit stacks, so arbitrarily deep expressions are handled.

use std::collections::HashMap;
use std::fmt;

use crate::error::{EnumerationError, Result};
use crate::primitives::PrimitiveSet;
use crate::shape::Shape;

/// One node of an [`Expression`]: a primitive name and the number of arguments it takes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExprNode {
    pub name: String,
    pub arity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    nodes: Vec<ExprNode>,
}

impl Expression {
    pub fn terminal(name: impl Into<String>) -> Self {
        Expression {
            nodes: vec![ExprNode {
                name: name.into(),
                arity: 0,
            }],
        }
    }

    /// An application of `name` to `args`. Without arguments this is a terminal.
    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        let mut nodes = vec![ExprNode {
            name: name.into(),
            arity: args.len(),
        }];
        for arg in args {
            nodes.extend(arg.nodes);
        }
        Expression { nodes }
    }

    /// Nodes in pre-order. Must describe exactly one tree.
    pub(crate) fn from_nodes(nodes: Vec<ExprNode>) -> Self {
        Expression { nodes }
    }

    /// Nodes in pre-order.
    pub fn nodes(&self) -> &[ExprNode] {
        &self.nodes
    }

    /// The topology of this expression, with names erased.
    pub fn shape(&self) -> Shape {
        Shape::from_preorder_unchecked(self.nodes.iter().map(|node| node.arity).collect())
    }

    /// Terminal names in pre-order.
    pub fn terminals(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| node.arity == 0)
            .map(|node| node.name.as_str())
            .collect()
    }

    /// Operator names with their arities, in pre-order.
    pub fn operators(&self) -> Vec<(&str, usize)> {
        self.nodes
            .iter()
            .filter(|node| node.arity > 0)
            .map(|node| (node.name.as_str(), node.arity))
            .collect()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Arguments still to print for every open call.
        let mut open: Vec<usize> = Vec::new();
        for node in &self.nodes {
            write!(f, "{}", node.name)?;
            if node.arity > 0 {
                write!(f, "(")?;
                open.push(node.arity);
                continue;
            }
            while let Some(remaining) = open.last_mut() {
                *remaining -= 1;
                if *remaining > 0 {
                    write!(f, ",")?;
                    break;
                }
                open.pop();
                write!(f, ")")?;
            }
        }
        Ok(())
    }
}

/// For every `(` of a text: the position of its matching `)` and of the commas directly inside.
#[derive(Debug, Default)]
struct Brackets {
    close: HashMap<usize, usize>,
    commas: HashMap<usize, Vec<usize>>,
}

impl Brackets {
    /// Fails with the position of the first unmatched parenthesis.
    fn scan(text: &str) -> std::result::Result<Self, usize> {
        let mut brackets = Brackets::default();
        let mut open = Vec::new();
        for (index, c) in text.char_indices() {
            match c {
                '(' => open.push(index),
                ')' => {
                    let start = open.pop().ok_or(index)?;
                    brackets.close.insert(start, index);
                }
                ',' => {
                    if let Some(&start) = open.last() {
                        brackets.commas.entry(start).or_default().push(index);
                    }
                }
                _ => {}
            }
        }
        match open.first() {
            Some(&start) => Err(start),
            None => Ok(brackets),
        }
    }
}

impl PrimitiveSet {
    /// Parses a printed expression against this vocabulary.
    ///
    /// Names may contain balanced parentheses (e.g. `ant.move_forward()`), but no commas.
    /// A text that is exactly a terminal name is read as that terminal.
    pub fn parse_expression(&self, text: &str) -> Result<Expression> {
        let brackets = Brackets::scan(text).map_err(|position| EnumerationError::Parse {
            input: text.to_string(),
            position,
            reason: "unbalanced parentheses".to_string(),
        })?;

        let mut nodes = Vec::new();
        // Byte ranges of the terms still to parse, next one on top.
        let mut pending = vec![(0, text.len())];
        while let Some((start, end)) = pending.pop() {
            nodes.push(self.parse_node(text, &brackets, start, end, &mut pending)?);
        }
        Ok(Expression::from_nodes(nodes))
    }

    /// Resolves `text[start..end]` to one node and queues its arguments on `pending`.
    fn parse_node(
        &self,
        text: &str,
        brackets: &Brackets,
        start: usize,
        end: usize,
        pending: &mut Vec<(usize, usize)>,
    ) -> Result<ExprNode> {
        let term = &text[start..end];
        if self.terminal_position(term).is_some() {
            return Ok(ExprNode {
                name: term.to_string(),
                arity: 0,
            });
        }
        if !term.ends_with(')') {
            return Err(EnumerationError::UnknownPrimitive {
                name: term.to_string(),
                kind: "terminal".to_string(),
            });
        }

        let mut seen_name = false;
        for bucket in self.buckets() {
            for name in &bucket.names {
                if !(term.starts_with(name.as_str()) && term[name.len()..].starts_with('(')) {
                    continue;
                }
                seen_name = true;
                let open = start + name.len();
                if brackets.close.get(&open) != Some(&(end - 1)) {
                    continue;
                }
                let commas = brackets.commas.get(&open).map(Vec::as_slice).unwrap_or(&[]);
                if commas.len() + 1 != bucket.arity {
                    continue;
                }

                let mut bounds = Vec::with_capacity(bucket.arity + 1);
                bounds.push(open);
                bounds.extend(commas);
                bounds.push(end - 1);
                // Last argument first, so that the first one is parsed next.
                for pair in bounds.windows(2).rev() {
                    pending.push((pair[0] + 1, pair[1]));
                }
                return Ok(ExprNode {
                    name: name.clone(),
                    arity: bucket.arity,
                });
            }
        }

        if seen_name {
            Err(EnumerationError::Parse {
                input: text.to_string(),
                position: start,
                reason: "no operator with a matching arity".to_string(),
            })
        } else {
            let name = term.split('(').next().unwrap_or(term);
            Err(EnumerationError::UnknownPrimitive {
                name: name.to_string(),
                kind: "operator".to_string(),
            })
        }
    }
}
