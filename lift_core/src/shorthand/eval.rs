//! Expression evaluation against an identifier scope.

use super::parser::{BinaryOperator, Node, UnaryOperator};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named numeric value made available to expressions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub value: f64,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Identifier scope for a single evaluation
#[derive(Debug, Default)]
pub struct Scope<'a> {
    links: HashMap<&'a str, f64>,
}

impl<'a> Scope<'a> {
    /// Link bindings into a scope, rejecting duplicate names
    pub fn link(bindings: &'a [Binding]) -> Result<Self> {
        let mut links = HashMap::with_capacity(bindings.len());
        for binding in bindings {
            if links.insert(binding.name.as_str(), binding.value).is_some() {
                return Err(Error::UserCode(format!(
                    "duplicate identifier {}",
                    binding.name
                )));
            }
        }
        Ok(Self { links })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.links.get(name).copied()
    }

    /// Walk an expression tree, post-order
    pub fn evaluate(&self, node: &Node) -> Result<f64> {
        match node {
            Node::Literal(value) => Ok(*value),
            Node::Identifier(name) => self
                .get(name)
                .ok_or_else(|| Error::UserCode(format!("undefined variable {}", name))),
            Node::Unary {
                op: UnaryOperator::Negate,
                operand,
            } => Ok(-self.evaluate(operand)?),
            Node::Binary { op, lhs, rhs } => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                Ok(match op {
                    BinaryOperator::Add => lhs + rhs,
                    BinaryOperator::Subtract => lhs - rhs,
                    BinaryOperator::Multiply => lhs * rhs,
                    BinaryOperator::Divide => lhs / rhs,
                })
            }
        }
    }
}

/// Evaluate an expression tree with a scope built from `identifiers`
///
/// Division by zero follows IEEE 754 and yields an infinity or NaN.
pub fn evaluate(node: &Node, identifiers: &[Binding]) -> Result<f64> {
    let scope = Scope::link(identifiers)?;
    let result = scope.evaluate(node)?;
    tracing::trace!(?node, result, "evaluated expression");
    Ok(result)
}
