//! Operator-precedence resolution.
//!
//! The front end hands us a flat chain of terms and operator symbols such as
//! `- 3 + - 5`. [`resolve_chain`] turns it into a nested tree of
//! [`FuncCall`](crate::engine::ExprKind::FuncCall) nodes named after the
//! operators, using precedence climbing driven by an [`OperatorTable`].
//!
//! Each operator has a binding power (higher binds tighter), an
//! associativity, and optionally a prefix binding power for unary use.
//! The chain is consumed left to right exactly once.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::iter::Peekable;
use std::vec;

use crate::engine::{ExprId, Graph};
use crate::error::ResolveError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Associativity {
    #[default]
    Left,
    /// Cannot be chained, so cannot appear infix at all.
    None,
    Right,
}

/// How one operator symbol binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSpec {
    pub binding_power: u32,
    #[serde(default)]
    pub associativity: Associativity,
    #[serde(default)]
    pub prefix_binding_power: Option<u32>,
}

impl OperatorSpec {
    pub fn left(binding_power: u32) -> Self {
        OperatorSpec {
            binding_power,
            associativity: Associativity::Left,
            prefix_binding_power: None,
        }
    }

    pub fn right(binding_power: u32) -> Self {
        OperatorSpec {
            associativity: Associativity::Right,
            ..Self::left(binding_power)
        }
    }

    pub fn non_associative(binding_power: u32) -> Self {
        OperatorSpec {
            associativity: Associativity::None,
            ..Self::left(binding_power)
        }
    }

    /// Also allow the operator in prefix position.
    pub fn with_prefix(mut self, prefix_binding_power: u32) -> Self {
        self.prefix_binding_power = Some(prefix_binding_power);
        self
    }
}

/// Operator symbol -> binding rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorTable {
    operators: HashMap<String, OperatorSpec>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, symbol: impl Into<String>, spec: OperatorSpec) -> Self {
        self.insert(symbol, spec);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, spec: OperatorSpec) {
        self.operators.insert(symbol.into(), spec);
    }

    pub fn get(&self, symbol: &str) -> Option<&OperatorSpec> {
        self.operators.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    /// Insert every entry of `other`, replacing symbols already present.
    pub fn merge(&mut self, other: OperatorTable) {
        self.operators.extend(other.operators);
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

/// Deepest operator nesting a single chain may resolve to.
pub const MAX_DEPTH: usize = 256;

/// One element of a flat chain.
#[derive(Clone, Debug, PartialEq)]
pub enum ChainItem {
    Term(ExprId),
    Operator(String),
}

/// Resolve a flat chain into a single expression.
pub fn resolve_chain(
    graph: &mut Graph,
    table: &OperatorTable,
    chain: Vec<ChainItem>,
) -> Result<ExprId, ResolveError> {
    if let [ChainItem::Term(id)] = chain.as_slice() {
        return Ok(*id);
    }

    let mut resolver = Resolver {
        graph,
        table,
        tokens: chain.into_iter().peekable(),
        depth: 0,
    };
    let root = resolver.parse(0)?;

    // Anything left over is an operator too weak to ever bind infix.
    match resolver.tokens.next() {
        None => Ok(root),
        Some(ChainItem::Operator(op)) => Err(ResolveError::NotInfix(op)),
        Some(ChainItem::Term(_)) => Err(ResolveError::ExpectedOperator),
    }
}

/// Resolve each argument chain independently and wrap them in a call to `name`.
pub fn resolve_call(
    graph: &mut Graph,
    table: &OperatorTable,
    name: impl Into<String>,
    args: Vec<Vec<ChainItem>>,
) -> Result<ExprId, ResolveError> {
    let args = args
        .into_iter()
        .map(|chain| resolve_chain(graph, table, chain))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(graph.func_call(name, args))
}

struct Resolver<'g, 't> {
    graph: &'g mut Graph,
    table: &'t OperatorTable,
    tokens: Peekable<vec::IntoIter<ChainItem>>,
    depth: usize,
}

impl Resolver<'_, '_> {
    fn spec(&self, op: &str) -> Result<OperatorSpec, ResolveError> {
        self.table
            .get(op)
            .copied()
            .ok_or_else(|| ResolveError::UnknownOperator(op.to_string()))
    }

    fn parse(&mut self, min_bp: u32) -> Result<ExprId, ResolveError> {
        if self.depth == MAX_DEPTH {
            return Err(ResolveError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.parse_operand(min_bp);
        self.depth -= 1;
        result
    }

    fn parse_operand(&mut self, min_bp: u32) -> Result<ExprId, ResolveError> {
        let token = self.tokens.next().ok_or(ResolveError::UnexpectedEnd)?;
        let mut left = self.nud(token)?;

        while let Some(next) = self.tokens.peek() {
            let ChainItem::Operator(op) = next else {
                return Err(ResolveError::ExpectedOperator);
            };
            let spec = self
                .table
                .get(op)
                .copied()
                .ok_or_else(|| ResolveError::UnknownOperator(op.clone()))?;
            if spec.associativity == Associativity::None {
                return Err(ResolveError::NonAssociative(op.clone()));
            }
            if spec.binding_power <= min_bp {
                break;
            }
            let Some(ChainItem::Operator(op)) = self.tokens.next() else {
                unreachable!("peeked an operator");
            };
            left = self.led(op, spec, left)?;
        }

        Ok(left)
    }

    /// Prefix position: a term stands for itself, an operator must be unary.
    fn nud(&mut self, token: ChainItem) -> Result<ExprId, ResolveError> {
        match token {
            ChainItem::Term(id) => Ok(id),
            ChainItem::Operator(op) => {
                let prefix_bp = self
                    .spec(&op)?
                    .prefix_binding_power
                    .ok_or_else(|| ResolveError::NotPrefix(op.clone()))?;
                let operand = self.parse(prefix_bp)?;
                Ok(self.graph.func_call(op, vec![operand]))
            }
        }
    }

    /// Infix position: fold `left` into a binary call.
    fn led(
        &mut self,
        op: String,
        spec: OperatorSpec,
        left: ExprId,
    ) -> Result<ExprId, ResolveError> {
        let right = match spec.associativity {
            Associativity::Left => self.parse(spec.binding_power)?,
            // One below our own power lets an equal operator on the right win.
            Associativity::Right => self.parse(spec.binding_power.saturating_sub(1))?,
            Associativity::None => return Err(ResolveError::NonAssociative(op)),
        };
        Ok(self.graph.func_call(op, vec![left, right]))
    }
}
