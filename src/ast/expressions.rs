use serde::{Deserialize, Serialize};

use super::types::{Operator, TypeTag};

/// Anything that can stand in a value position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "token", rename_all = "camelCase")]
pub enum Operand {
    Literal(Literal),
    Expr(Expr),
    Call(Call),
    Group(Group),
    Var(Var),
    DotAccess(DotAccess),
    Input(InputRead),
    Array(ArrayLiteral),
}

impl Operand {
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Literal(_) => "literal",
            Operand::Expr(_) => "expr",
            Operand::Call(_) => "call",
            Operand::Group(_) => "group",
            Operand::Var(_) => "var",
            Operand::DotAccess(_) => "dotAccess",
            Operand::Input(_) => "input",
            Operand::Array(_) => "array",
        }
    }
}

/// A flat expression: `args[0] ops[0] args[1] ops[1] ...`, not grouped by precedence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Expr {
    pub args: Vec<Operand>,
    #[serde(default)]
    pub ops: Vec<Operator>,
    #[serde(rename = "type", default)]
    pub ty: TypeTag,
}

impl Expr {
    pub fn single(operand: Operand) -> Self {
        Expr {
            args: vec![operand],
            ops: vec![],
            ty: TypeTag::Unknown,
        }
    }

    pub fn first_array_mut(&mut self) -> Option<&mut ArrayLiteral> {
        match self.args.first_mut() {
            Some(Operand::Array(array)) => Some(array),
            _ => None,
        }
    }
}

/// Literal token. String values keep their quotes as written in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    #[serde(rename = "type", default)]
    pub ty: TypeTag,
    pub modifier: Option<String>,
    /// Interpolated expressions of a format string.
    #[serde(default)]
    pub expressions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Var {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: TypeTag,
    #[serde(default)]
    pub element_type: TypeTag,
    pub size: Option<String>,
    pub modifier: Option<String>,
    pub index_access: Option<Expr>,
}

impl Var {
    pub fn named(name: &str) -> Self {
        Var {
            name: name.to_string(),
            ty: TypeTag::Unknown,
            element_type: TypeTag::Unknown,
            size: None,
            modifier: None,
            index_access: None,
        }
    }

    pub fn typed(name: &str, ty: TypeTag) -> Self {
        Var {
            ty,
            ..Var::named(name)
        }
    }
}

/// `name = expr` pair, used both for declared keyword parameters and for
/// keyword arguments at call sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KwArg {
    pub target: Var,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub name: Var,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default)]
    pub kwargs: Vec<KwArg>,
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub expr: Expr,
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "token", rename_all = "camelCase")]
pub enum AccessStep {
    Var(Var),
    Call(Call),
}

impl AccessStep {
    pub fn name(&self) -> &str {
        match self {
            AccessStep::Var(var) => &var.name,
            AccessStep::Call(call) => &call.name.name,
        }
    }
}

/// `a.b.c()` chain, walked left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotAccess {
    pub steps: Vec<AccessStep>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputRead {
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayLiteral {
    #[serde(default)]
    pub elements: Vec<Operand>,
    #[serde(default)]
    pub element_type: TypeTag,
    pub size: Option<String>,
}
