use serde::{Deserialize, Serialize};

use super::{
    ast::Node,
    expressions::{Expr, KwArg, Operand, Var},
    types::{Operator, TypeTag},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: Operand,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugAssignStmt {
    pub target: Operand,
    pub operator: Operator,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElifClause {
    pub expr: Expr,
    pub block: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub expr: Expr,
    pub block: Vec<Node>,
    #[serde(default)]
    pub elifs: Vec<ElifClause>,
    #[serde(rename = "else")]
    pub else_block: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub expr: Expr,
    pub block: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeIterable {
    pub from: Expr,
    pub step: Option<Expr>,
    pub to: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "token", rename_all = "camelCase")]
pub enum Iterable {
    Range(RangeIterable),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub vars: Vec<Var>,
    pub iterable: Iterable,
    pub block: Vec<Node>,
}

/// Positional parameter. Functions need explicit parameter types; an absent
/// type stays `unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: TypeTag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    /// Declared return type, `unknown` triggers inference.
    #[serde(rename = "type", default)]
    pub ty: TypeTag,
    #[serde(default)]
    pub args: Vec<Param>,
    #[serde(default)]
    pub kwargs: Vec<KwArg>,
    #[serde(default)]
    pub block: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Param>,
    #[serde(default)]
    pub block: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarInitStmt {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: TypeTag,
}
