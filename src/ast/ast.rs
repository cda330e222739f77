use serde::{Deserialize, Serialize};

use crate::errors::errors::{Error, ErrorImpl};

use super::{
    expressions::{Expr, InputRead},
    statements::{
        AssignStmt, AugAssignStmt, ClassDecl, ForStmt, FuncDecl, IfStmt, VarInitStmt, WhileStmt,
    },
};

/// Statement node as produced by the parser.
///
/// The set of kinds is closed: the statement compiler matches on every
/// variant, so adding one is a compile-time obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "opcode", rename_all = "camelCase")]
pub enum Node {
    Print { expr: Option<Expr> },
    Input(InputRead),
    Expr(Expr),
    VarInit(VarInitStmt),
    Assign(AssignStmt),
    AugAssign(AugAssignStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Func(FuncDecl),
    Class(ClassDecl),
    Return { expr: Option<Expr> },
    Break,
    Comment { value: String },
    Import { name: String },
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Print { .. } => "print",
            Node::Input(_) => "input",
            Node::Expr(_) => "expr",
            Node::VarInit(_) => "varInit",
            Node::Assign(_) => "assign",
            Node::AugAssign(_) => "augAssign",
            Node::If(_) => "if",
            Node::While(_) => "while",
            Node::For(_) => "for",
            Node::Func(_) => "func",
            Node::Class(_) => "class",
            Node::Return { .. } => "return",
            Node::Break => "break",
            Node::Comment { .. } => "comment",
            Node::Import { .. } => "import",
        }
    }
}

/// Loads a program handed over by the parser in its JSON form.
///
/// The top level is an array of statement nodes.
pub fn parse_program(source: &str) -> Result<Vec<Node>, Error> {
    serde_json::from_str(source).map_err(|error| {
        Error::new(ErrorImpl::InvalidAst {
            message: error.to_string(),
        })
    })
}
