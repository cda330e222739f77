//! Type tags and operators shared by the node model and the engine.
//!
//! Types arrive from the parser as plain names (`"int"`, `"Point"`, ...) and
//! are converted into `TypeTag`. Operators arrive as their source spelling and
//! are looked up in `OPERATOR_LOOKUP`.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

/// The closed set of types the engine reasons about.
///
/// `Unknown` is the "not resolved yet" sentinel. Everything that is not a
/// builtin name is treated as a class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    Str,
    Array,
    Void,
    Null,
    Class(String),
    #[default]
    Unknown,
}

impl TypeTag {
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Float)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeTag::Array)
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeTag::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for TypeTag {
    fn from(name: &str) -> Self {
        match name {
            "int" => TypeTag::Int,
            "float" => TypeTag::Float,
            "bool" => TypeTag::Bool,
            "str" => TypeTag::Str,
            "array" => TypeTag::Array,
            "void" => TypeTag::Void,
            "null" => TypeTag::Null,
            "unknown" | "" => TypeTag::Unknown,
            other => TypeTag::Class(other.to_string()),
        }
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        TypeTag::from(name.as_str())
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.to_string()
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Int => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Str => write!(f, "str"),
            TypeTag::Array => write!(f, "array"),
            TypeTag::Void => write!(f, "void"),
            TypeTag::Null => write!(f, "null"),
            TypeTag::Class(name) => write!(f, "{}", name),
            TypeTag::Unknown => write!(f, "unknown"),
        }
    }
}

lazy_static! {
    pub static ref OPERATOR_LOOKUP: HashMap<&'static str, Operator> = {
        let mut map = HashMap::new();
        map.insert("**", Operator::Pow);
        map.insert("*", Operator::Mul);
        map.insert("/", Operator::Div);
        map.insert("%", Operator::Mod);
        map.insert("+", Operator::Add);
        map.insert("-", Operator::Sub);
        map.insert("<", Operator::Less);
        map.insert(">", Operator::Greater);
        map.insert("<=", Operator::LessEquals);
        map.insert(">=", Operator::GreaterEquals);
        map.insert("==", Operator::Equals);
        map.insert("!=", Operator::NotEquals);
        map.insert("is", Operator::Is);
        map.insert("in", Operator::In);
        map.insert("and", Operator::And);
        map.insert("andnot", Operator::AndNot);
        map.insert("or", Operator::Or);
        map.insert("&", Operator::BitAnd);
        map.insert("<<", Operator::ShiftLeft);
        map.insert(">>", Operator::ShiftRight);
        map.insert("not", Operator::Not);
        map
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Pow,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Less,
    Greater,
    LessEquals,
    GreaterEquals,
    Equals,
    NotEquals,
    Is,
    In,
    And,
    AndNot,
    Or,
    BitAnd,
    ShiftLeft,
    ShiftRight,
    /// Only valid in prefix position.
    Not,
}

/// Lowest binding level used by the reducer. Levels run from 1 (tightest) up to this.
pub const LOWEST_PRECEDENCE: u8 = 8;

impl Operator {
    /// Binding level of the operator, 1 binds tightest.
    ///
    /// Returns `None` for operators that never appear between two operands.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Operator::Pow => Some(1),
            Operator::Mul | Operator::Div | Operator::Mod => Some(2),
            Operator::Add | Operator::Sub => Some(3),
            Operator::Less
            | Operator::Greater
            | Operator::LessEquals
            | Operator::GreaterEquals => Some(4),
            Operator::Equals | Operator::NotEquals | Operator::Is | Operator::In => Some(5),
            Operator::And | Operator::AndNot => Some(6),
            Operator::Or => Some(7),
            Operator::BitAnd | Operator::ShiftLeft | Operator::ShiftRight => Some(8),
            Operator::Not => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Pow => "**",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessEquals => "<=",
            Operator::GreaterEquals => ">=",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Is => "is",
            Operator::In => "in",
            Operator::And => "and",
            Operator::AndNot => "andnot",
            Operator::Or => "or",
            Operator::BitAnd => "&",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::Not => "not",
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = String;

    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        OPERATOR_LOOKUP
            .get(symbol.as_str())
            .copied()
            .ok_or_else(|| format!("unknown operator `{}`", symbol))
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.symbol().to_string()
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
