use serde::Deserialize;
use std::{fmt::Display, rc::Rc, str::FromStr};

use crate::{
    ast::{
        statements::Param,
        types::{Operator, TypeTag},
    },
    errors::errors::{Error, ErrorImpl},
    scope::scope::{ArrayShape, KeywordValue},
};

use super::python::PythonBackend;

/// A resolved operand: rendered text plus what the engine inferred about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub value: String,
    pub ty: TypeTag,
    /// Present whenever `ty` is an array.
    pub array: Option<ArrayShape>,
    /// Rendered index when the value is an element read such as `xs[i]`.
    pub index: Option<String>,
}

impl Value {
    pub fn new(value: impl Into<String>, ty: TypeTag) -> Self {
        Value {
            value: value.into(),
            ty,
            array: None,
            index: None,
        }
    }

    pub fn array(value: impl Into<String>, shape: ArrayShape) -> Self {
        Value {
            value: value.into(),
            ty: TypeTag::Array,
            array: Some(shape),
            index: None,
        }
    }

    pub fn element_type(&self) -> Option<&TypeTag> {
        self.array.as_ref().map(|shape| &shape.element_type)
    }
}

/// What a `for` loop walks over.
#[derive(Debug, Clone, PartialEq)]
pub enum Iteration {
    Range {
        from: Value,
        step: Value,
        to: Value,
        ty: TypeTag,
    },
    Each(Value),
}

/// Rendering operations a target language must provide.
///
/// The engine never asks which backend it is talking to; every piece of
/// target syntax comes through here.
pub trait Backend {
    fn name(&self) -> &'static str;

    fn true_literal(&self) -> &'static str;
    fn false_literal(&self) -> &'static str;
    fn null_literal(&self) -> &'static str;
    fn not_operator(&self) -> &'static str;
    /// Name of the implicit method receiver.
    fn receiver_name(&self) -> &'static str;
    fn constructor_name(&self) -> &'static str;
    fn terminator(&self) -> &'static str;
    fn comment_symbol(&self) -> &'static str;
    /// Whether method bodies are written before the class end marker.
    fn methods_inside_class(&self) -> bool;

    /// Native spelling of a type. Must cover `TypeTag::Unknown`.
    fn native_type(&self, ty: &TypeTag) -> String;

    fn unknown_type(&self) -> String {
        self.native_type(&TypeTag::Unknown)
    }

    fn format_modifier(&self, modifier: &str) -> String {
        match modifier.trim() {
            "not" | "!" => self.not_operator().to_string(),
            other => other.to_string(),
        }
    }

    fn format_var_init(&self, name: &str, ty: &TypeTag) -> String;
    fn format_input(&self, prompt: Option<&Value>) -> String;
    /// `literal` is the string as written in the source, quotes included.
    fn format_str(&self, literal: &str, interpolations: &[Value]) -> String;
    fn format_prefix(&self, op: Operator, operand: &str) -> String;
    fn format_binary(&self, op: Operator, lhs: &str, rhs: &str) -> String;
    /// Whether an operand already folded with `child` must be parenthesized
    /// under `parent` for the target language to read it the same way.
    fn groups_operand(&self, parent: Operator, child: Operator, right: bool) -> bool;

    fn format_group(&self, modifier: &str, inner: &str) -> String {
        format!("{}({})", modifier, inner)
    }

    fn format_assign(&self, target: &Value, expr: &Value, fresh: bool) -> String;
    fn format_index_assign(&self, target: &Value, expr: &Value) -> String;
    fn format_increment(&self, target: &Value, expr: &Value) -> String;
    fn format_index_increment(&self, target: &Value, expr: &Value) -> String;
    fn format_array_append(&self, target: &Value, expr: &Value) -> String;
    fn format_array(&self, elements: &[Value], shape: &ArrayShape) -> String;
    fn format_index_access(&self, receiver: &str, index: &str) -> String;
    fn format_array_len(&self, receiver: &str) -> String;

    fn format_dot_access(&self, parts: &[String]) -> String {
        parts.join(".")
    }

    fn format_if(&self, condition: &Value) -> String;
    fn format_elif(&self, condition: &Value) -> String;
    fn format_else(&self) -> String;
    fn format_end_if(&self) -> String;
    fn format_while(&self, condition: &Value) -> String;
    fn format_end_while(&self) -> String;
    fn format_for(&self, variables: &[Value], iteration: &Iteration) -> String;
    fn format_end_for(&self) -> String;
    fn format_break(&self) -> String;

    fn format_func(
        &self,
        name: &str,
        return_type: &TypeTag,
        args: &[Param],
        kwargs: &[KeywordValue],
    ) -> String;
    fn format_end_func(&self) -> String;
    fn format_return(&self, expr: Option<&Value>) -> String;

    fn format_class(&self, name: &str, args: &[Param]) -> String;
    fn format_end_class(&self) -> String;
    fn format_class_attribute(&self, attribute: &Value, expr: &Value) -> String;

    fn format_call(
        &self,
        name: &str,
        return_type: &TypeTag,
        args: &[Value],
        kwargs: &[KeywordValue],
    ) -> String;
    fn format_print(&self, value: Option<&Value>) -> String;
    fn format_system_lib_import(&self, name: &str) -> String;

    /// Final arrangement of emitted lines, e.g. indentation.
    fn layout(&self, lines: &[String]) -> Vec<String> {
        lines.to_vec()
    }
}

/// Output language selected when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Python,
}

impl Target {
    pub fn backend(&self) -> Rc<dyn Backend> {
        match self {
            Target::Python => Rc::new(PythonBackend::new()),
        }
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(target: &str) -> Result<Self, Self::Err> {
        match target {
            "python" | "py" => Ok(Target::Python),
            other => Err(Error::new(ErrorImpl::UnknownTarget {
                target: other.to_string(),
            })),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Python => write!(f, "python"),
        }
    }
}
