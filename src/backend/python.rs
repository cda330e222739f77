//! Python backend.
//!
//! Blocks are opened by lines ending in `:` and closed by `#end` markers,
//! which `layout` turns into indentation. Arrays become lists and unknown
//! types are spelled `any`.

use crate::{
    ast::{
        statements::Param,
        types::{Operator, TypeTag},
    },
    scope::scope::{type_known, ArrayShape, KeywordValue},
};

use super::backend::{Backend, Iteration, Value};

const END_MARKER: &str = "#end";
const INDENT: usize = 4;
const BLOCK_OPENERS: [&str; 7] = ["class ", "def ", "for ", "while ", "if ", "elif ", "else:"];

#[derive(Debug, Clone, Default)]
pub struct PythonBackend;

impl PythonBackend {
    pub fn new() -> Self {
        PythonBackend
    }

    fn known(&self, ty: &TypeTag) -> bool {
        type_known(ty, &self.unknown_type())
    }

    fn annotated(&self, name: &str, ty: &TypeTag) -> String {
        if self.known(ty) {
            format!("{}: {}", name, self.native_type(ty))
        } else {
            name.to_string()
        }
    }

    fn format_param(&self, param: &Param) -> String {
        if param.name == self.receiver_name() {
            // The class is still being defined when its methods are, so the receiver stays bare.
            param.name.clone()
        } else {
            self.annotated(&param.name, &param.ty)
        }
    }

    fn is_block(&self, line: &str) -> bool {
        !line.starts_with(self.comment_symbol())
            && line.ends_with(':')
            && BLOCK_OPENERS.iter().any(|opener| line.starts_with(opener))
    }
}

/// How tightly Python binds a binary operator, higher binds tighter.
fn binding_strength(op: Operator) -> u8 {
    match op {
        Operator::Pow => 7,
        Operator::Mul | Operator::Div | Operator::Mod => 6,
        Operator::Add | Operator::Sub => 5,
        Operator::ShiftLeft | Operator::ShiftRight => 4,
        Operator::BitAnd => 3,
        Operator::Less
        | Operator::Greater
        | Operator::LessEquals
        | Operator::GreaterEquals
        | Operator::Equals
        | Operator::NotEquals
        | Operator::Is
        | Operator::In => 2,
        Operator::And | Operator::AndNot | Operator::Not => 1,
        Operator::Or => 0,
    }
}

fn is_comparison(op: Operator) -> bool {
    binding_strength(op) == 2
}

fn strip_quotes(literal: &str) -> &str {
    for quote in ['"', '\''] {
        if literal.len() >= 2 && literal.starts_with(quote) && literal.ends_with(quote) {
            return &literal[1..literal.len() - 1];
        }
    }
    literal
}

fn escape_quotes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut previous = None;
    for c in text.chars() {
        if c == '"' && previous != Some('\\') {
            escaped.push('\\');
        }
        escaped.push(c);
        previous = Some(c);
    }
    escaped
}

impl Backend for PythonBackend {
    fn name(&self) -> &'static str {
        "python"
    }

    fn true_literal(&self) -> &'static str {
        "True"
    }

    fn false_literal(&self) -> &'static str {
        "False"
    }

    fn null_literal(&self) -> &'static str {
        "None"
    }

    fn not_operator(&self) -> &'static str {
        "not "
    }

    fn receiver_name(&self) -> &'static str {
        "self"
    }

    fn constructor_name(&self) -> &'static str {
        "__init__"
    }

    fn terminator(&self) -> &'static str {
        ""
    }

    fn comment_symbol(&self) -> &'static str {
        "#"
    }

    fn methods_inside_class(&self) -> bool {
        true
    }

    fn native_type(&self, ty: &TypeTag) -> String {
        match ty {
            TypeTag::Int => String::from("int"),
            TypeTag::Float => String::from("float"),
            TypeTag::Bool => String::from("bool"),
            TypeTag::Str => String::from("str"),
            TypeTag::Array => String::from("list"),
            TypeTag::Void | TypeTag::Null => String::from("None"),
            TypeTag::Class(name) => name.clone(),
            TypeTag::Unknown => String::from("any"),
        }
    }

    fn format_var_init(&self, name: &str, ty: &TypeTag) -> String {
        format!("{} = None", self.annotated(name, ty))
    }

    fn format_input(&self, prompt: Option<&Value>) -> String {
        match prompt {
            Some(prompt) => format!("input({})", prompt.value),
            None => String::from("input()"),
        }
    }

    fn format_str(&self, literal: &str, _interpolations: &[Value]) -> String {
        // Interpolations are written `{expr}` in the literal, which f-strings read as is.
        format!("f\"{}\"", escape_quotes(strip_quotes(literal)))
    }

    fn format_prefix(&self, op: Operator, operand: &str) -> String {
        match op {
            Operator::Not => format!("{}{}", self.not_operator(), operand),
            other => format!("{}{}", other.symbol(), operand),
        }
    }

    fn format_binary(&self, op: Operator, lhs: &str, rhs: &str) -> String {
        match op {
            Operator::AndNot => format!("{} and {}{}", lhs, self.not_operator(), rhs),
            other => format!("{} {} {}", lhs, other.symbol(), rhs),
        }
    }

    fn groups_operand(&self, parent: Operator, child: Operator, right: bool) -> bool {
        let (outer, inner) = (binding_strength(parent), binding_strength(child));
        // `**` associates to the right and comparisons chain.
        inner < outer
            || (inner == outer && (right || parent == Operator::Pow || is_comparison(parent)))
    }

    fn format_assign(&self, target: &Value, expr: &Value, fresh: bool) -> String {
        if fresh {
            format!("{} = {}", self.annotated(&target.value, &target.ty), expr.value)
        } else {
            format!("{} = {}", target.value, expr.value)
        }
    }

    fn format_index_assign(&self, target: &Value, expr: &Value) -> String {
        format!("{} = {}", target.value, expr.value)
    }

    fn format_increment(&self, target: &Value, expr: &Value) -> String {
        format!("{} += {}", target.value, expr.value)
    }

    fn format_index_increment(&self, target: &Value, expr: &Value) -> String {
        format!("{} += {}", target.value, expr.value)
    }

    fn format_array_append(&self, target: &Value, expr: &Value) -> String {
        format!("{}.append({})", target.value, expr.value)
    }

    fn format_array(&self, elements: &[Value], _shape: &ArrayShape) -> String {
        let elements: Vec<&str> = elements.iter().map(|element| element.value.as_str()).collect();
        format!("[{}]", elements.join(", "))
    }

    fn format_index_access(&self, receiver: &str, index: &str) -> String {
        format!("{}[{}]", receiver, index)
    }

    fn format_array_len(&self, receiver: &str) -> String {
        format!("len({})", receiver)
    }

    fn format_if(&self, condition: &Value) -> String {
        format!("if {}:", condition.value)
    }

    fn format_elif(&self, condition: &Value) -> String {
        format!("elif {}:", condition.value)
    }

    fn format_else(&self) -> String {
        String::from("else:")
    }

    fn format_end_if(&self) -> String {
        String::from(END_MARKER)
    }

    fn format_while(&self, condition: &Value) -> String {
        format!("while {}:", condition.value)
    }

    fn format_end_while(&self) -> String {
        String::from(END_MARKER)
    }

    fn format_for(&self, variables: &[Value], iteration: &Iteration) -> String {
        let variables: Vec<&str> = variables.iter().map(|var| var.value.as_str()).collect();
        match iteration {
            Iteration::Range { from, step, to, .. } => format!(
                "for {} in range({}, {}, {}):",
                variables.join(", "),
                from.value,
                to.value,
                step.value
            ),
            Iteration::Each(iterable) => {
                format!("for {} in {}:", variables.join(", "), iterable.value)
            }
        }
    }

    fn format_end_for(&self) -> String {
        String::from(END_MARKER)
    }

    fn format_break(&self) -> String {
        String::from("break")
    }

    fn format_func(
        &self,
        name: &str,
        return_type: &TypeTag,
        args: &[Param],
        kwargs: &[KeywordValue],
    ) -> String {
        let mut params: Vec<String> = args.iter().map(|arg| self.format_param(arg)).collect();
        params.extend(
            kwargs
                .iter()
                .map(|kw| format!("{} = {}", self.annotated(&kw.name, &kw.ty), kw.value)),
        );
        format!(
            "def {}({}) -> {}:",
            name,
            params.join(", "),
            self.native_type(return_type)
        )
    }

    fn format_end_func(&self) -> String {
        String::from(END_MARKER)
    }

    fn format_return(&self, expr: Option<&Value>) -> String {
        match expr {
            Some(expr) => format!("return {}", expr.value),
            None => String::from("return"),
        }
    }

    fn format_class(&self, name: &str, _args: &[Param]) -> String {
        format!("class {}:", name)
    }

    fn format_end_class(&self) -> String {
        String::from(END_MARKER)
    }

    fn format_class_attribute(&self, attribute: &Value, expr: &Value) -> String {
        format!("{} = {}", self.annotated(&attribute.value, &attribute.ty), expr.value)
    }

    fn format_call(
        &self,
        name: &str,
        _return_type: &TypeTag,
        args: &[Value],
        kwargs: &[KeywordValue],
    ) -> String {
        let mut arguments: Vec<String> = args.iter().map(|arg| arg.value.clone()).collect();
        arguments.extend(kwargs.iter().map(|kw| format!("{}={}", kw.name, kw.value)));
        format!("{}({})", name, arguments.join(", "))
    }

    fn format_print(&self, value: Option<&Value>) -> String {
        match value {
            Some(value) => format!("print({})", value.value),
            None => String::from("print()"),
        }
    }

    fn format_system_lib_import(&self, name: &str) -> String {
        format!("import {}", name)
    }

    fn layout(&self, lines: &[String]) -> Vec<String> {
        let mut result = Vec::with_capacity(lines.len());
        let mut indent = 0;
        let mut empty_block = false;

        for line in lines {
            let closes = line.starts_with(END_MARKER);
            let continues = line.starts_with("elif ") || line.starts_with("else:");

            if closes || continues {
                if empty_block {
                    result.push(format!("{}pass", " ".repeat(indent)));
                    empty_block = false;
                }
                indent = indent.saturating_sub(INDENT);
            }
            if closes {
                continue;
            }
            if line.is_empty() {
                result.push(String::new());
                continue;
            }

            result.push(format!("{}{}", " ".repeat(indent), line));
            empty_block = self.is_block(line);
            if empty_block {
                indent += INDENT;
            }
        }
        if empty_block {
            result.push(format!("{}pass", " ".repeat(indent)));
        }

        result
    }
}
