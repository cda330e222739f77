use tracing::trace;

use crate::{
    ast::{
        expressions::{
            AccessStep, ArrayLiteral, Call, DotAccess, Expr, Group, InputRead, KwArg, Literal,
            Operand, Var,
        },
        types::{Operator, TypeTag, LOWEST_PRECEDENCE},
    },
    backend::backend::{Backend, Value},
    errors::errors::Error,
    scope::scope::{type_known, ArrayShape, KeywordValue},
    MK_UNKNOWN_TYPE, MK_UNSUPPORTED,
};

use super::compiler::Compiler;

/// Where a call appears, which decides where its signature is looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum CallSite {
    /// Plain `f(...)`, looked up in the current scope.
    Free,
    /// `obj.f(...)` on an instance of a known class.
    Method(String),
    /// Call on a receiver the engine knows nothing about.
    Foreign,
}

/// Folds a flat operand/operator list by precedence level, left to right
/// within a level. `apply` combines two neighbours into one.
pub fn reduce_operands<T>(
    mut operands: Vec<T>,
    mut ops: Vec<Operator>,
    mut apply: impl FnMut(Operator, T, T) -> Result<T, Error>,
) -> Result<T, Error> {
    if operands.len() != ops.len() + 1 {
        return Err(MK_UNSUPPORTED!(
            "expression with {} operands and {} operators",
            operands.len(),
            ops.len()
        ));
    }

    for level in 1..=LOWEST_PRECEDENCE {
        while let Some(index) = ops.iter().position(|op| op.precedence() == Some(level)) {
            let op = ops.remove(index);
            let rhs = operands.remove(index + 1);
            let lhs = operands.remove(index);
            operands.insert(index, apply(op, lhs, rhs)?);
        }
    }

    if let Some(op) = ops.first() {
        return Err(MK_UNSUPPORTED!("operator `{}` between two operands", op));
    }
    operands
        .pop()
        .ok_or_else(|| MK_UNSUPPORTED!("empty expression"))
}

/// Result type of `lhs op rhs`.
pub fn result_type(op: Operator, lhs: &TypeTag, rhs: &TypeTag) -> TypeTag {
    let numeric = lhs.is_numeric() && rhs.is_numeric();
    match op {
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Mod | Operator::Pow => {
            match (lhs, rhs) {
                (TypeTag::Int, TypeTag::Int) => TypeTag::Int,
                _ if numeric => TypeTag::Float,
                _ => TypeTag::Unknown,
            }
        }
        Operator::Div if numeric => TypeTag::Float,
        Operator::Div => TypeTag::Unknown,
        Operator::Less
        | Operator::Greater
        | Operator::LessEquals
        | Operator::GreaterEquals
        | Operator::Equals
        | Operator::NotEquals
        | Operator::Is
        | Operator::In
        | Operator::And
        | Operator::AndNot
        | Operator::Or => TypeTag::Bool,
        Operator::BitAnd | Operator::ShiftLeft | Operator::ShiftRight => match (lhs, rhs) {
            (TypeTag::Int, TypeTag::Int) => TypeTag::Int,
            _ => TypeTag::Unknown,
        },
        Operator::Not => TypeTag::Unknown,
    }
}

/// Reduces an expression to a single rendered value.
pub fn resolve_expression(compiler: &mut Compiler, expr: &Expr) -> Result<Value, Error> {
    let value = if expr.args.len() == 1 && expr.ops.len() == 1 {
        resolve_prefix(compiler, expr)?
    } else {
        resolve_binary(compiler, expr)?
    };
    Ok(with_declared_type(compiler, &expr.ty, value))
}

/// Folds the operand list. Each partial result remembers the operator that
/// produced it so the backend can parenthesize it under a different one.
fn resolve_binary(compiler: &mut Compiler, expr: &Expr) -> Result<Value, Error> {
    let operands = expr
        .args
        .iter()
        .map(|operand| {
            let value = resolve_operand(compiler, operand)?;
            Ok::<_, Error>((value, None::<Operator>))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let backend = compiler.backend.clone();
    let (value, _) = reduce_operands(
        operands,
        expr.ops.clone(),
        |op, (lhs, lhs_op): (Value, Option<Operator>), (rhs, rhs_op)| {
            if op == Operator::Not {
                return Err(MK_UNSUPPORTED!("`not` between two operands"));
            }
            let ty = result_type(op, &lhs.ty, &rhs.ty);
            let lhs_text = grouped(backend.as_ref(), op, lhs_op, false, lhs.value);
            let rhs_text = grouped(backend.as_ref(), op, rhs_op, true, rhs.value);
            Ok((
                Value::new(backend.format_binary(op, &lhs_text, &rhs_text), ty),
                Some(op),
            ))
        },
    )?;
    Ok(value)
}

fn grouped(
    backend: &dyn Backend,
    parent: Operator,
    child: Option<Operator>,
    right: bool,
    text: String,
) -> String {
    match child {
        Some(child) if backend.groups_operand(parent, child, right) => {
            backend.format_group("", &text)
        }
        _ => text,
    }
}

/// A known type written on the expression node wins over the inferred one,
/// whatever the shape of the expression. An array value keeps its own type
/// and shape.
fn with_declared_type(compiler: &Compiler, declared: &TypeTag, value: Value) -> Value {
    if !compiler.type_known(declared) || value.ty.is_array() || value.ty == *declared {
        return value;
    }
    if declared.is_array() {
        return Value::array(value.value, ArrayShape::of(TypeTag::Unknown));
    }
    Value {
        ty: declared.clone(),
        ..value
    }
}

fn resolve_prefix(compiler: &mut Compiler, expr: &Expr) -> Result<Value, Error> {
    let op = expr.ops[0];
    let operand = resolve_operand(compiler, &expr.args[0])?;

    let ty = if compiler.type_known(&expr.ty) {
        expr.ty.clone()
    } else if op == Operator::Not {
        TypeTag::Bool
    } else {
        operand.ty.clone()
    };
    if !compiler.type_known(&ty) {
        return Err(MK_UNKNOWN_TYPE!("operand of prefix `{}`", op));
    }

    match op {
        Operator::Sub | Operator::Add | Operator::Not => Ok(Value::new(
            compiler.backend.format_prefix(op, &operand.value),
            ty,
        )),
        other => Err(MK_UNSUPPORTED!("prefix operator `{}`", other)),
    }
}

pub fn resolve_operand(compiler: &mut Compiler, operand: &Operand) -> Result<Value, Error> {
    trace!(kind = operand.kind(), "resolving operand");
    match operand {
        Operand::Literal(literal) => resolve_literal(compiler, literal),
        Operand::Expr(expr) => resolve_expression(compiler, expr),
        Operand::Call(call) => resolve_call(compiler, call, CallSite::Free),
        Operand::Group(group) => resolve_group(compiler, group),
        Operand::Var(var) => resolve_var(compiler, var),
        Operand::DotAccess(access) => resolve_dot_access(compiler, access),
        Operand::Input(read) => resolve_input(compiler, read),
        Operand::Array(array) => resolve_array(compiler, array),
    }
}

fn with_modifier(compiler: &Compiler, modifier: &Option<String>, value: String) -> String {
    match modifier {
        Some(modifier) => format!("{}{}", compiler.backend.format_modifier(modifier), value),
        None => value,
    }
}

fn resolve_literal(compiler: &mut Compiler, literal: &Literal) -> Result<Value, Error> {
    let (value, ty) = match &literal.ty {
        TypeTag::Str => {
            let interpolations = literal
                .expressions
                .iter()
                .map(|expr| resolve_expression(compiler, expr))
                .collect::<Result<Vec<_>, _>>()?;
            (
                compiler.backend.format_str(&literal.value, &interpolations),
                TypeTag::Str,
            )
        }
        TypeTag::Bool => {
            let value = match literal.value.to_lowercase().as_str() {
                "true" => compiler.backend.true_literal().to_string(),
                "false" => compiler.backend.false_literal().to_string(),
                _ => literal.value.clone(),
            };
            (value, TypeTag::Bool)
        }
        TypeTag::Null => (
            compiler.backend.null_literal().to_string(),
            TypeTag::Null,
        ),
        ty if compiler.type_known(ty) => (literal.value.clone(), ty.clone()),
        _ => (
            literal.value.clone(),
            compiler.scopes.resolve_type(&literal.value),
        ),
    };

    Ok(Value::new(
        with_modifier(compiler, &literal.modifier, value),
        ty,
    ))
}

/// Type and array shape of a variable: its own annotation, then the scope,
/// then the return type of the function being compiled when it names itself.
fn variable_type(compiler: &Compiler, var: &Var) -> (TypeTag, Option<ArrayShape>) {
    let (ty, array) = if compiler.type_known(&var.ty) {
        let array = var.ty.is_array().then(|| ArrayShape {
            element_type: var.element_type.clone(),
            size: var.size.clone(),
        });
        (var.ty.clone(), array)
    } else if let Some(info) = compiler.scopes.lookup(&var.name) {
        (info.ty.clone(), info.array.clone())
    } else if compiler.in_func.as_deref() == Some(var.name.as_str()) {
        let unknown = compiler.backend.unknown_type();
        match compiler
            .scopes
            .first_known_return(|ty| type_known(ty, &unknown))
        {
            Some(info) => (info.ty, info.array),
            None => (TypeTag::Unknown, None),
        }
    } else {
        (TypeTag::Unknown, None)
    };

    match (ty.is_array(), array) {
        (true, None) => (ty, Some(ArrayShape::of(TypeTag::Unknown))),
        (true, array) => (ty, array),
        (false, _) => (ty, None),
    }
}

pub fn resolve_var(compiler: &mut Compiler, var: &Var) -> Result<Value, Error> {
    let (ty, array) = variable_type(compiler, var);

    let mut value = match &var.index_access {
        Some(index) => {
            let index = resolve_expression(compiler, index)?;
            let element_type = match (&ty, &array) {
                (TypeTag::Array, Some(shape)) => shape.element_type.clone(),
                (ty, _) if !compiler.type_known(ty) => TypeTag::Unknown,
                (ty, _) => {
                    return Err(MK_UNSUPPORTED!(
                        "index access on `{}` of type {}",
                        var.name,
                        ty
                    ))
                }
            };
            Value {
                value: compiler
                    .backend
                    .format_index_access(&var.name, &index.value),
                ty: element_type,
                array: None,
                index: Some(index.value),
            }
        }
        None => Value {
            value: var.name.clone(),
            ty,
            array,
            index: None,
        },
    };

    value.value = with_modifier(compiler, &var.modifier, value.value);
    Ok(value)
}

fn resolve_array(compiler: &mut Compiler, array: &ArrayLiteral) -> Result<Value, Error> {
    let elements = array
        .elements
        .iter()
        .map(|element| resolve_operand(compiler, element))
        .collect::<Result<Vec<_>, _>>()?;

    let element_type = if compiler.type_known(&array.element_type) {
        array.element_type.clone()
    } else {
        let mut distinct: Vec<&TypeTag> = vec![];
        for element in &elements {
            if !distinct.contains(&&element.ty) {
                distinct.push(&element.ty);
            }
        }
        match distinct.as_slice() {
            [] => TypeTag::Unknown,
            [only] => (*only).clone(),
            [first, second] if first.is_numeric() && second.is_numeric() => TypeTag::Float,
            mixed => {
                let names: Vec<String> = mixed.iter().map(|ty| ty.to_string()).collect();
                return Err(MK_UNSUPPORTED!(
                    "array literal mixing {}",
                    names.join(", ")
                ));
            }
        }
    };

    let shape = ArrayShape {
        element_type,
        size: array.size.clone(),
    };
    Ok(Value::array(
        compiler.backend.format_array(&elements, &shape),
        shape,
    ))
}

fn resolve_group(compiler: &mut Compiler, group: &Group) -> Result<Value, Error> {
    let inner = resolve_expression(compiler, &group.expr)?;
    let modifier = group
        .modifier
        .as_deref()
        .map(|modifier| compiler.backend.format_modifier(modifier))
        .unwrap_or_default();

    Ok(Value {
        value: compiler.backend.format_group(&modifier, &inner.value),
        ..inner
    })
}

pub fn resolve_input(compiler: &mut Compiler, read: &InputRead) -> Result<Value, Error> {
    let prompt = match &read.expr {
        Some(expr) => Some(resolve_expression(compiler, expr)?),
        None => None,
    };
    Ok(Value::new(
        compiler.backend.format_input(prompt.as_ref()),
        TypeTag::Str,
    ))
}

/// Resolves keyword arguments. The declared type of the target wins over the
/// type of the value.
pub fn resolve_kwargs(
    compiler: &mut Compiler,
    kwargs: &[KwArg],
) -> Result<Vec<KeywordValue>, Error> {
    kwargs
        .iter()
        .map(|kwarg| {
            let value = resolve_expression(compiler, &kwarg.expr)?;
            let ty = if compiler.type_known(&kwarg.target.ty) {
                kwarg.target.ty.clone()
            } else {
                value.ty
            };
            Ok(KeywordValue {
                name: kwarg.target.name.clone(),
                ty,
                value: value.value,
            })
        })
        .collect()
}

/// Lays supplied keyword arguments out in declaration order, filling the
/// gaps with declared defaults.
pub fn reorder_kwargs(
    declared: &[KeywordValue],
    supplied: Vec<KeywordValue>,
) -> Result<Vec<KeywordValue>, Error> {
    if let Some(unknown) = supplied
        .iter()
        .find(|kwarg| !declared.iter().any(|param| param.name == kwarg.name))
    {
        return Err(MK_UNSUPPORTED!(
            "keyword argument `{}` not declared by the callee",
            unknown.name
        ));
    }

    Ok(declared
        .iter()
        .map(|param| {
            supplied
                .iter()
                .find(|kwarg| kwarg.name == param.name)
                .cloned()
                .unwrap_or_else(|| param.clone())
        })
        .collect())
}

pub fn resolve_call(compiler: &mut Compiler, call: &Call, site: CallSite) -> Result<Value, Error> {
    let name = &call.name.name;
    let args = call
        .args
        .iter()
        .map(|arg| resolve_expression(compiler, arg))
        .collect::<Result<Vec<_>, _>>()?;
    let supplied = resolve_kwargs(compiler, &call.kwargs)?;

    let callee = match &site {
        CallSite::Free => compiler.scopes.lookup(name).cloned(),
        CallSite::Method(class) => compiler
            .classes
            .get(class)
            .and_then(|info| info.scope.get(name))
            .cloned(),
        CallSite::Foreign => None,
    };

    let kwargs = match callee.as_ref().and_then(|info| info.signature.as_ref()) {
        Some(signature) => reorder_kwargs(&signature.kwargs, supplied)?,
        None => supplied,
    };

    let (ty, array) = match (&site, callee) {
        (CallSite::Free, _) if compiler.classes.contains_key(name) => {
            (TypeTag::Class(name.clone()), None)
        }
        (CallSite::Free, None) => variable_type(compiler, &call.name),
        (_, Some(info)) => (info.ty, info.array),
        (_, None) => (TypeTag::Unknown, None),
    };

    let value = compiler.backend.format_call(name, &ty, &args, &kwargs);
    let value = with_modifier(compiler, &call.modifier, value);
    match ty {
        TypeTag::Array => Ok(Value::array(
            value,
            array.unwrap_or_else(|| ArrayShape::of(TypeTag::Unknown)),
        )),
        ty => Ok(Value::new(value, ty)),
    }
}

/// Renders one step after the head of a dot chain. Returns the text and the
/// rendered index when the step indexes into the member.
fn render_step(
    compiler: &mut Compiler,
    step: &AccessStep,
    site: CallSite,
) -> Result<(String, Option<String>), Error> {
    match step {
        AccessStep::Var(var) => {
            let rendered = match &var.index_access {
                Some(index) => {
                    let index = resolve_expression(compiler, index)?;
                    let text = compiler
                        .backend
                        .format_index_access(&var.name, &index.value);
                    (text, Some(index.value))
                }
                None => (var.name.clone(), None),
            };
            Ok(rendered)
        }
        AccessStep::Call(call) => Ok((resolve_call(compiler, call, site)?.value, None)),
    }
}

/// Walks `a.b.c()` left to right, following class members while the
/// receiver is a known class.
pub fn resolve_dot_access(compiler: &mut Compiler, access: &DotAccess) -> Result<Value, Error> {
    let (first, rest) = access
        .steps
        .split_first()
        .ok_or_else(|| MK_UNSUPPORTED!("empty dot access"))?;

    let head = match first {
        AccessStep::Var(var) => resolve_var(compiler, var)?,
        AccessStep::Call(call) => resolve_call(compiler, call, CallSite::Free)?,
    };
    let mut parts = vec![head.value];
    let mut ty = head.ty;
    let mut shape = head.array;
    let mut index = head.index;

    for step in rest {
        index = None;

        if ty.is_array() && step.name() == "len" && matches!(step, AccessStep::Var(_)) {
            let receiver = compiler.backend.format_dot_access(&parts);
            parts = vec![compiler.backend.format_array_len(&receiver)];
            ty = TypeTag::Int;
            shape = None;
            continue;
        }

        let owner = ty
            .class_name()
            .filter(|class| compiler.classes.contains_key(*class))
            .map(str::to_string);
        let member = owner.as_ref().and_then(|class| {
            compiler
                .classes
                .get(class)
                .and_then(|info| info.scope.get(step.name()))
                .cloned()
        });
        let site = match owner {
            Some(class) => CallSite::Method(class),
            None => CallSite::Foreign,
        };
        let (text, step_index) = render_step(compiler, step, site)?;

        match member {
            Some(info) => {
                shape = if info.ty.is_array() {
                    Some(info.array.unwrap_or(ArrayShape::of(TypeTag::Unknown)))
                } else {
                    None
                };
                ty = info.ty;
            }
            None => {
                ty = TypeTag::Unknown;
                shape = None;
            }
        }

        if let Some(step_index) = step_index {
            match shape.take() {
                Some(array) => ty = array.element_type,
                None if !compiler.type_known(&ty) => {}
                None => {
                    return Err(MK_UNSUPPORTED!(
                        "index access on `{}` of type {}",
                        step.name(),
                        ty
                    ))
                }
            }
            index = Some(step_index);
        }
        parts.push(text);
    }

    Ok(Value {
        value: compiler.backend.format_dot_access(&parts),
        ty,
        array: shape,
        index,
    })
}
