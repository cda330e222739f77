use tracing::debug;

use crate::{
    ast::{
        ast::Node,
        expressions::{Expr, Operand, Var},
        statements::{AssignStmt, AugAssignStmt, ForStmt, IfStmt, Iterable, RangeIterable},
        types::{Operator, TypeTag},
    },
    backend::backend::{Iteration, Value},
    errors::errors::Error,
    scope::scope::{ArrayShape, TypeInfo},
    MK_UNKNOWN_TYPE, MK_UNSUPPORTED,
};

use super::{
    compiler::Compiler,
    expr::{resolve_expression, resolve_input, resolve_operand, resolve_var},
    imports::compile_import,
    lowering::{compile_class, compile_func},
};

pub fn compile_block(compiler: &mut Compiler, block: &[Node]) -> Result<(), Error> {
    for node in block {
        compile_statement(compiler, node)?;
    }
    Ok(())
}

pub fn compile_statement(compiler: &mut Compiler, node: &Node) -> Result<(), Error> {
    match node {
        Node::Print { expr } => {
            let value = match expr {
                Some(expr) => Some(resolve_expression(compiler, expr)?),
                None => None,
            };
            let line = compiler.backend.format_print(value.as_ref());
            compiler.emit(line);
        }
        Node::Input(read) => {
            let value = resolve_input(compiler, read)?;
            let line = format!("{}{}", value.value, compiler.backend.terminator());
            compiler.emit(line);
        }
        Node::Expr(expr) => {
            let value = resolve_expression(compiler, expr)?;
            let line = format!("{}{}", value.value, compiler.backend.terminator());
            compiler.emit(line);
        }
        Node::VarInit(init) => {
            if compiler.type_known(&init.ty) {
                compiler.scopes.bind(&init.name, TypeInfo::of(init.ty.clone()));
            }
            let line = compiler.backend.format_var_init(&init.name, &init.ty);
            compiler.emit(line);
        }
        Node::Assign(assign) => compile_assign(compiler, assign)?,
        Node::AugAssign(assign) => compile_aug_assign(compiler, assign)?,
        Node::If(stmt) => compile_if(compiler, stmt)?,
        Node::While(stmt) => {
            let condition = resolve_expression(compiler, &stmt.expr)?;
            let line = compiler.backend.format_while(&condition);
            compiler.emit(line);
            compile_block(compiler, &stmt.block)?;
            let line = compiler.backend.format_end_while();
            compiler.emit(line);
        }
        Node::For(stmt) => compile_for(compiler, stmt)?,
        Node::Func(func) => compile_func(compiler, func)?,
        Node::Class(class) => compile_class(compiler, class)?,
        Node::Return { expr } => {
            let value = match expr {
                Some(expr) => Some(resolve_expression(compiler, expr)?),
                None => None,
            };
            let (ty, array) = match &value {
                Some(value) => (value.ty.clone(), value.array.clone()),
                None => (TypeTag::Void, None),
            };
            compiler.scopes.record_return(ty, array);
            let line = compiler.backend.format_return(value.as_ref());
            compiler.emit(line);
        }
        Node::Break => {
            let line = compiler.backend.format_break();
            compiler.emit(line);
        }
        // Comments are not carried into the output.
        Node::Comment { .. } => {}
        Node::Import { name } => compile_import(compiler, name)?,
    }
    Ok(())
}

/// Fills in the element type of an array literal on the right hand side from
/// what the target already says about it.
fn seed_array_literal(compiler: &Compiler, target: &Value, expr: &mut Expr) {
    let Some(literal) = expr.first_array_mut() else {
        return;
    };
    if target.ty.is_array() {
        if let Some(shape) = &target.array {
            if !compiler.type_known(&literal.element_type) {
                literal.element_type = shape.element_type.clone();
            }
            if literal.size.is_none() {
                literal.size = shape.size.clone();
            }
        }
    } else if compiler.type_known(&target.ty) {
        literal.element_type = target.ty.clone();
    }
}

fn compile_assign(compiler: &mut Compiler, assign: &AssignStmt) -> Result<(), Error> {
    let binding = match &assign.target {
        Operand::Var(var) => Some(var.name.clone()),
        Operand::DotAccess(_) => None,
        other => {
            return Err(MK_UNSUPPORTED!("assignment to {}", other.kind()));
        }
    };
    let mut target = resolve_operand(compiler, &assign.target)?;

    let mut expr = assign.expr.clone();
    seed_array_literal(compiler, &target, &mut expr);
    let value = resolve_expression(compiler, &expr)?;

    let fresh = match &binding {
        Some(name) => target.index.is_none() && !compiler.scopes.contains(name),
        None => false,
    };

    if let (true, Some(name)) = (fresh, &binding) {
        if compiler.type_known(&target.ty) {
            if target.ty.is_array() {
                let shape = known_shape(compiler, target.array.take())
                    .or_else(|| known_shape(compiler, value.array.clone()))
                    .ok_or_else(|| MK_UNKNOWN_TYPE!("element type of array `{}`", name))?;
                compiler.scopes.bind(name, TypeInfo::array(shape.clone()));
                target.array = Some(shape);
            } else if value.ty.is_array() {
                let shape = value
                    .array
                    .clone()
                    .unwrap_or_else(|| ArrayShape::of(target.ty.clone()));
                compiler.scopes.bind(name, TypeInfo::array(shape.clone()));
                target = Value::array(target.value, shape);
            } else {
                compiler.scopes.bind(name, TypeInfo::of(target.ty.clone()));
            }
        } else if value.ty.is_array() {
            let shape = known_shape(compiler, value.array.clone())
                .ok_or_else(|| MK_UNKNOWN_TYPE!("element type of array `{}`", name))?;
            compiler.scopes.bind(name, TypeInfo::array(shape.clone()));
            target = Value::array(target.value, shape);
        } else if compiler.type_known(&value.ty) {
            compiler.scopes.bind(name, TypeInfo::of(value.ty.clone()));
            target.ty = value.ty.clone();
        } else {
            debug!(name = %name, "binding left untyped");
        }
    }

    let line = if target.index.is_some() {
        compiler.backend.format_index_assign(&target, &value)
    } else {
        compiler.backend.format_assign(&target, &value, fresh)
    };
    compiler.emit(line);
    Ok(())
}

fn known_shape(compiler: &Compiler, shape: Option<ArrayShape>) -> Option<ArrayShape> {
    shape.filter(|shape| compiler.type_known(&shape.element_type))
}

fn compile_aug_assign(compiler: &mut Compiler, assign: &AugAssignStmt) -> Result<(), Error> {
    if !matches!(assign.target, Operand::Var(_) | Operand::DotAccess(_)) {
        return Err(MK_UNSUPPORTED!(
            "augmented assignment to {}",
            assign.target.kind()
        ));
    }
    if assign.operator != Operator::Add {
        return Err(MK_UNSUPPORTED!(
            "augmented assignment with `{}`",
            assign.operator
        ));
    }

    let value = resolve_expression(compiler, &assign.expr)?;
    let target = resolve_operand(compiler, &assign.target)?;

    let line = if target.ty.is_array() {
        compiler.backend.format_array_append(&target, &value)
    } else if target.index.is_some() {
        compiler.backend.format_index_increment(&target, &value)
    } else if target.ty.is_numeric() {
        compiler.backend.format_increment(&target, &value)
    } else {
        return Err(MK_UNSUPPORTED!(
            "augmented assignment to `{}` of type {}",
            target.value,
            target.ty
        ));
    };
    compiler.emit(line);
    Ok(())
}

fn compile_if(compiler: &mut Compiler, stmt: &IfStmt) -> Result<(), Error> {
    let condition = resolve_expression(compiler, &stmt.expr)?;
    let line = compiler.backend.format_if(&condition);
    compiler.emit(line);
    compile_block(compiler, &stmt.block)?;

    for elif in &stmt.elifs {
        let condition = resolve_expression(compiler, &elif.expr)?;
        let line = compiler.backend.format_elif(&condition);
        compiler.emit(line);
        compile_block(compiler, &elif.block)?;
    }

    if let Some(block) = &stmt.else_block {
        let line = compiler.backend.format_else();
        compiler.emit(line);
        compile_block(compiler, block)?;
    }

    let line = compiler.backend.format_end_if();
    compiler.emit(line);
    Ok(())
}

/// Shared type of the range bounds: one type as is, an int/float mix as
/// float, anything else unknown.
fn range_type(bounds: &[&Value]) -> TypeTag {
    let mut distinct: Vec<&TypeTag> = vec![];
    for bound in bounds {
        if !distinct.contains(&&bound.ty) {
            distinct.push(&bound.ty);
        }
    }
    match distinct.as_slice() {
        [only] => (*only).clone(),
        [first, second] if first.is_numeric() && second.is_numeric() => TypeTag::Float,
        _ => TypeTag::Unknown,
    }
}

fn resolve_range(compiler: &mut Compiler, range: &RangeIterable) -> Result<Iteration, Error> {
    let from = resolve_expression(compiler, &range.from)?;
    let step = match &range.step {
        Some(step) => resolve_expression(compiler, step)?,
        None => Value::new("1", TypeTag::Int),
    };
    let to = resolve_expression(compiler, &range.to)?;
    let ty = range_type(&[&from, &step, &to]);
    Ok(Iteration::Range { from, step, to, ty })
}

fn compile_for(compiler: &mut Compiler, stmt: &ForStmt) -> Result<(), Error> {
    let last: &Var = stmt
        .vars
        .last()
        .ok_or_else(|| MK_UNSUPPORTED!("for loop without a loop variable"))?;

    let iteration = match &stmt.iterable {
        Iterable::Range(range) => resolve_range(compiler, range)?,
        Iterable::Expr(expr) => Iteration::Each(resolve_expression(compiler, expr)?),
    };
    let variables = stmt
        .vars
        .iter()
        .map(|var| resolve_var(compiler, var))
        .collect::<Result<Vec<_>, _>>()?;

    let line = compiler.backend.format_for(&variables, &iteration);
    compiler.emit(line);

    let element = match &iteration {
        Iteration::Range { ty, .. } => ty.clone(),
        Iteration::Each(value) if value.ty.is_array() => {
            value.element_type().cloned().unwrap_or_default()
        }
        Iteration::Each(value) if value.ty == TypeTag::Str => TypeTag::Str,
        Iteration::Each(_) => TypeTag::Unknown,
    };
    compiler.scopes.bind(&last.name, TypeInfo::of(element));

    compile_block(compiler, &stmt.block)?;
    let line = compiler.backend.format_end_for();
    compiler.emit(line);
    Ok(())
}
