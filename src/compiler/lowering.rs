//! Function and class lowering.
//!
//! A function without a declared return type is compiled twice: a dry run
//! with output suppressed collects the types of its `return` statements, then
//! the real pass emits the definition with the inferred type. Classes compile
//! each method into a private capture buffer and splice the buffers back in
//! after the attributes.

use std::collections::HashSet;

use tracing::debug;

use crate::{
    ast::{
        ast::Node,
        expressions::Operand,
        statements::{AssignStmt, ClassDecl, FuncDecl, Param},
        types::TypeTag,
    },
    errors::errors::Error,
    scope::scope::{type_known, ArrayShape, Signature, TypeInfo},
    MK_UNSUPPORTED,
};

use super::{
    compiler::{Attribute, ClassInfo, Compiler, MethodInfo},
    emitter::Target,
    expr::{resolve_expression, resolve_kwargs, resolve_var},
    stmt::compile_block,
};

/// Compiles a function declaration and binds it in the current scope.
pub fn compile_func(compiler: &mut Compiler, func: &FuncDecl) -> Result<(), Error> {
    let info = lower_function(compiler, func, None)?;
    compiler.scopes.bind(&func.name, info);
    Ok(())
}

/// Compiles a function or method without binding it. `receiver` is the
/// implicit first parameter of a method.
pub fn lower_function(
    compiler: &mut Compiler,
    func: &FuncDecl,
    receiver: Option<Param>,
) -> Result<TypeInfo, Error> {
    let mut args: Vec<Param> = receiver.into_iter().collect();
    args.extend(func.args.iter().cloned());
    let kwargs = resolve_kwargs(compiler, &func.kwargs)?;
    let signature = Signature { args, kwargs };

    let previous = compiler.in_func.replace(func.name.clone());
    let result = lower_function_body(compiler, func, signature);
    compiler.in_func = previous;
    result
}

fn lower_function_body(
    compiler: &mut Compiler,
    func: &FuncDecl,
    signature: Signature,
) -> Result<TypeInfo, Error> {
    let returned = if compiler.type_known(&func.ty) {
        TypeInfo::function(func.ty.clone(), Signature::default())
    } else {
        infer_return_type(compiler, func, &signature)?
    };
    let return_type = returned.ty;
    let array = returned.array;
    debug!(func = %func.name, return_type = %return_type, "lowering function");

    let ((), body) = compiler.with_scope(|compiler| {
        compiler.scopes.bind(
            &func.name,
            TypeInfo {
                array: array.clone(),
                ..TypeInfo::function(return_type.clone(), signature.clone())
            },
        );
        bind_params(compiler, &signature);

        compiler.with_definition(|compiler| {
            let header = compiler.backend.format_func(
                &func.name,
                &return_type,
                &signature.args,
                &signature.kwargs,
            );
            compiler.emit(header);
            compile_block(compiler, &func.block)?;
            let end = compiler.backend.format_end_func();
            compiler.emit(end);
            Ok(())
        })
    })?;

    Ok(TypeInfo {
        ty: return_type,
        array,
        signature: Some(signature),
        body: Some(body),
    })
}

fn bind_params(compiler: &mut Compiler, signature: &Signature) {
    for arg in &signature.args {
        compiler.scopes.bind(&arg.name, TypeInfo::of(arg.ty.clone()));
    }
    for kwarg in &signature.kwargs {
        compiler.scopes.bind(&kwarg.name, TypeInfo::of(kwarg.ty.clone()));
    }
}

/// Dry run over a copy of the body with output suppressed. The first known
/// return type wins, along with its array shape; a body without one returns
/// void.
pub fn infer_return_type(
    compiler: &mut Compiler,
    func: &FuncDecl,
    signature: &Signature,
) -> Result<TypeInfo, Error> {
    let block = func.block.clone();
    let unknown = compiler.backend.unknown_type();

    compiler.with_target(Target::Suppressed, |compiler| {
        let (info, _) = compiler.with_scope(|compiler| {
            bind_params(compiler, signature);
            compile_block(compiler, &block)?;
            Ok(compiler
                .scopes
                .first_known_return(|ty| type_known(ty, &unknown))
                .unwrap_or_else(|| TypeInfo::of(TypeTag::Void)))
        })?;
        Ok(info)
    })
}

pub fn compile_class(compiler: &mut Compiler, class: &ClassDecl) -> Result<(), Error> {
    debug!(class = %class.name, "lowering class");
    compiler
        .classes
        .insert(class.name.clone(), ClassInfo::default());

    let previous = compiler.in_class.replace(class.name.clone());
    let result = compiler.with_definition(|compiler| lower_class(compiler, class));
    compiler.in_class = previous;
    result
}

fn lower_class(compiler: &mut Compiler, class: &ClassDecl) -> Result<(), Error> {
    let header = compiler.backend.format_class(&class.name, &class.args);
    compiler.emit(header);
    register_methods(compiler, class)?;

    // Attributes first: a method body may read one declared below it.
    compiler.with_scope(|compiler| {
        for node in &class.block {
            match node {
                Node::Assign(assign) => compile_attribute(compiler, &class.name, assign)?,
                Node::Func(_) | Node::Comment { .. } => {}
                other => {
                    return Err(MK_UNSUPPORTED!(
                        "`{}` statement in the body of class `{}`",
                        other.kind(),
                        class.name
                    ))
                }
            }
        }
        for node in &class.block {
            if let Node::Func(func) = node {
                compile_method(compiler, &class.name, func)?;
            }
        }
        Ok(())
    })?;

    let methods_inside = compiler.backend.methods_inside_class();
    if !methods_inside {
        let end = compiler.backend.format_end_class();
        compiler.emit(end);
    }
    let methods = compiler
        .classes
        .get(&class.name)
        .map(|info| info.methods.clone())
        .unwrap_or_default();
    for method in methods {
        compiler.emit("");
        for line in method.code {
            compiler.emit(line);
        }
    }
    if methods_inside {
        let end = compiler.backend.format_end_class();
        compiler.emit(end);
    }
    Ok(())
}

fn receiver(compiler: &Compiler, class_name: &str) -> Param {
    Param {
        name: compiler.backend.receiver_name().to_string(),
        ty: TypeTag::Class(class_name.to_string()),
    }
}

/// Records every method signature before any body is compiled, so methods can
/// call each other regardless of order.
fn register_methods(compiler: &mut Compiler, class: &ClassDecl) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for node in &class.block {
        let Node::Func(func) = node else {
            continue;
        };
        if !seen.insert(func.name.as_str()) {
            if func.name == compiler.backend.constructor_name() {
                return Err(MK_UNSUPPORTED!(
                    "class `{}` declares more than one constructor",
                    class.name
                ));
            }
            return Err(MK_UNSUPPORTED!(
                "duplicate method `{}` in class `{}`",
                func.name,
                class.name
            ));
        }

        let mut args = vec![receiver(compiler, &class.name)];
        args.extend(func.args.iter().cloned());
        let kwargs = resolve_kwargs(compiler, &func.kwargs)?;
        let info = TypeInfo::function(func.ty.clone(), Signature { args, kwargs });

        if let Some(class_info) = compiler.classes.get_mut(&class.name) {
            class_info.scope.insert(func.name.clone(), info);
        }
    }
    Ok(())
}

fn compile_method(compiler: &mut Compiler, class_name: &str, func: &FuncDecl) -> Result<(), Error> {
    let receiver = receiver(compiler, class_name);

    compiler.emitter.begin_capture();
    let result = lower_function(compiler, func, Some(receiver));
    let code = compiler.emitter.end_capture();
    let info = result?;

    let class = compiler
        .classes
        .get_mut(class_name)
        .ok_or_else(|| MK_UNSUPPORTED!("method `{}` outside of a class", func.name))?;
    class.scope.insert(
        func.name.clone(),
        TypeInfo {
            body: None,
            ..info.clone()
        },
    );
    class.methods.push(MethodInfo {
        name: func.name.clone(),
        signature: info.signature.unwrap_or_default(),
        return_type: info.ty,
        scope: info.body.unwrap_or_default(),
        code,
    });
    Ok(())
}

fn compile_attribute(
    compiler: &mut Compiler,
    class_name: &str,
    assign: &AssignStmt,
) -> Result<(), Error> {
    let Operand::Var(target) = &assign.target else {
        return Err(MK_UNSUPPORTED!(
            "class attribute assigned through {}",
            assign.target.kind()
        ));
    };
    let mut attribute = resolve_var(compiler, target)?;

    let mut expr = assign.expr.clone();
    if let Some(literal) = expr.first_array_mut() {
        if attribute.ty.is_array() {
            if let Some(shape) = &attribute.array {
                if !compiler.type_known(&literal.element_type) {
                    literal.element_type = shape.element_type.clone();
                }
            }
        } else if compiler.type_known(&attribute.ty) {
            // `xs: int = [...]` names the element type.
            literal.element_type = attribute.ty.clone();
            attribute.ty = TypeTag::Array;
        }
    }
    let value = resolve_expression(compiler, &expr)?;

    if !compiler.type_known(&attribute.ty) || value.ty.is_array() {
        attribute.ty = value.ty.clone();
    }
    attribute.array = if attribute.ty.is_array() {
        value
            .array
            .clone()
            .or(attribute.array)
            .or(Some(ArrayShape::of(TypeTag::Unknown)))
    } else {
        None
    };

    let line = compiler
        .backend
        .format_class_attribute(&attribute, &value);
    compiler.emit(line);

    let class = compiler
        .classes
        .get_mut(class_name)
        .ok_or_else(|| MK_UNSUPPORTED!("attribute `{}` outside of a class", target.name))?;
    class.scope.insert(
        target.name.clone(),
        TypeInfo {
            ty: attribute.ty.clone(),
            array: attribute.array.clone(),
            signature: None,
            body: None,
        },
    );
    class.attributes.push(Attribute {
        name: target.name.clone(),
        ty: attribute.ty,
        array: attribute.array,
        value,
    });
    Ok(())
}
