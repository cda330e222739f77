//! Main compiler module.
//!
//! This module contains the `Compiler` structure that walks the syntax tree
//! once, tracking scopes and classes, and renders lines through the injected
//! backend. It also defines the engine configuration and the output handed
//! back to the driver.

use serde::Deserialize;
use std::{
    collections::{BTreeSet, HashMap},
    path::PathBuf,
    rc::Rc,
};

use tracing::debug;

use crate::{
    ast::{ast::Node, types::TypeTag},
    backend::backend::{Backend, Target, Value},
    errors::errors::Error,
    scope::scope::{type_known, ArrayShape, Scope, ScopeStack, Signature},
};

use super::{
    emitter::{self, Emitter},
    imports::{MemoryResolver, ModuleResolver},
    stmt,
};

/// Engine settings chosen at construction time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Output language.
    pub target: Target,
    /// Set when compiling an imported unit rather than the entry program.
    pub module: bool,
    /// Root of the standard library, consulted by directory based resolvers.
    pub standard_libs: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub ty: TypeTag,
    pub array: Option<ArrayShape>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    pub signature: Signature,
    pub return_type: TypeTag,
    pub scope: Scope,
    /// Lines of the method, spliced into the class after its attributes.
    pub code: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassInfo {
    /// Attributes and methods by name.
    pub scope: Scope,
    pub attributes: Vec<Attribute>,
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|method| method.name == name)
    }
}

/// Everything the driver needs to write the generated program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Output {
    pub hoisted: Vec<String>,
    pub main: Vec<String>,
    /// System library imports, already rendered.
    pub imports: BTreeSet<String>,
    /// Native libraries the program must be linked against.
    pub links: BTreeSet<String>,
    pub module: bool,
}

impl Output {
    /// Joins imports, hoisted definitions and main code and lays them out
    /// for the target.
    pub fn assemble(&self, backend: &dyn Backend) -> String {
        let mut lines: Vec<String> = self.imports.iter().cloned().collect();
        if !lines.is_empty() {
            lines.push(String::new());
        }
        if !self.hoisted.is_empty() {
            lines.extend(self.hoisted.iter().cloned());
            lines.push(String::new());
        }
        lines.extend(self.main.iter().cloned());

        let mut text = backend.layout(&lines).join("\n");
        text.push('\n');
        text
    }
}

/// The analysis engine.
///
/// One instance compiles one unit. Imports spin up a nested instance that
/// shares the backend and resolver and is merged back when it finishes.
pub struct Compiler {
    pub config: CompilerConfig,
    /// Name of the unit being compiled, used in diagnostics and cycle checks.
    pub unit: String,
    pub backend: Rc<dyn Backend>,
    pub resolver: Rc<dyn ModuleResolver>,
    pub scopes: ScopeStack,
    pub classes: HashMap<String, ClassInfo>,
    pub emitter: Emitter,
    pub imports: BTreeSet<String>,
    pub links: BTreeSet<String>,
    /// Function whose body is being compiled.
    pub in_func: Option<String>,
    pub in_class: Option<String>,
    /// Units that are importing this one, outermost first.
    pub import_chain: Vec<String>,
}

impl Compiler {
    /// Creates a compiler for the configured target.
    pub fn new(config: CompilerConfig, resolver: Rc<dyn ModuleResolver>) -> Self {
        let backend = config.target.backend();
        Compiler::with_backend(config, backend, resolver)
    }

    /// Creates a compiler around an explicit backend instance.
    pub fn with_backend(
        config: CompilerConfig,
        backend: Rc<dyn Backend>,
        resolver: Rc<dyn ModuleResolver>,
    ) -> Self {
        Compiler {
            config,
            unit: String::from("main"),
            backend,
            resolver,
            scopes: ScopeStack::new(),
            classes: HashMap::new(),
            emitter: Emitter::new(),
            imports: BTreeSet::new(),
            links: BTreeSet::new(),
            in_func: None,
            in_class: None,
            import_chain: vec![],
        }
    }

    pub fn named(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    /// Compiles a whole program. The first error aborts compilation.
    pub fn compile(&mut self, program: &[Node]) -> Result<(), Error> {
        debug!(unit = %self.unit, statements = program.len(), "compiling unit");
        stmt::compile_block(self, program).map_err(|error| error.in_unit(&self.unit))
    }

    pub fn finish(self) -> Output {
        let (hoisted, main) = self.emitter.into_buffers();
        Output {
            hoisted,
            main,
            imports: self.imports,
            links: self.links,
            module: self.config.module,
        }
    }

    pub fn type_known(&self, ty: &TypeTag) -> bool {
        type_known(ty, &self.backend.unknown_type())
    }

    /// Runs `body` in a fresh scope and returns its result together with the
    /// scope as it was when `body` finished. The scope is popped on every path.
    pub fn with_scope<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<(T, Scope), Error> {
        self.scopes.enter();
        let result = body(self);
        let scope = self.scopes.exit();
        result.map(|value| (value, scope))
    }

    /// Runs `body` with lines going to `target`.
    pub fn with_target<T>(
        &mut self,
        target: emitter::Target,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.emitter.push(target);
        let result = body(self);
        self.emitter.pop();
        result
    }

    /// Runs `body` with lines going out of the main flow.
    pub fn with_definition<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.emitter.push_definition();
        let result = body(self);
        self.emitter.pop();
        result
    }

    pub fn emit(&mut self, line: impl Into<String>) {
        self.emitter.emit(line);
    }
}

/// Compiles `program` for the configured target, treating every import as a
/// system library.
pub fn transpile(program: &[Node], config: CompilerConfig) -> Result<Output, Error> {
    transpile_with(program, config, Rc::new(MemoryResolver::default()))
}

/// Compiles `program`, resolving imports through `resolver`.
pub fn transpile_with(
    program: &[Node],
    config: CompilerConfig,
    resolver: Rc<dyn ModuleResolver>,
) -> Result<Output, Error> {
    let mut compiler = Compiler::new(config, resolver);
    compiler.compile(program)?;
    Ok(compiler.finish())
}
