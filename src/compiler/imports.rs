//! Module import resolution.
//!
//! The host tells the engine what an imported name refers to through a
//! `ModuleResolver`. Local units are compiled by a nested `Compiler` sharing
//! the backend and resolver; its classes, top-level bindings, imports, links
//! and output lines are merged into the importer.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use tracing::debug;

use crate::{
    ast::ast::{parse_program, Node},
    errors::errors::{Error, ErrorImpl},
    MK_UNSUPPORTED,
};

use super::compiler::{Compiler, CompilerConfig};

/// What an imported name refers to. Exactly one category applies.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleSource {
    /// A unit of the source language, already parsed.
    Local(Vec<Node>),
    Standard,
    NativeStandard,
    NativeLocal,
    /// Passed through to the target as a library import.
    System,
}

pub trait ModuleResolver {
    fn resolve(&self, name: &str) -> Result<ModuleSource, Error>;
}

/// Resolver backed by a map. Unknown names are system libraries.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    modules: HashMap<String, ModuleSource>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        MemoryResolver::default()
    }

    pub fn insert(&mut self, name: &str, source: ModuleSource) {
        self.modules.insert(name.to_string(), source);
    }

    pub fn with_module(mut self, name: &str, program: Vec<Node>) -> Self {
        self.insert(name, ModuleSource::Local(program));
        self
    }
}

impl ModuleResolver for MemoryResolver {
    fn resolve(&self, name: &str) -> Result<ModuleSource, Error> {
        Ok(self
            .modules
            .get(name)
            .cloned()
            .unwrap_or(ModuleSource::System))
    }
}

/// Resolver that looks on disk.
///
/// Checked in order: `<root>/<name>.json` (a local unit in the parser's JSON
/// form), `<standard_libs>/<name>.w`, `<standard_libs>/native/<lang>/<name>.<ext>`
/// and `<root>/<name>.<ext>`. Anything else is a system library.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    pub root: PathBuf,
    pub standard_libs: PathBuf,
    pub lang: String,
    pub lib_extension: String,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>, config: &CompilerConfig) -> Self {
        DirectoryResolver {
            root: root.into(),
            standard_libs: config.standard_libs.clone(),
            lang: config.target.to_string(),
            lib_extension: String::from("wext"),
        }
    }

    fn load_local(&self, name: &str, path: &Path) -> Result<ModuleSource, Error> {
        let source = fs::read_to_string(path).map_err(|error| {
            Error::new(ErrorImpl::ModuleLoad {
                module: name.to_string(),
                message: error.to_string(),
            })
        })?;
        let program = parse_program(&source).map_err(|error| {
            Error::new(ErrorImpl::ModuleLoad {
                module: name.to_string(),
                message: error.to_string(),
            })
        })?;
        Ok(ModuleSource::Local(program))
    }
}

impl ModuleResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Result<ModuleSource, Error> {
        let local = self.root.join(format!("{}.json", name));
        if local.is_file() {
            return self.load_local(name, &local);
        }

        if !self.standard_libs.as_os_str().is_empty() {
            if self.standard_libs.join(format!("{}.w", name)).is_file() {
                return Ok(ModuleSource::Standard);
            }
            let native = self
                .standard_libs
                .join("native")
                .join(&self.lang)
                .join(format!("{}.{}", name, self.lib_extension));
            if native.is_file() {
                return Ok(ModuleSource::NativeStandard);
            }
        }

        if self
            .root
            .join(format!("{}.{}", name, self.lib_extension))
            .is_file()
        {
            return Ok(ModuleSource::NativeLocal);
        }
        Ok(ModuleSource::System)
    }
}

pub fn compile_import(compiler: &mut Compiler, name: &str) -> Result<(), Error> {
    let source = compiler.resolver.resolve(name)?;
    debug!(module = %name, unit = %compiler.unit, "resolving import");

    match source {
        ModuleSource::Local(program) => import_local(compiler, name, &program),
        ModuleSource::Standard => Err(MK_UNSUPPORTED!(
            "import of standard library module `{}`",
            name
        )),
        ModuleSource::NativeStandard => Err(MK_UNSUPPORTED!(
            "import of native standard library `{}`",
            name
        )),
        ModuleSource::NativeLocal => Err(MK_UNSUPPORTED!(
            "import of native local library `{}`",
            name
        )),
        ModuleSource::System => {
            let line = compiler.backend.format_system_lib_import(name);
            compiler.imports.insert(line);
            Ok(())
        }
    }
}

fn import_local(compiler: &mut Compiler, name: &str, program: &[Node]) -> Result<(), Error> {
    let mut chain = compiler.import_chain.clone();
    chain.push(compiler.unit.clone());
    if chain.iter().any(|unit| unit == name) {
        chain.push(name.to_string());
        return Err(Error::new(ErrorImpl::CircularImport {
            module: name.to_string(),
            chain: chain.join(" -> "),
        }));
    }

    let config = CompilerConfig {
        module: true,
        ..compiler.config.clone()
    };
    let mut nested = Compiler::with_backend(
        config,
        Rc::clone(&compiler.backend),
        Rc::clone(&compiler.resolver),
    )
    .named(name);
    nested.import_chain = chain;
    nested.compile(program)?;

    let Compiler {
        scopes,
        classes,
        emitter,
        imports,
        links,
        ..
    } = nested;
    compiler.classes.extend(classes);
    compiler.scopes.merge(scopes.current().clone());
    compiler.imports.extend(imports);
    compiler.links.extend(links);
    let (hoisted, main) = emitter.into_buffers();
    compiler.emitter.merge(hoisted, main);
    Ok(())
}
