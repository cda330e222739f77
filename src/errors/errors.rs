use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    unit: Option<String>,
}

impl Error {
    pub fn new(error_impl: ErrorImpl) -> Self {
        Error {
            internal_error: error_impl,
            unit: None,
        }
    }

    /// Tags the error with the compilation unit it was raised in.
    ///
    /// An error that already names a unit keeps it, so the innermost import wins.
    pub fn in_unit(mut self, unit: &str) -> Self {
        if self.unit.is_none() {
            self.unit = Some(unit.to_string());
        }
        self
    }

    pub fn get_unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnsupportedConstruct { .. } => "UnsupportedConstruct",
            ErrorImpl::UnknownTypeFallthrough { .. } => "UnknownTypeFallthrough",
            ErrorImpl::CircularImport { .. } => "CircularImport",
            ErrorImpl::ModuleLoad { .. } => "ModuleLoad",
            ErrorImpl::InvalidAst { .. } => "InvalidAst",
            ErrorImpl::UnknownTarget { .. } => "UnknownTarget",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnsupportedConstruct { .. } => ErrorTip::Suggestion(String::from(
                "This construct is not lowered by the transpiler yet",
            )),
            ErrorImpl::UnknownTypeFallthrough { .. } => ErrorTip::Suggestion(String::from(
                "Add an explicit type annotation",
            )),
            ErrorImpl::CircularImport { chain, .. } => {
                ErrorTip::Suggestion(format!("Import chain: {}", chain))
            }
            ErrorImpl::ModuleLoad { .. } => ErrorTip::None,
            ErrorImpl::InvalidAst { .. } => ErrorTip::Suggestion(String::from(
                "The parser output does not match the expected node shapes",
            )),
            ErrorImpl::UnknownTarget { target } => {
                ErrorTip::Suggestion(format!("No backend is registered for `{}`", target))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{}: {}", unit, self.internal_error),
            None => write!(f, "{}", self.internal_error),
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorImpl> for Error {
    fn from(error_impl: ErrorImpl) -> Self {
        Error::new(error_impl)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },
    #[error("could not infer a type for {context}")]
    UnknownTypeFallthrough { context: String },
    #[error("circular import of module {module:?}")]
    CircularImport { module: String, chain: String },
    #[error("failed to load module {module:?}: {message}")]
    ModuleLoad { module: String, message: String },
    #[error("invalid syntax tree: {message}")]
    InvalidAst { message: String },
    #[error("unknown target {target:?}")]
    UnknownTarget { target: String },
}
