use lazy_static::lazy_static;
use regex::Regex;
use std::{collections::HashMap, mem};

use crate::ast::{statements::Param, types::TypeTag};

lazy_static! {
    static ref INTEGER_LITERAL: Regex = Regex::new("^[+-]?[0-9]+$").unwrap();
    static ref DECIMAL_LITERAL: Regex =
        Regex::new("^[+-]?([0-9]+\\.[0-9]*|\\.[0-9]+)([eE][+-]?[0-9]+)?$").unwrap();
}

/// Element type and declared size of an array binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayShape {
    pub element_type: TypeTag,
    pub size: Option<String>,
}

impl ArrayShape {
    pub fn of(element_type: TypeTag) -> Self {
        ArrayShape {
            element_type,
            size: None,
        }
    }
}

/// A keyword parameter or keyword argument with its rendered value.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordValue {
    pub name: String,
    pub ty: TypeTag,
    pub value: String,
}

/// Parameter lists of a function, kept so later call sites can reorder keywords.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub args: Vec<Param>,
    pub kwargs: Vec<KeywordValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub ty: TypeTag,
    /// Present whenever `ty` is an array.
    pub array: Option<ArrayShape>,
    /// Present for functions and methods.
    pub signature: Option<Signature>,
    /// Final body scope of a compiled function.
    pub body: Option<Scope>,
}

impl TypeInfo {
    /// Plain binding. An array type without further information gets an
    /// unknown element type so the array invariant holds.
    pub fn of(ty: TypeTag) -> Self {
        let array = ty.is_array().then(|| ArrayShape::of(TypeTag::Unknown));
        TypeInfo {
            ty,
            array,
            signature: None,
            body: None,
        }
    }

    pub fn array(shape: ArrayShape) -> Self {
        TypeInfo {
            ty: TypeTag::Array,
            array: Some(shape),
            signature: None,
            body: None,
        }
    }

    pub fn function(return_type: TypeTag, signature: Signature) -> Self {
        let array = return_type
            .is_array()
            .then(|| ArrayShape::of(TypeTag::Unknown));
        TypeInfo {
            ty: return_type,
            array,
            signature: Some(signature),
            body: None,
        }
    }
}

pub type Scope = HashMap<String, TypeInfo>;

/// `true` unless the tag is the `unknown` sentinel or a class spelled like the
/// backend's own name for unknown.
pub fn type_known(tag: &TypeTag, unknown_spelling: &str) -> bool {
    match tag {
        TypeTag::Unknown => false,
        TypeTag::Class(name) => name != unknown_spelling,
        _ => true,
    }
}

/// Types a bare token by its literal shape: a `.` selects the decimal check,
/// otherwise the integer check; anything else is unknown.
pub fn literal_type(token: &str) -> TypeTag {
    if token.contains('.') {
        if DECIMAL_LITERAL.is_match(token) {
            return TypeTag::Float;
        }
    } else if INTEGER_LITERAL.is_match(token) {
        return TypeTag::Int;
    }
    TypeTag::Unknown
}

/// Current scope plus the saved enclosing scopes.
///
/// The return accumulator belongs to the innermost function region: it is
/// reset on `enter` and the enclosing one comes back on `exit`. Each entry
/// keeps the array shape of the returned value.
#[derive(Debug, Default)]
pub struct ScopeStack {
    current: Scope,
    saved: Vec<(Scope, Vec<TypeInfo>)>,
    returns: Vec<TypeInfo>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack::default()
    }

    pub fn enter(&mut self) {
        let returns = mem::take(&mut self.returns);
        self.saved.push((self.current.clone(), returns));
    }

    /// Restores the enclosing scope and returns the one that was active.
    pub fn exit(&mut self) -> Scope {
        match self.saved.pop() {
            Some((scope, returns)) => {
                self.returns = returns;
                mem::replace(&mut self.current, scope)
            }
            None => self.current.clone(),
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn current(&self) -> &Scope {
        &self.current
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeInfo> {
        self.current.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.current.contains_key(name)
    }

    pub fn bind(&mut self, name: &str, info: TypeInfo) {
        self.current.insert(name.to_string(), info);
    }

    pub fn remove(&mut self, name: &str) -> Option<TypeInfo> {
        self.current.remove(name)
    }

    /// Copies every binding of `scope` over the current one.
    pub fn merge(&mut self, scope: Scope) {
        self.current.extend(scope);
    }

    /// Scope lookup first, then the literal shape of the token.
    pub fn resolve_type(&self, name: &str) -> TypeTag {
        match self.current.get(name) {
            Some(info) => info.ty.clone(),
            None => literal_type(name),
        }
    }

    /// Records one `return`. Types are kept once each; a later array return
    /// fills in the element type when the first one left it unknown.
    pub fn record_return(&mut self, ty: TypeTag, array: Option<ArrayShape>) {
        match self.returns.iter_mut().find(|info| info.ty == ty) {
            Some(seen) => {
                if let (Some(shape), Some(array)) = (seen.array.as_mut(), array) {
                    if shape.element_type == TypeTag::Unknown {
                        *shape = array;
                    }
                }
            }
            None => {
                let array = if ty.is_array() {
                    array.or_else(|| Some(ArrayShape::of(TypeTag::Unknown)))
                } else {
                    None
                };
                self.returns.push(TypeInfo {
                    ty,
                    array,
                    signature: None,
                    body: None,
                });
            }
        }
    }

    pub fn return_types(&self) -> Vec<TypeTag> {
        self.returns.iter().map(|info| info.ty.clone()).collect()
    }

    /// First candidate, in the order returns were met, whose type passes
    /// `known`.
    pub fn first_known_return(&self, known: impl Fn(&TypeTag) -> bool) -> Option<TypeInfo> {
        self.returns.iter().find(|info| known(&info.ty)).cloned()
    }
}
