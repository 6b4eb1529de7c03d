//! Intermediate representation shared by both signature parsers and every
//! generator.
//!
//! Everything here is created fresh per run from parsed headers. The
//! processor prunes methods out of a `ClassInfo` but never edits a
//! `MethodInfo` in place.

use serde::Serialize;

/// One class or struct as it comes out of a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub methods: Vec<MethodInfo>,
    pub enums: Vec<EnumInfo>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            enums: Vec::new(),
        }
    }

    pub fn with_methods(mut self, methods: Vec<MethodInfo>) -> Self {
        self.methods = methods;
        self
    }
}

/// A single method declaration.
///
/// Overload identity is `(owning class, name, parameter raw types)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodInfo {
    pub name: String,
    /// Raw spelling, unnormalized (`const char*`, `bool`, `M5GFX&` ...).
    pub return_type: String,
    pub parameters: Vec<ParameterInfo>,
    pub is_static: bool,
}

impl MethodInfo {
    pub fn new(
        name: impl Into<String>,
        return_type: impl Into<String>,
        parameters: Vec<ParameterInfo>,
    ) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            parameters,
            is_static: false,
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Return type and every parameter type, in declaration order.
    pub fn signature_types(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.return_type.as_str())
            .chain(self.parameters.iter().map(|p| p.ty.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    pub ty: String,
    /// Parser heuristics may leave this empty or hand back garbage such as a
    /// default-value expression; the naming module sanitizes it.
    pub name: Option<String>,
}

impl ParameterInfo {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: Some(name.into()),
        }
    }

    pub fn unnamed(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumInfo {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub is_scoped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    pub name: String,
    /// `None` when the initializer could not be evaluated.
    pub value: Option<i64>,
}

/// Everything extracted from one header tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedApi {
    pub classes: Vec<ClassInfo>,
    /// Enums declared outside any class.
    pub enums: Vec<EnumInfo>,
}
