//! Loaded API model. Immutable once built by [`crate::loader`].
//!
//! Type positions still hold the raw type token from the description; the
//! normalizer turns them into [`crate::ir::TypeExpr`] once the whole model is
//! known (name resolution needs every class and enum of every module).

/// Whole description, modules in source order.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub description: String,
    pub classes: Vec<ClassType>,
    pub functions: Vec<Function>,
    pub enums: Vec<EnumType>,
}

#[derive(Debug, Clone)]
pub struct ClassType {
    pub name: String,
    pub description: String,
    /// Inheritance chain, most-derived first.
    pub supertypes: Vec<String>,
    pub methods: Vec<Function>,
}

/// Decides `.` vs `:` call form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Module(String),
    Class(String),
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub owner: Owner,
    pub description: String,
    /// Never empty (checked at load time).
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Default)]
pub struct Variant {
    pub params: Vec<Param>,
    pub returns: Vec<ReturnSpec>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub raw_type: String,
    pub optional: bool,
    pub default: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ReturnSpec {
    pub name: Option<String>,
    pub raw_type: String,
    pub optional: bool,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub description: String,
    pub constants: Vec<EnumConstant>,
}

#[derive(Debug, Clone)]
pub struct EnumConstant {
    pub value: String,
    pub description: String,
}

pub const VARARGS_NAME: &str = "...";

impl Param {
    pub fn is_varargs(&self) -> bool {
        self.name == VARARGS_NAME
    }
}

impl Variant {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(Param::is_varargs)
    }
}

impl Model {
    /// Every class and enum name the model defines, for NamedRef resolution.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().flat_map(|m| {
            m.classes.iter().map(|c| c.name.as_str())
                .chain(m.enums.iter().map(|e| e.name.as_str()))
        })
    }
}
