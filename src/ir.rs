// Strongly-typed IR for emission. No raw type tokens here.

use crate::model::Owner;

/// Target type grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Primitive(String),                 // canonical spelling, e.g. `lightuserdata`
    NamedRef(String),                  // class/enum of the model, or opaque host type
    Union(Vec<TypeExpr>),              // >= 2 distinct alternatives
    TableLiteral {
        fields: Vec<(String, TypeExpr)>, // stable source order
        open: bool,                      // leading `...` entry
    },
    Varargs(Box<TypeExpr>),
}

#[derive(Debug, Clone)]
pub struct NModule {
    pub name: String,
    pub description: String,
    pub classes: Vec<NClass>,
    pub enums: Vec<NEnum>,
    pub functions: Vec<NFunction>,
}

#[derive(Debug, Clone)]
pub struct NClass {
    pub name: String,
    pub qualified: String,
    pub description: String,
    pub supertypes: Vec<String>,     // rendered, qualified where resolvable
    pub methods: Vec<NFunction>,
}

#[derive(Debug, Clone)]
pub struct NFunction {
    pub name: String,
    pub owner: Owner,
    pub description: String,
    pub primary: NSignature,
    pub alternates: Vec<NSignature>, // resolver order
}

#[derive(Debug, Clone)]
pub struct NSignature {
    pub params: Vec<NParam>,
    pub returns: Vec<NReturn>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NParam {
    pub name: String,
    pub ty: TypeExpr,
    pub base: String,                // rendered, without the optional suffix
    pub rendered: String,            // includes the optional suffix
    pub optional: bool,
    pub default: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NReturn {
    pub name: Option<String>,
    pub ty: TypeExpr,
    pub base: String,
    pub rendered: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NEnum {
    pub name: String,
    pub qualified: String,
    pub description: String,
    pub constants: Vec<(String, String)>, // (value, description), source order
}
