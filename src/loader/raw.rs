//! Serde shapes of the external description. Loosely typed on purpose; the
//! parent module validates them into [`crate::model`] once.
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Top level: modules keyed by name, in document order.
pub type RawDescription = IndexMap<String, RawModule>;

#[derive(Debug, Deserialize)]
pub struct RawModule {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub types: Vec<RawClass>,
    #[serde(default)]
    pub functions: Vec<RawFunction>,
    #[serde(default)]
    pub enums: Vec<RawEnum>,
}

#[derive(Debug, Deserialize)]
pub struct RawClass {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default, alias = "methods")]
    pub functions: Vec<RawFunction>,
}

#[derive(Debug, Deserialize)]
pub struct RawFunction {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub variants: Vec<RawVariant>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVariant {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub arguments: Vec<RawArgument>,
    #[serde(default)]
    pub returns: Vec<RawReturn>,
}

#[derive(Debug, Deserialize)]
pub struct RawArgument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub optional: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RawReturn {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: RawType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Deserialize)]
pub struct RawEnum {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub constants: Vec<RawConstant>,
}

#[derive(Debug, Deserialize)]
pub struct RawConstant {
    #[serde(alias = "value")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A type position: usually a token string, sometimes a nested structure.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawType {
    Token(String),
    /// `["number", "string"]` → alternatives.
    Alternatives(Vec<RawType>),
    /// `{"x": "number", "y": "number"}` → table literal.
    Table(IndexMap<String, RawType>),
}

impl RawType {
    /// Flatten into the token grammar the normalizer parses.
    pub fn to_token(&self) -> String {
        match self {
            RawType::Token(s) => s.clone(),
            RawType::Alternatives(xs) => xs.iter()
                .map(RawType::to_token)
                .collect::<Vec<_>>()
                .join(" or "),
            RawType::Table(fields) => {
                let body = fields.iter()
                    .map(|(k, v)| format!("{k}: {}", v.to_token()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{body}}}")
            }
        }
    }
}

/// Default literals are kept as source text.
pub fn default_literal(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_types_flatten_to_tokens() {
        let ty: RawType = serde_json::from_str(r#"["number", {"x": "number", "y": ["string", "nil"]}]"#).unwrap();
        assert_eq!(ty.to_token(), "number or {x: number, y: string or nil}");
    }

    #[test]
    fn default_literals_keep_source_text() {
        assert_eq!(default_literal(&Value::from("nil")), Some("nil".to_string()));
        assert_eq!(default_literal(&serde_json::json!(0.5)), Some("0.5".to_string()));
        assert_eq!(default_literal(&Value::Null), None);
    }
}
