//! Model loader: external description → validated [`Model`].
//!
//! Every shape rule is checked here, once. Later stages pattern-match on the
//! model without re-validating. Any violation aborts the run.
pub mod raw;

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::model::{
    ClassType, EnumConstant, EnumType, Function, Model, Module, Owner, Param, ReturnSpec, Variant,
};
use raw::{RawDescription, RawFunction, RawModule, RawVariant};

/// Load and merge several description files, in argument order.
pub fn load_files<P: AsRef<Path>>(paths: &[P], json_pointer: Option<&str>) -> Result<Model, LoadError> {
    let mut model = Model::default();
    for path in paths {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let part = load_str(&source, &path.to_string_lossy(), json_pointer)?;
        merge(&mut model, part)?;
    }
    Ok(model)
}

/// Load one description document. `origin` names it in error messages.
pub fn load_str(source: &str, origin: &str, json_pointer: Option<&str>) -> Result<Model, LoadError> {
    let raw: RawDescription = match json_pointer {
        None => crate::path_de::from_str_with_path(source, origin)?,
        Some(pointer) => {
            let doc: Value = crate::path_de::from_str_with_path(source, origin)?;
            let node = doc.pointer(pointer).cloned().ok_or_else(|| {
                LoadError::malformed(origin, format!("JSON pointer {pointer} selects nothing"))
            })?;
            crate::path_de::from_value_with_path(node, origin)?
        }
    };
    from_raw(raw)
}

pub fn from_raw(raw: RawDescription) -> Result<Model, LoadError> {
    let modules = raw
        .into_iter()
        .map(|(name, module)| load_module(name, module))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(modules = modules.len(), "loaded description");
    Ok(Model { modules })
}

fn merge(into: &mut Model, part: Model) -> Result<(), LoadError> {
    for module in part.modules {
        if into.modules.iter().any(|m| m.name == module.name) {
            return Err(LoadError::malformed(&module.name, "module defined by more than one input"));
        }
        into.modules.push(module);
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATING CONVERSION
// ————————————————————————————————————————————————————————————————————————————

fn load_module(name: String, raw: RawModule) -> Result<Module, LoadError> {
    require_name(&name, "module")?;

    let mut classes = Vec::with_capacity(raw.types.len());
    for class in raw.types {
        let path = format!("{name}.{}", class.name);
        require_name(&class.name, &path)?;
        let owner = Owner::Class(class.name.clone());
        let methods = class.functions
            .into_iter()
            .map(|f| load_function(&path, owner.clone(), f))
            .collect::<Result<Vec<_>, _>>()?;
        classes.push(ClassType {
            name: class.name,
            description: class.description,
            supertypes: class.supertypes,
            methods,
        });
    }

    let owner = Owner::Module(name.clone());
    let functions = raw.functions
        .into_iter()
        .map(|f| load_function(&name, owner.clone(), f))
        .collect::<Result<Vec<_>, _>>()?;

    let mut enums = Vec::with_capacity(raw.enums.len());
    for e in raw.enums {
        let path = format!("{name}.{}", e.name);
        require_name(&e.name, &path)?;
        enums.push(EnumType {
            name: e.name,
            description: e.description,
            constants: e.constants
                .into_iter()
                .map(|c| EnumConstant { value: c.name, description: c.description })
                .collect(),
        });
    }

    Ok(Module { name, description: raw.description, classes, functions, enums })
}

fn load_function(parent: &str, owner: Owner, raw: RawFunction) -> Result<Function, LoadError> {
    let path = format!("{parent}.{}", raw.name);
    require_name(&raw.name, &path)?;
    if raw.variants.is_empty() {
        return Err(LoadError::malformed(path, "function has no variants"));
    }
    let variants = raw.variants
        .into_iter()
        .enumerate()
        .map(|(i, v)| load_variant(&format!("{path}#{}", i + 1), v))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Function { name: raw.name, owner, description: raw.description, variants })
}

fn load_variant(path: &str, raw: RawVariant) -> Result<Variant, LoadError> {
    let count = raw.arguments.len();
    let mut params = Vec::with_capacity(count);
    for (i, arg) in raw.arguments.into_iter().enumerate() {
        let arg_path = format!("{path}.{}", arg.name);
        require_name(&arg.name, &arg_path)?;
        let default = arg.default.as_ref().and_then(raw::default_literal);
        let optional = match (arg.optional, &default) {
            (Some(false), Some(_)) => {
                return Err(LoadError::malformed(arg_path, "argument has a default but is marked required"));
            }
            (Some(flag), _) => flag,
            (None, d) => d.is_some(),
        };
        let param = Param {
            name: arg.name,
            raw_type: arg.ty.to_token(),
            optional,
            default,
            description: arg.description,
        };
        if param.is_varargs() && i + 1 != count {
            return Err(LoadError::malformed(arg_path, "varargs must be the last argument"));
        }
        params.push(param);
    }
    let returns = raw.returns
        .into_iter()
        .map(|r| ReturnSpec {
            name: r.name.filter(|n| !n.is_empty()),
            raw_type: r.ty.to_token(),
            optional: r.optional,
            description: r.description,
        })
        .collect();
    Ok(Variant { params, returns, description: raw.description })
}

fn require_name(name: &str, path: &str) -> Result<(), LoadError> {
    if name.trim().is_empty() {
        return Err(LoadError::malformed(path, "empty name"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"{
        "graphics": {
            "description": "Drawing.",
            "types": [{
                "name": "Image",
                "supertypes": ["Texture", "Drawable"],
                "methods": [{
                    "name": "getWidth",
                    "variants": [{ "returns": [{ "name": "width", "type": "number" }] }]
                }]
            }],
            "functions": [{
                "name": "print",
                "variants": [{ "arguments": [
                    { "name": "text", "type": "string" },
                    { "name": "x", "type": "number", "default": "0" }
                ]}]
            }],
            "enums": [{ "name": "AlignMode", "constants": [
                { "name": "center", "description": "Centered." },
                { "value": "left" }
            ]}]
        },
        "audio": {}
    }"#;

    #[test]
    fn loads_in_source_order() {
        let model = load_str(SOURCE, "test", None).unwrap();
        let names: Vec<_> = model.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["graphics", "audio"]);
        let g = &model.modules[0];
        assert_eq!(g.classes[0].supertypes, ["Texture", "Drawable"]);
        assert_eq!(g.classes[0].methods[0].owner, Owner::Class("Image".into()));
        assert_eq!(g.functions[0].owner, Owner::Module("graphics".into()));
        assert_eq!(g.enums[0].constants[1].value, "left");
    }

    #[test]
    fn default_implies_optional() {
        let model = load_str(SOURCE, "test", None).unwrap();
        let params = &model.modules[0].functions[0].variants[0].params;
        assert!(!params[0].optional);
        assert!(params[1].optional);
        assert_eq!(params[1].default.as_deref(), Some("0"));
    }

    #[test]
    fn required_flag_conflicting_with_default_is_malformed() {
        let src = r#"{"m": {"functions": [{"name": "f", "variants": [{"arguments": [
            {"name": "x", "type": "number", "default": "1", "optional": false}
        ]}]}]}}"#;
        let err = load_str(src, "test", None).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { ref path, .. } if path == "m.f#1.x"), "{err}");
    }

    #[test]
    fn empty_variant_list_is_malformed() {
        let src = r#"{"m": {"functions": [{"name": "f", "variants": []}]}}"#;
        assert!(matches!(load_str(src, "test", None), Err(LoadError::Malformed { .. })));
    }

    #[test]
    fn missing_field_is_malformed() {
        let src = r#"{"m": {"functions": [{"name": "f"}]}}"#;
        assert!(matches!(load_str(src, "test", None), Err(LoadError::Malformed { .. })));
    }

    #[test]
    fn varargs_must_be_last() {
        let src = r#"{"m": {"functions": [{"name": "f", "variants": [{"arguments": [
            {"name": "...", "type": "number"}, {"name": "x", "type": "number"}
        ]}]}]}}"#;
        assert!(matches!(load_str(src, "test", None), Err(LoadError::Malformed { .. })));
    }

    #[test]
    fn json_pointer_selects_subnode() {
        let src = r#"{"version": "11.5", "modules": {"m": {}}}"#;
        let model = load_str(src, "test", Some("/modules")).unwrap();
        assert_eq!(model.modules[0].name, "m");
        assert!(load_str(src, "test", Some("/nope")).is_err());
    }

    #[test]
    fn duplicate_modules_across_inputs_are_rejected() {
        let mut model = load_str(r#"{"m": {}}"#, "a", None).unwrap();
        let again = load_str(r#"{"m": {}}"#, "b", None).unwrap();
        assert!(merge(&mut model, again).is_err());
    }
}
