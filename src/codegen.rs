//! Emitter: normalized module → one annotation file.
//!
//! Output is a pure function of the input module. Order is source order
//! everywhere except alternates, which keep the resolver's order.
use crate::error::EmitError;
use crate::ir::{NClass, NEnum, NFunction, NModule, NParam, NReturn, NSignature};
use crate::model::{Owner, VARARGS_NAME};

// ------------------------------- Markers --------------------------------- //

pub const HEADER: &str = "---@meta";
pub const DOC: &str = "---";
pub const CLASS: &str = "---@class";
pub const PARAM: &str = "---@param";
pub const RETURN: &str = "---@return";
pub const OVERLOAD: &str = "---@overload";
pub const ALIAS: &str = "---@alias";
pub const ALIAS_ENTRY: &str = "---|";
pub const REGION_START: &str = "--#region";
pub const REGION_END: &str = "--#endregion";

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

pub struct Codegen<'a> {
    namespace: &'a str,
    out: String,
}

/// Convenience: one module → file contents.
pub fn emit_module(module: &NModule, namespace: &str) -> Result<String, EmitError> {
    let mut cg = Codegen::new(namespace);
    cg.emit(module)?;
    Ok(cg.into_string())
}

impl<'a> Codegen<'a> {
    pub fn new(namespace: &'a str) -> Self {
        Self { namespace, out: String::new() }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    pub fn emit(&mut self, module: &NModule) -> Result<(), EmitError> {
        check_ident(&module.name, &module.name)?;
        let table = format!("{}.{}", self.namespace, module.name);

        self.line(HEADER);
        self.line(&format!("{CLASS} {table}"));
        self.doc(&module.description);
        self.line(&format!("{table} = {{}}"));

        for class in &module.classes {
            self.class(module, class)?;
        }
        for e in &module.enums {
            self.alias(e);
        }
        for f in &module.functions {
            self.blank();
            self.function(&format!("{}.{}", module.name, f.name), f, &table, None)?;
        }
        Ok(())
    }

    fn class(&mut self, module: &NModule, class: &NClass) -> Result<(), EmitError> {
        let subject = format!("{}.{}", module.name, class.name);
        check_ident(&class.name, &subject)?;

        self.blank();
        self.line(&format!("{REGION_START} {}", class.name));
        self.blank();
        self.doc(&class.description);
        if class.supertypes.is_empty() {
            self.line(&format!("{CLASS} {}", class.qualified));
        } else {
            self.line(&format!("{CLASS} {} : {}", class.qualified, class.supertypes.join(", ")));
        }
        self.line(&format!("local {} = {{}}", class.name));

        for method in &class.methods {
            self.blank();
            self.function(&format!("{subject}.{}", method.name), method, &class.name, Some(&class.qualified))?;
        }

        self.blank();
        self.line(&format!("{REGION_END} {}", class.name));
        Ok(())
    }

    fn alias(&mut self, e: &NEnum) {
        self.blank();
        self.line(&format!("{ALIAS} {}", e.qualified));
        self.doc(&e.description);
        for (value, description) in &e.constants {
            self.described(&format!("{ALIAS_ENTRY} {}", quote(value)), " --", description);
        }
    }

    /// `self_ty` is set for methods (`:` call form).
    fn function(
        &mut self,
        subject: &str,
        f: &NFunction,
        owner: &str,
        self_ty: Option<&str>,
    ) -> Result<(), EmitError> {
        check_ident(&f.name, subject)?;
        debug_assert_eq!(matches!(f.owner, Owner::Class(_)), self_ty.is_some());

        self.doc(&f.description);
        if !f.primary.description.is_empty() {
            if !f.description.is_empty() {
                self.line(DOC);
            }
            self.doc(&f.primary.description);
        }

        for p in &f.primary.params {
            self.param(subject, p)?;
        }
        for r in &f.primary.returns {
            self.ret(subject, r)?;
        }
        for alt in &f.alternates {
            let sig = overload_signature(subject, alt, self_ty)?;
            self.doc(&alt.description);
            self.line(&format!("{OVERLOAD} {sig}"));
        }

        let params = f.primary.params.iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let separator = if self_ty.is_some() { ":" } else { "." };
        self.line(&format!("function {owner}{separator}{}({params}) end", f.name));
        Ok(())
    }

    fn param(&mut self, subject: &str, p: &NParam) -> Result<(), EmitError> {
        check_param_name(&p.name, subject)?;
        check_balanced(&p.rendered, &format!("{subject}.{}", p.name))?;
        let mut description = p.description.clone();
        if let Some(default) = &p.default {
            description.push_str(&format!(" (default: `{default}`)"));
        }
        self.described(&format!("{PARAM} {} {}", p.name, p.rendered), " #", description.trim_start());
        Ok(())
    }

    fn ret(&mut self, subject: &str, r: &NReturn) -> Result<(), EmitError> {
        check_balanced(&r.rendered, subject)?;
        if let Some(name) = &r.name {
            check_ident(name, subject)?;
        }
        let head = match &r.name {
            Some(name) => format!("{RETURN} {} {name}", r.rendered),
            None => format!("{RETURN} {}", r.rendered),
        };
        self.described(&head, " #", &r.description);
        Ok(())
    }

    // ———————————————————————————— primitives ————————————————————————————

    fn line(&mut self, s: &str) {
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Doc text verbatim, one comment line per source line.
    fn doc(&mut self, text: &str) {
        for l in text_lines(text) {
            self.line(&format!("{DOC}{l}"));
        }
    }

    /// `head<marker> first line`, further lines as plain doc lines.
    fn described(&mut self, head: &str, marker: &str, text: &str) {
        let mut lines = text_lines(text);
        match lines.next() {
            Some(first) if !first.is_empty() || text.contains(['\n', '\r']) => {
                self.line(&format!("{head}{marker} {first}"));
            }
            _ => self.line(head),
        }
        for l in lines {
            self.line(&format!("{DOC}{l}"));
        }
    }
}

/// Like `str::lines`, but a lone `\r` also ends a line (Lua treats it as one).
fn text_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().flat_map(|l| l.split('\r'))
}

fn overload_signature(subject: &str, sig: &NSignature, self_ty: Option<&str>) -> Result<String, EmitError> {
    let mut params = Vec::with_capacity(sig.params.len() + 1);
    if let Some(ty) = self_ty {
        params.push(format!("self: {ty}"));
    }
    for p in &sig.params {
        check_param_name(&p.name, subject)?;
        check_balanced(&p.base, subject)?;
        params.push(if p.name == VARARGS_NAME {
            format!("{VARARGS_NAME}: {}", p.base)
        } else if p.optional {
            format!("{}?: {}", p.name, p.base)
        } else {
            format!("{}: {}", p.name, p.base)
        });
    }
    let returns = if sig.returns.is_empty() {
        "nil".to_string()
    } else {
        for r in &sig.returns {
            check_balanced(&r.rendered, subject)?;
        }
        sig.returns.iter().map(|r| r.rendered.as_str()).collect::<Vec<_>>().join(", ")
    };
    Ok(format!("fun({}):{returns}", params.join(", ")))
}

// ------------------------------ Invariants -------------------------------- //

pub fn is_lua_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !LUA_KEYWORDS.contains(&s)
}

fn check_ident(name: &str, subject: &str) -> Result<(), EmitError> {
    if is_lua_identifier(name) {
        Ok(())
    } else {
        Err(EmitError::InvalidIdentifier { subject: subject.to_string(), name: name.to_string() })
    }
}

fn check_param_name(name: &str, subject: &str) -> Result<(), EmitError> {
    if name == VARARGS_NAME { Ok(()) } else { check_ident(name, subject) }
}

/// Brackets in a rendered type must nest properly.
fn check_balanced(rendered: &str, subject: &str) -> Result<(), EmitError> {
    let mut stack = Vec::new();
    for c in rendered.chars() {
        match c {
            '{' | '(' | '<' | '[' => stack.push(c),
            '}' | ')' | '>' | ']' => {
                let open = match c { '}' => '{', ')' => '(', '>' => '<', _ => '[' };
                if stack.pop() != Some(open) {
                    return Err(unbalanced(rendered, subject));
                }
            }
            _ => {}
        }
    }
    if stack.is_empty() { Ok(()) } else { Err(unbalanced(rendered, subject)) }
}

fn unbalanced(rendered: &str, subject: &str) -> EmitError {
    EmitError::Unbalanced { subject: subject.to_string(), rendered: rendered.to_string() }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::normalize::Normalizer;

    fn generate(src: &str) -> Result<String, EmitError> {
        let model = crate::loader::load_str(src, "test", None).unwrap();
        let config = GeneratorConfig::default();
        let (module, _) = Normalizer::new(&config, &model).normalize_module(&model.modules[0]);
        emit_module(&module, &config.namespace)
    }

    const GRAPHICS: &str = r#"{"graphics": {
        "description": "Drawing things.\nSecond line.",
        "types": [{
            "name": "Image",
            "description": "A picture.",
            "supertypes": ["Texture", "Drawable"],
            "functions": [{
                "name": "getDimensions",
                "description": "Gets the size.",
                "variants": [{"returns": [
                    {"name": "width", "type": "number", "description": "The width."},
                    {"name": "height", "type": "number"}
                ]}]
            }]
        }, {"name": "Texture"}, {"name": "Drawable"}],
        "functions": [{
            "name": "rectangle",
            "description": "Draws a rectangle.",
            "variants": [
                {"arguments": [
                    {"name": "x", "type": "number"},
                    {"name": "y", "type": "number"}
                ]},
                {"arguments": [
                    {"name": "x", "type": "number"},
                    {"name": "y", "type": "number"},
                    {"name": "z", "type": "number", "description": "Depth."},
                    {"name": "w", "type": "number or string", "default": "1"}
                ]}
            ]
        }],
        "enums": [{"name": "DrawMode", "description": "How to draw.", "constants": [
            {"name": "a", "description": "First."},
            {"name": "b", "description": "Second."}
        ]}]
    }}"#;

    #[test]
    fn emits_fixed_layout() {
        let out = generate(GRAPHICS).unwrap();
        let expected = "\
---@meta
---@class love.graphics
---Drawing things.
---Second line.
love.graphics = {}

--#region Image

---A picture.
---@class love.Image : love.Texture, love.Drawable
local Image = {}

---Gets the size.
---@return number width # The width.
---@return number height
function Image:getDimensions() end

--#endregion Image

--#region Texture

---@class love.Texture
local Texture = {}

--#endregion Texture

--#region Drawable

---@class love.Drawable
local Drawable = {}

--#endregion Drawable

---@alias love.DrawMode
---How to draw.
---| \"a\" -- First.
---| \"b\" -- Second.

---Draws a rectangle.
---@param x number
---@param y number
---@param z number # Depth.
---@param w (number|string)? # (default: `1`)
---@overload fun(x: number, y: number):nil
function love.graphics.rectangle(x, y, z, w) end
";
        assert_eq!(out, expected);
    }

    #[test]
    fn emission_is_deterministic() {
        assert_eq!(generate(GRAPHICS).unwrap(), generate(GRAPHICS).unwrap());
    }

    #[test]
    fn single_variant_emits_no_overload() {
        let out = generate(r#"{"m": {"functions": [{"name": "f", "variants": [{}]}]}}"#).unwrap();
        assert!(!out.contains(OVERLOAD));
        assert!(out.contains("function love.m.f() end"));
    }

    #[test]
    fn method_overloads_carry_self_and_returns() {
        let out = generate(r#"{"m": {"types": [{"name": "Body", "functions": [{"name": "apply", "variants": [
            {"arguments": [{"name": "fx", "type": "number"}, {"name": "...", "type": "number"}],
             "returns": [{"type": "boolean"}]},
            {"arguments": [{"name": "fx", "type": "number"}, {"name": "mode", "type": "string", "optional": true}],
             "returns": [{"type": "boolean"}, {"type": "string"}]}
        ]}]}]}}"#).unwrap();
        assert!(out.contains("---@param ... number\n"), "{out}");
        assert!(out.contains("function Body:apply(fx, ...) end"), "{out}");
        assert!(out.contains("---@overload fun(self: love.Body, fx: number, mode?: string):boolean, string"), "{out}");
    }

    #[test]
    fn multi_line_descriptions_stay_comments() {
        let out = generate(r#"{"m": {"functions": [{"name": "f", "variants": [{"arguments": [
            {"name": "x", "type": "number", "description": "First.\nSecond."}
        ]}]}]}}"#).unwrap();
        assert!(out.contains("---@param x number # First.\n---Second.\n"), "{out}");
    }

    #[test]
    fn keyword_parameter_is_an_emission_error() {
        let err = generate(r#"{"m": {"functions": [{"name": "f", "variants": [{"arguments": [
            {"name": "end", "type": "number"}
        ]}]}]}}"#).unwrap_err();
        assert!(matches!(err, EmitError::InvalidIdentifier { ref name, .. } if name == "end"));
    }

    #[test]
    fn unbalanced_type_is_an_emission_error() {
        let err = generate(r#"{"m": {"functions": [{"name": "f", "variants": [{"arguments": [
            {"name": "x", "type": "{a: number"}
        ]}]}]}}"#).unwrap_err();
        assert!(matches!(err, EmitError::Unbalanced { .. }));
    }

    #[test]
    fn enum_values_are_quoted() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(quote("a\rb"), r#""a\rb""#);
    }

    #[test]
    fn carriage_returns_end_comment_lines() {
        let out = generate(r#"{"m": {
            "functions": [{"name": "f", "description": "Draws.\rThen returns.", "variants": [{"arguments": [
                {"name": "x", "type": "number", "description": "One.\rTwo.\r\nThree."}
            ]}]}],
            "enums": [{"name": "E", "constants": [{"name": "v", "description": "A\rB"}]}]
        }}"#).unwrap();
        assert!(out.contains("---Draws.\n---Then returns.\n"), "{out}");
        assert!(out.contains("---@param x number # One.\n---Two.\n---Three.\n"), "{out}");
        assert!(out.contains("---| \"v\" -- A\n---B\n"), "{out}");
        assert!(!out.contains('\r'));
        assert!(crate::validate::lua::check_syntax("m.lua", &out).is_ok());
    }

    #[test]
    fn alternate_descriptions_precede_their_overload() {
        let out = generate(r#"{"m": {"functions": [{"name": "f", "variants": [
            {"description": "Short form.", "arguments": [{"name": "x", "type": "number"}]},
            {"description": "Long form.", "arguments": [{"name": "x", "type": "number"}, {"name": "y", "type": "number"}]}
        ]}]}}"#).unwrap();
        assert!(out.contains("---Long form.\n---@param x number\n"), "{out}");
        assert!(out.contains("---Short form.\n---@overload fun(x: number):nil\n"), "{out}");
    }

    #[test]
    fn return_name_must_be_an_identifier() {
        let err = generate(r#"{"m": {"functions": [{"name": "f", "variants": [{"returns": [
            {"name": "the width", "type": "number"}
        ]}]}]}}"#).unwrap_err();
        assert!(matches!(err, EmitError::InvalidIdentifier { ref name, .. } if name == "the width"));
    }
}
