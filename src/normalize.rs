//! Type normalizer and module normalization.
//!
//! Raw type tokens go through [`parse`] into a syntax tree, are classified
//! against the [`TypeTable`](crate::config::TypeTable), resolved against the
//! model's class and enum names, and rendered in the target grammar.
//!
//! Policies:
//! - Union arms are flattened and de-duplicated by rendered name; a union that
//!   collapses to one arm is that arm.
//! - Names defined by the model are namespace-qualified; primitives and
//!   already-dotted names are left alone.
//! - Anything unclassifiable is passed through unchanged and reported.
//! - The optional suffix is applied once, outermost, after rendering.
pub mod parse;

use std::collections::BTreeSet;

use crate::config::{Classified, GeneratorConfig, normalize_words};
use crate::error::{Diagnostic, DiagnosticKind, Severity};
use crate::ir::{NClass, NEnum, NFunction, NModule, NParam, NReturn, NSignature, TypeExpr};
use crate::model::{Function, Model, Module, Param, ReturnSpec, Variant};
use crate::overload;
use parse::Syn;

/// Result of normalizing one type position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub ty: TypeExpr,
    pub base: String,
    pub rendered: String,
}

pub struct Normalizer<'a> {
    config: &'a GeneratorConfig,
    known: BTreeSet<&'a str>,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a GeneratorConfig, model: &'a Model) -> Self {
        Self { config, known: model.type_names().collect() }
    }

    /// Normalize one raw type token. `subject` names the position in diagnostics.
    pub fn normalize_type(
        &self,
        raw: &str,
        optional: bool,
        subject: &str,
        diags: &mut Vec<Diagnostic>,
    ) -> Normalized {
        let ty = self.type_expr(raw, subject, diags);
        let base = render(&ty);
        let rendered = if optional { with_optional_suffix(&ty, &base) } else { base.clone() };
        Normalized { ty, base, rendered }
    }

    fn type_expr(&self, raw: &str, subject: &str, diags: &mut Vec<Diagnostic>) -> TypeExpr {
        // multi-word names are matched whole, before any splitting
        let phrase = normalize_words(raw);
        if let Some(rendered) = self.config.type_table.rendered_multi_word(&phrase) {
            return TypeExpr::Primitive(rendered.to_string());
        }
        match parse::parse(raw) {
            Ok(syn) => self.lower(syn, subject, diags),
            Err(error) => {
                // outside the grammar somewhere: still split the top-level union
                let segments = split_top_level_or(raw);
                if segments.len() >= 2 {
                    let arms = segments.into_iter()
                        .map(|seg| self.type_expr(seg, subject, diags))
                        .collect();
                    return union_of(arms);
                }
                self.unrecognized(diags, subject, format!("cannot parse type: {error}"), &phrase);
                TypeExpr::NamedRef(phrase)
            }
        }
    }

    fn lower(&self, syn: Syn, subject: &str, diags: &mut Vec<Diagnostic>) -> TypeExpr {
        match syn {
            Syn::Phrase(p) => self.classify_phrase(&p, subject, diags),
            Syn::Union(alts) => {
                let arms = alts.into_iter()
                    .map(|alt| self.lower(alt, subject, diags))
                    .collect();
                union_of(arms)
            }
            Syn::Table { fields, open } => TypeExpr::TableLiteral {
                fields: fields
                    .into_iter()
                    .map(|(name, syn)| {
                        let ty = self.lower(syn, &format!("{subject}.{name}"), diags);
                        (name, ty)
                    })
                    .collect(),
                open,
            },
        }
    }

    fn classify_phrase(&self, phrase: &str, subject: &str, diags: &mut Vec<Diagnostic>) -> TypeExpr {
        let table = &self.config.type_table;
        match table.classify(phrase) {
            Classified::Primitive(p) => TypeExpr::Primitive(p),
            Classified::Fragment { completions } => {
                if table.complete_fragments && completions.len() == 1 {
                    let full = &completions[0];
                    let rendered = table.rendered_multi_word(full).unwrap_or(full);
                    self.record(diags, Diagnostic {
                        severity: Severity::Warning,
                        kind: DiagnosticKind::CompletedFragment,
                        subject: subject.to_string(),
                        message: format!("incomplete type `{phrase}` completed to `{full}`"),
                        text: phrase.to_string(),
                    });
                    TypeExpr::Primitive(rendered.to_string())
                } else {
                    let message = format!(
                        "`{phrase}` is an incomplete fragment of {}",
                        completions.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", "),
                    );
                    self.unrecognized(diags, subject, message, phrase);
                    TypeExpr::NamedRef(phrase.to_string())
                }
            }
            Classified::Unknown => self.resolve_name(phrase, subject, diags),
        }
    }

    fn resolve_name(&self, name: &str, subject: &str, diags: &mut Vec<Diagnostic>) -> TypeExpr {
        if self.known.contains(name) {
            TypeExpr::NamedRef(format!("{}.{name}", self.config.namespace))
        } else if name.contains('.') {
            TypeExpr::NamedRef(name.to_string())
        } else {
            self.unrecognized(diags, subject, format!("unrecognized type `{name}`"), name);
            TypeExpr::NamedRef(name.to_string())
        }
    }

    fn unrecognized(&self, diags: &mut Vec<Diagnostic>, subject: &str, message: String, text: &str) {
        // promoted in verbose mode; never aborts
        let severity = if self.config.verbose { Severity::Error } else { Severity::Warning };
        self.record(diags, Diagnostic {
            severity,
            kind: DiagnosticKind::UnrecognizedType,
            subject: subject.to_string(),
            message,
            text: text.to_string(),
        });
    }

    fn record(&self, diags: &mut Vec<Diagnostic>, diag: Diagnostic) {
        tracing::warn!(subject = %diag.subject, "{}", diag.message);
        diags.push(diag);
    }

    // ———————————————————————————— module level ————————————————————————————

    /// Normalize a whole module and resolve every function's overloads.
    pub fn normalize_module(&self, module: &Module) -> (NModule, Vec<Diagnostic>) {
        let mut diags = Vec::new();
        let ns = &self.config.namespace;

        let classes = module.classes.iter().map(|class| {
            let path = format!("{}.{}", module.name, class.name);
            let supertypes = class.supertypes.iter()
                .map(|s| render(&self.resolve_name(s, &path, &mut diags)))
                .collect();
            let methods = class.methods.iter()
                .map(|f| self.function(f, &path, &mut diags))
                .collect();
            NClass {
                name: class.name.clone(),
                qualified: format!("{ns}.{}", class.name),
                description: class.description.clone(),
                supertypes,
                methods,
            }
        }).collect();

        let enums = module.enums.iter().map(|e| NEnum {
            name: e.name.clone(),
            qualified: format!("{ns}.{}", e.name),
            description: e.description.clone(),
            constants: e.constants.iter()
                .map(|c| (c.value.clone(), c.description.clone()))
                .collect(),
        }).collect();

        let functions = module.functions.iter()
            .map(|f| self.function(f, &module.name, &mut diags))
            .collect();

        let out = NModule {
            name: module.name.clone(),
            description: module.description.clone(),
            classes,
            enums,
            functions,
        };
        (out, diags)
    }

    fn function(&self, f: &Function, parent: &str, diags: &mut Vec<Diagnostic>) -> NFunction {
        let path = format!("{parent}.{}", f.name);
        let resolved = overload::resolve(&f.variants);
        let mut signature = |i: usize| self.signature(&f.variants[i], &format!("{path}#{}", i + 1), diags);
        let primary = signature(resolved.primary);
        let alternates = resolved.alternates.iter().map(|&i| signature(i)).collect();
        NFunction {
            name: f.name.clone(),
            owner: f.owner.clone(),
            description: f.description.clone(),
            primary,
            alternates,
        }
    }

    fn signature(&self, v: &Variant, path: &str, diags: &mut Vec<Diagnostic>) -> NSignature {
        NSignature {
            params: v.params.iter().map(|p| self.param(p, path, diags)).collect(),
            returns: v.returns.iter().enumerate()
                .map(|(i, r)| self.ret(r, i, path, diags))
                .collect(),
            description: v.description.clone(),
        }
    }

    fn param(&self, p: &Param, path: &str, diags: &mut Vec<Diagnostic>) -> NParam {
        let n = self.normalize_type(&p.raw_type, p.optional, &format!("{path}.{}", p.name), diags);
        let ty = if p.is_varargs() { TypeExpr::Varargs(Box::new(n.ty)) } else { n.ty };
        NParam {
            name: p.name.clone(),
            ty,
            base: n.base,
            rendered: n.rendered,
            optional: p.optional,
            default: p.default.clone(),
            description: p.description.clone(),
        }
    }

    fn ret(&self, r: &ReturnSpec, index: usize, path: &str, diags: &mut Vec<Diagnostic>) -> NReturn {
        let label = r.name.clone().unwrap_or_else(|| format!("return{}", index + 1));
        let n = self.normalize_type(&r.raw_type, r.optional, &format!("{path}->{label}"), diags);
        NReturn {
            name: r.name.clone(),
            ty: n.ty,
            base: n.base,
            rendered: n.rendered,
            description: r.description.clone(),
        }
    }
}

/// Flatten nested unions, drop duplicates by rendered name, collapse a single arm.
fn union_of(alts: Vec<TypeExpr>) -> TypeExpr {
    let mut arms = Vec::<TypeExpr>::new();
    for alt in alts {
        match alt {
            TypeExpr::Union(inner) => arms.extend(inner),
            other => arms.push(other),
        }
    }
    let mut seen = BTreeSet::new();
    arms.retain(|t| seen.insert(render(t)));
    if arms.len() == 1 { arms.remove(0) } else { TypeExpr::Union(arms) }
}

/// Split on ` or ` / `|` outside any bracket. Segments are trimmed; empty ones dropped.
fn split_top_level_or(raw: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < raw.len() {
        let rest = &raw[i..];
        let Some(c) = rest.chars().next() else { break };
        match c {
            '{' | '(' | '[' | '<' => depth += 1,
            '}' | ')' | ']' | '>' => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            let sep = if c == '|' {
                Some(1)
            } else if c.is_whitespace() && rest.starts_with(" or ") {
                Some(" or ".len())
            } else {
                None
            };
            if let Some(len) = sep {
                out.push(raw[start..i].trim());
                i += len;
                start = i;
                continue;
            }
        }
        i += c.len_utf8();
    }
    out.push(raw[start..].trim());
    out.retain(|s| !s.is_empty());
    out
}

// ------------------------------- Rendering -------------------------------- //

pub fn render(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Primitive(s) | TypeExpr::NamedRef(s) => s.clone(),
        TypeExpr::Union(alts) => alts.iter().map(render).collect::<Vec<_>>().join("|"),
        TypeExpr::TableLiteral { fields, open } => {
            if fields.is_empty() {
                return if *open { "table<any, any>".to_string() } else { "table".to_string() };
            }
            let mut parts: Vec<String> = fields.iter()
                .map(|(name, t)| format!("{name}: {}", render(t)))
                .collect();
            if *open {
                parts.push("[any]: any".to_string());
            }
            format!("{{{}}}", parts.join(", "))
        }
        TypeExpr::Varargs(inner) => render(inner),
    }
}

fn with_optional_suffix(ty: &TypeExpr, base: &str) -> String {
    match ty {
        TypeExpr::Union(_) => format!("({base})?"),
        _ => format!("{base}?"),
    }
}
