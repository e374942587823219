//! Line-oriented annotation checks. Each returns its own findings and never
//! stops at the first one.
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::codegen::{HEADER, OVERLOAD, PARAM, RETURN};
use super::{Check, FileDiagnostic};

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^function\s+([A-Za-z_][\w.:]*)\s*\(([^)]*)\)\s*end\s*$").expect("static regex")
});

/// A `---@param` / `---@return` line with its type portion isolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedLine<'a> {
    pub line: usize,
    pub text: &'a str,
    pub portion: &'a str,
}

// ———————————————————————— check 2: annotation completeness ————————————————————————

pub fn annotations(lines: &[&str]) -> Vec<FileDiagnostic> {
    let mut out = Vec::new();

    if !lines.iter().any(|l| l.trim_end() == HEADER) {
        out.push(FileDiagnostic::new(1, Check::Annotations, format!("missing `{HEADER}` header"), ""));
    }

    for (i, &line) in lines.iter().enumerate() {
        let n = i + 1;
        if let Some(rest) = after_marker(line, PARAM) {
            let mut words = rest.split_whitespace();
            if words.next().is_none() || words.next().is_none() {
                out.push(FileDiagnostic::new(n, Check::Annotations, "`@param` without name and type", line));
            }
        } else if let Some(rest) = after_marker(line, RETURN) {
            if rest.split('#').next().is_none_or(|t| t.trim().is_empty()) {
                out.push(FileDiagnostic::new(n, Check::Annotations, "`@return` without type", line));
            }
        } else if let Some(rest) = after_marker(line, OVERLOAD) {
            if !rest.trim_start().starts_with("fun(") {
                out.push(FileDiagnostic::new(n, Check::Annotations, "`@overload` is not a `fun(...)` type", line));
            }
        } else if let Some(caps) = FUNCTION_DECL.captures(line) {
            let declared: Vec<&str> = caps[2]
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            let annotated: Vec<&str> = annotation_block(lines, i)
                .into_iter()
                .filter_map(|l| after_marker(l, PARAM))
                .filter_map(|rest| rest.split_whitespace().next())
                .collect();
            if declared != annotated {
                out.push(FileDiagnostic::new(
                    n,
                    Check::Annotations,
                    format!(
                        "`{}` declares {} parameter(s) but is annotated with {} `@param` line(s) ({})",
                        &caps[1],
                        declared.len(),
                        annotated.len(),
                        annotated.join(", "),
                    ),
                    line,
                ));
            }
        }
    }
    out
}

/// Contiguous `---` lines directly above line `index`.
fn annotation_block<'a>(lines: &[&'a str], index: usize) -> Vec<&'a str> {
    let mut start = index;
    while start > 0 && lines[start - 1].starts_with("---") {
        start -= 1;
    }
    lines[start..index].to_vec()
}

fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

// ———————————————————————————— type portions ————————————————————————————

/// Type portion of every param/return line: after the name (params) or
/// before the name (returns), and always before the `#` description marker.
/// An overload line is all type.
pub fn typed_lines<'a>(lines: &[&'a str], multi_word: &[String]) -> Vec<TypedLine<'a>> {
    let mut out = Vec::new();
    for (i, &line) in lines.iter().enumerate() {
        let portion = if let Some(rest) = after_marker(line, PARAM) {
            let rest = before_description(rest).trim();
            rest.split_once(char::is_whitespace).map(|(_, ty)| ty.trim())
        } else if let Some(rest) = after_marker(line, RETURN) {
            Some(strip_return_name(before_description(rest).trim(), multi_word))
        } else if let Some(rest) = after_marker(line, OVERLOAD) {
            Some(rest.trim())
        } else {
            None
        };
        if let Some(portion) = portion.filter(|p| !p.is_empty()) {
            out.push(TypedLine { line: i + 1, text: line, portion });
        }
    }
    out
}

fn before_description(s: &str) -> &str {
    s.split('#').next().unwrap_or(s)
}

/// `number width` → `number`; un-normalized `number or string` stays whole.
fn strip_return_name<'a>(s: &'a str, multi_word: &[String]) -> &'a str {
    let words = depth0_words(s);
    let [.., (prev, _), (last, last_start)] = words.as_slice() else { return s };
    let is_name = last.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !is_name || *prev == "or" || *last == "or" || multi_word.iter().any(|m| s.ends_with(m.as_str())) {
        return s;
    }
    s[..*last_start].trim_end()
}

/// Whitespace-separated words outside any bracket, with start offsets.
fn depth0_words(s: &str) -> Vec<(&str, usize)> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start: Option<usize> = None;
    for (i, c) in s.char_indices() {
        match c {
            '{' | '(' | '[' | '<' => depth += 1,
            '}' | ')' | ']' | '>' => depth -= 1,
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(st) = start.take() {
                out.push((&s[st..i], st));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        out.push((&s[st..], st));
    }
    out
}

// ———————————————————————— check 3: descriptive types ————————————————————————

/// Flags bare fragments of multi-word primitives. `fragments` maps each
/// fragment to the full names it may start.
pub fn descriptive_types(typed: &[TypedLine], fragments: &BTreeMap<String, Vec<String>>) -> Vec<FileDiagnostic> {
    let mut out = Vec::new();
    for t in typed {
        for (fragment, completions) in fragments {
            if has_bare_fragment(t.portion, fragment, completions) {
                out.push(FileDiagnostic::new(
                    t.line,
                    Check::DescriptiveType,
                    format!("`{fragment}` is an incomplete type name (expected {})", completions.join(" / ")),
                    t.text,
                ));
            }
        }
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn has_bare_fragment(portion: &str, fragment: &str, completions: &[String]) -> bool {
    portion.match_indices(fragment).any(|(pos, _)| {
        let end = pos + fragment.len();
        let bounded_left = portion[..pos].chars().next_back().is_none_or(|c| !is_ident_char(c));
        let bounded_right = portion[end..].chars().next().is_none_or(|c| !is_ident_char(c));
        let is_field_name = portion[end..].trim_start().starts_with(':');
        let completed = completions.iter().any(|c| portion[pos..].starts_with(c.as_str()));
        bounded_left && bounded_right && !is_field_name && !completed
    })
}

// ———————————————————————————— check 4: union syntax ————————————————————————————

/// ` or ` outside table-literal braces means an un-normalized union.
pub fn union_syntax(typed: &[TypedLine]) -> Vec<FileDiagnostic> {
    typed.iter()
        .filter(|t| has_top_level_or(t.portion))
        .map(|t| FileDiagnostic::new(
            t.line,
            Check::UnionSyntax,
            format!("un-normalized union in `{}`", t.portion),
            t.text,
        ))
        .collect()
}

pub fn has_top_level_or(portion: &str) -> bool {
    let mut depth = 0i32;
    for (i, c) in portion.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ' ' if depth == 0 && portion[i..].starts_with(" or ") => return true,
            _ => {}
        }
    }
    false
}
