//! Syntactic loadability: compile (never run) a file with an embedded Lua.
use mlua::Lua;
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_NO: Lazy<Regex> = Lazy::new(|| Regex::new(r":(\d+):").expect("static regex"));

/// `Err((line, message))` when the chunk does not compile. Line 0 means unknown.
pub fn check_syntax(chunk_name: &str, source: &str) -> Result<(), (usize, String)> {
    let lua = Lua::new();
    match lua.load(source).set_name(format!("={chunk_name}")).into_function() {
        Ok(_) => Ok(()),
        Err(mlua::Error::SyntaxError { message, .. }) => {
            let line = LINE_NO
                .captures(&message)
                .and_then(|c| c[1].parse().ok())
                .unwrap_or(0);
            Err((line, message))
        }
        Err(other) => Err((0, other.to_string())),
    }
}
