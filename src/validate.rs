//! Validator: re-scan emitted files and report, per file, every violated
//! check. Operates on text only; no model is rebuilt. A bad file never stops
//! the run, and the report is ordered by path whatever order workers finish in.
pub mod checks;
pub mod lua;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::TypeTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Check {
    Syntax,
    Annotations,
    DescriptiveType,
    UnionSyntax,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostic {
    /// 1-based; 0 when the position is unknown.
    pub line: usize,
    pub check: Check,
    pub message: String,
    pub text: String,
}

impl FileDiagnostic {
    pub fn new(line: usize, check: Check, message: impl Into<String>, text: &str) -> Self {
        Self { line, check, message: message.into(), text: text.to_string() }
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<FileDiagnostic>,
}

impl FileReport {
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    pub fn passed(&self) -> usize {
        self.files.iter().filter(|f| f.passed()).count()
    }
    pub fn failed(&self) -> usize {
        self.files.len() - self.passed()
    }
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

pub struct Validator {
    fragments: BTreeMap<String, Vec<String>>,
    multi_word: Vec<String>,
}

impl Validator {
    pub fn new(table: &TypeTable) -> Self {
        let fragments = table.fragments();
        let mut multi_word: Vec<String> = fragments.values().flatten().cloned().collect();
        multi_word.sort();
        multi_word.dedup();
        Self { fragments, multi_word }
    }

    /// Validate every `.lua` file below `dir`.
    pub fn validate_dir(&self, dir: &Path) -> Result<ValidationReport, glob::PatternError> {
        let pattern = format!("{}/**/*.lua", glob::Pattern::escape(&dir.to_string_lossy()));
        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(p) => paths.push(p),
                Err(error) => tracing::warn!(%error, "skipping unreadable path"),
            }
        }
        Ok(self.validate_files(&paths))
    }

    pub fn validate_files(&self, paths: &[PathBuf]) -> ValidationReport {
        let mut files: Vec<FileReport> = paths
            .par_iter()
            .map(|path| {
                let diagnostics = match std::fs::read_to_string(path) {
                    Ok(source) => {
                        let name = path.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        self.validate_source(&name, &source)
                    }
                    Err(error) => vec![FileDiagnostic::new(0, Check::Syntax, format!("cannot read file: {error}"), "")],
                };
                FileReport { path: path.clone(), diagnostics }
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        ValidationReport { files }
    }

    /// All four checks against one file's text.
    pub fn validate_source(&self, name: &str, source: &str) -> Vec<FileDiagnostic> {
        let lines: Vec<&str> = source.lines().collect();
        let mut out = Vec::new();

        if let Err((line, message)) = lua::check_syntax(name, source) {
            let text = line.checked_sub(1).and_then(|i| lines.get(i)).copied().unwrap_or("");
            out.push(FileDiagnostic::new(line, Check::Syntax, message, text));
        }
        out.extend(checks::annotations(&lines));

        let typed = checks::typed_lines(&lines, &self.multi_word);
        out.extend(checks::descriptive_types(&typed, &self.fragments));
        out.extend(checks::union_syntax(&typed));

        out.sort_by_key(|d| (d.line, d.check));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(&TypeTable::default())
    }

    const GOOD: &str = "\
---@meta
---@class love.m
love.m = {}

---@param x number|string
---@param h lightuserdata
---@return {a: number or string} pair
---@overload fun(x: number):nil
function love.m.f(x, h) end
";

    #[test]
    fn clean_file_passes() {
        assert_eq!(validator().validate_source("m.lua", GOOD), vec![]);
    }

    #[test]
    fn each_check_fires_independently() {
        let bad = "\
---@class love.m
love.m = {}

---@param x number or string
---@param h light
function love.m.f(x, h, z) end
local t = {
";
        let diags = validator().validate_source("m.lua", bad);
        let checks: Vec<Check> = diags.iter().map(|d| d.check).collect();
        assert!(checks.contains(&Check::Syntax), "{diags:?}");
        assert!(checks.contains(&Check::Annotations), "{diags:?}");
        assert!(checks.contains(&Check::DescriptiveType), "{diags:?}");
        assert!(checks.contains(&Check::UnionSyntax), "{diags:?}");
        let union = diags.iter().find(|d| d.check == Check::UnionSyntax).unwrap();
        assert_eq!(union.line, 4);
        let frag = diags.iter().find(|d| d.check == Check::DescriptiveType).unwrap();
        assert_eq!(frag.line, 5);
        assert_eq!(frag.text, "---@param h light");
    }

    #[test]
    fn directory_report_is_sorted_and_aggregated() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.lua"), GOOD).unwrap();
        std::fs::write(dir.path().join("a.lua"), "function f( end").unwrap();
        std::fs::write(dir.path().join("c.lua"), GOOD).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let report = validator().validate_dir(dir.path()).unwrap();
        let names: Vec<_> = report.files.iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.lua", "b.lua", "c.lua"]);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }
}
