//! Generation run: normalize → resolve → emit → write, one unit per module.
//!
//! Modules are independent, so they run on the rayon pool. The only join is
//! the collected outcome list, which keeps model order. A failing module is
//! recorded and skipped; the others still get written.
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::codegen;
use crate::config::GeneratorConfig;
use crate::error::{Diagnostic, EmitError};
use crate::model::{Model, Module};
use crate::normalize::Normalizer;

pub const OUTPUT_EXTENSION: &str = "lua";

#[derive(Debug)]
pub enum ModuleStatus {
    Written,
    /// Target already held identical bytes.
    Unchanged,
    Failed(EmitError),
}

#[derive(Debug)]
pub struct ModuleOutcome {
    pub module: String,
    pub path: PathBuf,
    pub status: ModuleStatus,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub modules: Vec<ModuleOutcome>,
}

impl GenerationReport {
    fn count(&self, f: impl Fn(&ModuleStatus) -> bool) -> usize {
        self.modules.iter().filter(|m| f(&m.status)).count()
    }
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, ModuleStatus::Written))
    }
    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, ModuleStatus::Unchanged))
    }
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ModuleStatus::Failed(_)))
    }
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.modules.iter().flat_map(|m| m.diagnostics.iter())
    }
}

/// Render one module to text without touching the filesystem.
pub fn render_module(
    normalizer: &Normalizer,
    module: &Module,
    config: &GeneratorConfig,
) -> (Result<String, EmitError>, Vec<Diagnostic>) {
    let (normalized, diagnostics) = normalizer.normalize_module(module);
    (codegen::emit_module(&normalized, &config.namespace), diagnostics)
}

/// Render every module in memory, in model order.
pub fn render_all(model: &Model, config: &GeneratorConfig) -> Vec<(String, Result<String, EmitError>)> {
    let normalizer = Normalizer::new(config, model);
    model.modules
        .par_iter()
        .map(|m| (m.name.clone(), render_module(&normalizer, m, config).0))
        .collect()
}

/// Generate one file per module into `out_dir`.
pub fn generate(model: &Model, config: &GeneratorConfig, out_dir: &Path) -> Result<GenerationReport, EmitError> {
    std::fs::create_dir_all(out_dir).map_err(|source| EmitError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let normalizer = Normalizer::new(config, model);

    let modules = model.modules
        .par_iter()
        .map(|module| {
            let path = out_dir.join(format!("{}.{OUTPUT_EXTENSION}", module.name));
            let (rendered, diagnostics) = render_module(&normalizer, module, config);
            let status = match rendered.and_then(|text| write_atomic(&path, &text)) {
                Ok(true) => ModuleStatus::Written,
                Ok(false) => ModuleStatus::Unchanged,
                Err(error) => {
                    tracing::error!(module = %module.name, %error, "module skipped");
                    ModuleStatus::Failed(error)
                }
            };
            ModuleOutcome { module: module.name.clone(), path, status, diagnostics }
        })
        .collect();

    Ok(GenerationReport { modules })
}

/// Replace `path` with `contents` in one step. Returns `false` when the file
/// already had exactly these bytes.
pub fn write_atomic(path: &Path, contents: &str) -> Result<bool, EmitError> {
    if std::fs::read(path).is_ok_and(|old| old == contents.as_bytes()) {
        return Ok(false);
    }
    let io = |source: std::io::Error| EmitError::Io { path: path.to_path_buf(), source };
    let dir = path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io)?;
    tmp.write_all(contents.as_bytes()).map_err(io)?;
    tmp.persist(path).map_err(|e| io(e.error))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"{
        "good": {"functions": [{"name": "f", "variants": [{}]}]},
        "bad": {"functions": [{"name": "g", "variants": [{"arguments": [{"name": "end", "type": "number"}]}]}]},
        "other": {"enums": [{"name": "E", "constants": [{"name": "x"}]}]}
    }"#;

    #[test]
    fn failing_module_does_not_stop_the_others() {
        let model = crate::loader::load_str(SOURCE, "test", None).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let report = generate(&model, &GeneratorConfig::default(), dir.path()).unwrap();

        let names: Vec<_> = report.modules.iter().map(|m| m.module.as_str()).collect();
        assert_eq!(names, ["good", "bad", "other"]);
        assert_eq!(report.written(), 2);
        assert_eq!(report.failed(), 1);
        assert!(dir.path().join("good.lua").exists());
        assert!(!dir.path().join("bad.lua").exists());
        assert!(dir.path().join("other.lua").exists());
    }

    #[test]
    fn second_run_is_unchanged() {
        let model = crate::loader::load_str(SOURCE, "test", None).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let config = GeneratorConfig::default();
        let first = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(first, 0);
        generate(&model, &config, dir.path()).unwrap();
        let before = std::fs::read(dir.path().join("good.lua")).unwrap();
        let again = generate(&model, &config, dir.path()).unwrap();
        assert_eq!(again.written(), 0);
        assert_eq!(again.unchanged(), 2);
        assert_eq!(std::fs::read(dir.path().join("good.lua")).unwrap(), before);
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("x.lua");
        assert!(write_atomic(&path, "a").unwrap());
        assert!(write_atomic(&path, "b").unwrap());
        assert!(!write_atomic(&path, "b").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b");
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
