//! CLI: generate annotation files from an API description, or validate
//! previously generated ones.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_NAMESPACE, GeneratorConfig, TypeTable};
use crate::validate::Validator;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate LuaLS annotation stubs from a structured API description
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// load the description, emit one file per module, then validate the output
    Generate(GenerateOut),
    /// validate previously generated files
    Validate(ValidateIn),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer selecting the module table in each document (e.g. /modules)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct CommonSettings {
    /// JSON file replacing the built-in primitive type table
    #[arg(long)]
    type_table: Option<PathBuf>,

    /// print every diagnostic
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    common: CommonSettings,

    /// output directory
    #[arg(short, long, default_value = "library")]
    out: PathBuf,

    /// namespace every module and type lives under
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// skip the validation pass
    #[arg(long)]
    no_validate: bool,
}

#[derive(clap::Parser, Debug)]
struct ValidateIn {
    /// directory of generated files
    #[arg(long, short)]
    dir: PathBuf,

    #[command(flatten)]
    common: CommonSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommonSettings {
    fn type_table(&self) -> Result<TypeTable> {
        match &self.type_table {
            None => Ok(TypeTable::default()),
            Some(path) => Ok(TypeTable::load(path)?),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbose(&self) -> bool {
        match &self.cmd {
            Command::Generate(target) => target.common.verbose,
            Command::Validate(target) => target.common.verbose,
        }
    }

    /// `Ok(true)` when every module was emitted and every file validated.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Generate(target) => {
                let config = GeneratorConfig {
                    namespace: target.namespace.clone(),
                    verbose: target.common.verbose,
                    type_table: target.common.type_table()?,
                };

                // 1) load (fatal on any shape error)
                let inputs = resolve_file_path_patterns(&target.input_settings.input)?;
                let model = crate::loader::load_files(&inputs, target.input_settings.json_pointer.as_deref())
                    .context("failed to load API description")?;

                // 2) normalize, resolve, emit, write
                let report = crate::pipeline::generate(&model, &config, &target.out)
                    .with_context(|| format!("failed to prepare {}", target.out.display()))?;
                crate::report::print_generation(&report, config.verbose);
                let mut ok = report.failed() == 0;

                // 3) validate what is on disk
                if !target.no_validate {
                    ok &= validate(&target.out, &config.type_table, config.verbose)?;
                }
                Ok(ok)
            }
            Command::Validate(target) => {
                validate(&target.dir, &target.common.type_table()?, target.common.verbose)
            }
        }
    }
}

fn validate(dir: &Path, table: &TypeTable, verbose: bool) -> Result<bool> {
    let report = Validator::new(table)
        .validate_dir(dir)
        .with_context(|| format!("invalid output directory {}", dir.display()))?;
    crate::report::print_validation(&report, verbose);
    Ok(report.is_success())
}

/// stderr fmt subscriber; `RUST_LOG` wins over the verbosity default.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "lua-annotations", "generate", "-i", "api.json", "--out", "build", "--verbose", "--no-validate",
        ]).unwrap();
        assert!(cli.verbose());
        let Command::Generate(g) = &cli.cmd else { panic!("expected generate") };
        assert_eq!(g.out, PathBuf::from("build"));
        assert_eq!(g.namespace, "love");
        assert!(g.no_validate);
    }

    #[test]
    fn literal_paths_pass_through_and_empty_globs_fail() {
        let out = resolve_file_path_patterns(["a.json", "b.json"]).unwrap();
        assert_eq!(out, [PathBuf::from("a.json"), PathBuf::from("b.json")]);
        let dir = tempfile::TempDir::new().unwrap();
        let pattern = format!("{}/*.json", dir.path().display());
        assert!(resolve_file_path_patterns([pattern]).is_err());
    }
}
