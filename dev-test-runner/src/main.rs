//! Regeneration check: build the same description twice into fresh
//! directories, validate both, and fail on any byte difference.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use lua_annotations::{GeneratorConfig, TypeTable, Validator, generate, loader};

#[derive(Parser, Debug)]
struct Args {
    /// API description files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[arg(long)]
    json_pointer: Option<String>,

    #[arg(long)]
    type_table: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(&Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let type_table = match &args.type_table {
        Some(path) => TypeTable::load(path)?,
        None => TypeTable::default(),
    };
    let config = GeneratorConfig { type_table, ..GeneratorConfig::default() };
    let model = loader::load_files(args.inputs.as_slice(), args.json_pointer.as_deref())?;

    let first = tempfile::TempDir::new()?;
    let second = tempfile::TempDir::new()?;
    for dir in [&first, &second] {
        let report = generate(&model, &config, dir.path())?;
        if report.failed() > 0 {
            eprintln!("{} {} module(s) failed to emit", "✗".red(), report.failed());
            return Ok(false);
        }
    }

    let mut ok = true;
    for module in &model.modules {
        let name = format!("{}.lua", module.name);
        if read(first.path(), &name)? != read(second.path(), &name)? {
            eprintln!("{} {name}: output differs between runs", "✗".red());
            ok = false;
        }
    }

    let validation = Validator::new(&config.type_table).validate_dir(first.path())?;
    for file in validation.files.iter().filter(|f| !f.passed()) {
        for d in &file.diagnostics {
            eprintln!("{} {}:{}: {}", "✗".red(), file.path.display(), d.line, d.message);
        }
    }
    ok &= validation.is_success();

    if ok {
        eprintln!("{} {} module(s) stable and valid", "✓".green(), model.modules.len());
    }
    Ok(ok)
}

fn read(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    std::fs::read(&path).with_context(|| format!("missing output {}", path.display()))
}
