//! Compares compiler output against .expected.rb and .expected.err fixtures
//!
//! Run with: cargo test --test expected_tests
//! Regenerate with: cargo run --bin accept_expected

use libtest_mimic::{Arguments, Failed, Trial};
use rbx_transpiler::{GenerateOptions, Pipeline};
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let args = Arguments::from_args();
    let fixture_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");

    let mut trials = Vec::new();
    for path in collect_fixtures(&fixture_dir) {
        let name = format!("output::{}", fixture_name(&path));
        trials.push(Trial::test(name, move || check_output(&path)));
    }
    for path in collect_fixtures(&fixture_dir.join("errors")) {
        let name = format!("errors::{}", fixture_name(&path));
        trials.push(Trial::test(name, move || check_error(&path)));
    }

    libtest_mimic::run(&args, trials).exit();
}

/// All .rbx files directly inside `dir`
fn collect_fixtures(dir: &Path) -> Vec<PathBuf> {
    let pattern = dir.join("*.rbx");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .map(|paths| paths.filter_map(Result::ok).collect())
        .unwrap_or_default();
    files.sort();
    files
}

fn fixture_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn read(path: &Path) -> Result<String, Failed> {
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e).into())
}

fn check_output(path: &Path) -> Result<(), Failed> {
    let source = read(path)?;
    let expected = read(&path.with_extension("expected.rb"))?;

    let mut pipeline = Pipeline::standard();
    let result = pipeline
        .compile(&source, &GenerateOptions::default())
        .map_err(|e| format!("compile error: {}", e))?;

    if result.code.trim() != expected.trim() {
        return Err(format!(
            "output mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
            expected.trim(),
            result.code.trim()
        )
        .into());
    }
    Ok(())
}

fn check_error(path: &Path) -> Result<(), Failed> {
    let source = read(path)?;
    let expected = read(&path.with_extension("expected.err"))?;
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    let mut pipeline = Pipeline::standard();
    match pipeline.compile(&source, &GenerateOptions::default()) {
        Ok(_) => Err("expected a compile error but compilation succeeded".into()),
        Err(e) => {
            let actual = e.render(&source, filename);
            if actual.trim() != expected.trim() {
                return Err(format!(
                    "error mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
                    expected.trim(),
                    actual.trim()
                )
                .into());
            }
            Ok(())
        }
    }
}
