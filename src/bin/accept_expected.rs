//! Binary to generate/update .expected.rb and .expected.err fixture files
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all
//!   cargo run --bin accept_expected -- basic   # Update only fixtures matching "basic"

use rbx_transpiler::{GenerateOptions, Pipeline};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let fixture_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");

    let mut updated = 0;
    let mut skipped = 0;

    for entry in WalkDir::new(&fixture_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|s| s == "rbx"))
    {
        let path = entry.path();

        if let Some(ref f) = filter {
            if !path.to_string_lossy().contains(f) {
                skipped += 1;
                continue;
            }
        }

        process_file(path);
        updated += 1;
    }

    println!("Updated {} files, skipped {}", updated, skipped);
}

fn process_file(path: &Path) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", path, e);
            return;
        }
    };

    let is_error_fixture = path
        .parent()
        .and_then(|p| p.file_name())
        .is_some_and(|name| name == "errors");

    let mut pipeline = Pipeline::standard();
    match pipeline.compile(&source, &GenerateOptions::default()) {
        Ok(output) => {
            if is_error_fixture {
                eprintln!("ERROR: {:?} compiles but is in errors/", path);
                return;
            }
            write_expected(&path.with_extension("expected.rb"), &output.code);
        }
        Err(e) => {
            if !is_error_fixture {
                eprintln!("ERROR: {:?} failed to compile but is not in errors/: {}", path, e);
                return;
            }
            let filename = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown");
            write_expected(&path.with_extension("expected.err"), &e.render(&source, filename));
        }
    }
}

fn write_expected(path: &Path, content: &str) {
    if let Err(e) = fs::write(path, content) {
        eprintln!("Failed to write {:?}: {}", path, e);
    } else {
        println!("  wrote {}", path.display());
    }
}
