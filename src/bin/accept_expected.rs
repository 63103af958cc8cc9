//! Binary to generate/update .expected.html fixture files
//!
//! Usage:
//!   cargo run --bin accept_expected                # Update all
//!   cargo run --bin accept_expected -- formatting  # Update only fixtures matching "formatting"

use htmldiff::{DiffOptions, HtmlDiff};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Deserialize, Default)]
struct FixtureOptions {
    #[serde(flatten)]
    diff: DiffOptions,
    #[serde(default)]
    blocks: Vec<String>,
}

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let fixture_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");

    let mut updated = 0;
    let mut skipped = 0;

    let mut entries: Vec<_> = WalkDir::new(&fixture_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".old.html"))
        .collect();
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    for entry in entries {
        let path = entry.path();
        let path_str = path.to_string_lossy();

        if let Some(ref f) = filter {
            if !path_str.contains(f) {
                skipped += 1;
                continue;
            }
        }

        if process_fixture(path) {
            updated += 1;
        } else {
            skipped += 1;
        }
    }

    println!("Updated {} files, skipped {}", updated, skipped);
}

fn process_fixture(old_path: &Path) -> bool {
    let path_str = old_path.to_string_lossy();
    let stem = path_str.trim_end_matches(".old.html");
    let new_path = format!("{}.new.html", stem);
    let options_path = format!("{}.options.json", stem);
    let expected_path = format!("{}.expected.html", stem);

    let read = |path: &str| match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            None
        }
    };

    let (Some(old), Some(new)) = (read(&*path_str), read(new_path.as_str())) else {
        return false;
    };

    let options = if Path::new(&options_path).exists() {
        let Some(json) = read(options_path.as_str()) else {
            return false;
        };
        match serde_json::from_str::<FixtureOptions>(&json) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Invalid options in {}: {}", options_path, e);
                return false;
            }
        }
    } else {
        FixtureOptions::default()
    };

    let mut diff = HtmlDiff::with_options(&old, &new, options.diff);
    for pattern in &options.blocks {
        match Regex::new(pattern) {
            Ok(re) => {
                diff.add_block_expression(re);
            }
            Err(e) => {
                eprintln!("Invalid block expression in {}: {}", options_path, e);
                return false;
            }
        }
    }

    let output = match diff.build() {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", e.render(&old, stem));
            return false;
        }
    };

    if let Err(e) = fs::write(&expected_path, &output) {
        eprintln!("Failed to write {}: {}", expected_path, e);
        return false;
    }
    println!("  wrote {}", expected_path);
    true
}
