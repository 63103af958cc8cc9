use htmldiff::DiffOptions;
use libtest_mimic::Failed;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Default)]
pub struct FixtureOptions {
    #[serde(flatten)]
    pub diff: DiffOptions,
    #[serde(default)]
    pub blocks: Vec<String>,
}

pub struct Fixture {
    /// `group/stem`, e.g. `text/unicode`
    pub name: String,
    /// First directory under `tests/fixtures`
    pub group: String,
    pub old: String,
    pub new: String,
    pub options: FixtureOptions,
    pub has_options: bool,
}

impl Fixture {
    pub fn block_patterns(&self) -> Result<Vec<Regex>, Failed> {
        self.options
            .blocks
            .iter()
            .map(|p| Regex::new(p).map_err(|e| Failed::from(e.to_string())))
            .collect()
    }
}

/// Every `*.old.html` under `tests/fixtures` with a `*.new.html` sibling.
pub fn discover() -> Vec<Fixture> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    let pattern = format!("{}/**/*.old.html", root.display());

    let mut fixtures = Vec::new();
    for old_path in glob::glob(&pattern).expect("invalid glob pattern").flatten() {
        let old_name = old_path.to_string_lossy().to_string();
        let stem = old_name.trim_end_matches(".old.html");
        let new_path = format!("{}.new.html", stem);
        let options_path = format!("{}.options.json", stem);

        let Ok(new) = fs::read_to_string(&new_path) else {
            continue;
        };
        let old = fs::read_to_string(&old_path).expect("failed to read fixture");

        let has_options = Path::new(&options_path).exists();
        let options = if has_options {
            let json = fs::read_to_string(&options_path).expect("failed to read options");
            serde_json::from_str(&json).expect("invalid fixture options")
        } else {
            FixtureOptions::default()
        };

        let relative = Path::new(stem).strip_prefix(&root).unwrap_or(Path::new(stem));
        let name = relative.to_string_lossy().replace('\\', "/");
        let group = name.split('/').next().unwrap_or_default().to_string();

        fixtures.push(Fixture { name, group, old, new, options, has_options });
    }
    fixtures.sort_by(|a, b| a.name.cmp(&b.name));
    fixtures
}
