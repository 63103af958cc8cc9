use clap::{Args, Parser, Subcommand};
use htmldiff::token::{self, TokenKind};
use htmldiff::{DiffError, DiffOptions, HtmlDiff, Operation, TextSide};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Block expression used by the demo: dates like `1 Jan 2016`
const DEMO_DATE_PATTERN: &str = r"[\d]{1,2}[\s]*(Jan|Feb)[\s]*[\d]{4}";
const DEMO_OLD: &str = include_str!("../demos/sample.old.html");
const DEMO_NEW: &str = include_str!("../demos/sample.new.html");

const OLD_SUFFIX: &str = ".old.html";
const NEW_SUFFIX: &str = ".new.html";
const DIFF_SUFFIX: &str = ".diff.html";

#[derive(Parser)]
#[command(name = "htmldiff")]
#[command(about = "htmldiff - word-level visual diff for HTML fragments")]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct DiffArgs {
    /// Regex whose matches are compared as a single unit (repeatable)
    #[arg(long = "block", value_name = "REGEX")]
    blocks: Vec<String>,

    /// Share (0-1) of the new text a token may fill before it is skipped by the matcher
    #[arg(long, value_name = "F")]
    repeating_words_accuracy: Option<f64>,

    /// Relative size (0-1) below which a match between changes is ignored
    #[arg(long, value_name = "F")]
    orphan_match_threshold: Option<f64>,

    /// Treat all whitespace runs as equal
    #[arg(long)]
    ignore_whitespace: bool,

    /// JSON file with diff options
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two HTML files
    Diff {
        /// Old version
        #[arg(required_unless_present = "stdin")]
        old: Option<PathBuf>,

        /// New version
        #[arg(required_unless_present = "stdin")]
        new: Option<PathBuf>,

        /// Read {"old", "new", "options", "blocks"} JSON from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON with the operation list
        #[arg(long)]
        json: bool,

        /// Write the result to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        args: DiffArgs,
    },

    /// Print the token stream of an HTML file
    Tokens {
        file: PathBuf,

        /// Regex whose matches are kept as a single token (repeatable)
        #[arg(long = "block", value_name = "REGEX")]
        blocks: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diff every *.old.html / *.new.html pair under a directory into *.diff.html
    Dir {
        dir: PathBuf,

        #[command(flatten)]
        args: DiffArgs,
    },

    /// Diff the built-in sample documents
    Demo,
}

#[derive(Deserialize)]
struct StdinRequest {
    #[serde(default)]
    old: String,
    #[serde(default)]
    new: String,
    #[serde(default)]
    options: Option<DiffOptions>,
    #[serde(default)]
    blocks: Vec<String>,
}

#[derive(Serialize)]
struct DiffOutput<'a> {
    html: &'a str,
    operations: &'a [Operation],
}

#[derive(Serialize)]
struct TokenOutput<'a> {
    text: &'a str,
    kind: TokenKind,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Diff { old, new, stdin, json, output, args } => {
            if stdin {
                diff_stdin(&args, json, output.as_deref());
            } else if let (Some(old), Some(new)) = (old, new) {
                diff_files(&old, &new, &args, json, output.as_deref());
            } else {
                fail("provide OLD and NEW files or use --stdin");
            }
        }
        Commands::Tokens { file, blocks, json } => print_tokens(&file, &blocks, json),
        Commands::Dir { dir, args } => diff_directory(&dir, &args),
        Commands::Demo => run_demo(),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn read_file(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| fail(&format!("failed to read {}: {}", path.display(), e)))
}

fn write_file(path: &Path, content: &str) {
    if let Err(e) = fs::write(path, content) {
        fail(&format!("failed to write {}: {}", path.display(), e));
    }
}

/// Options file first, then command-line flags on top.
fn resolve_options(args: &DiffArgs, base: Option<DiffOptions>) -> DiffOptions {
    let mut options = match &args.options {
        Some(path) => serde_json::from_str(&read_file(path))
            .unwrap_or_else(|e| fail(&format!("invalid options in {}: {}", path.display(), e))),
        None => base.unwrap_or_default(),
    };
    if let Some(accuracy) = args.repeating_words_accuracy {
        options.repeating_words_accuracy = accuracy;
    }
    if let Some(threshold) = args.orphan_match_threshold {
        options.orphan_match_threshold = threshold;
    }
    if args.ignore_whitespace {
        options.ignore_whitespace_differences = true;
    }
    options
}

fn compile_blocks(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| fail(&format!("invalid block expression {:?}: {}", p, e))))
        .collect()
}

/// Diff two texts, reporting block expression errors against the text they occur in.
fn run_diff(
    old: (&str, &str),
    new: (&str, &str),
    options: DiffOptions,
    blocks: Vec<Regex>,
    with_operations: bool,
) -> (String, Vec<Operation>) {
    let (old_name, old_source) = old;
    let (new_name, new_source) = new;

    let mut diff = HtmlDiff::with_options(old_source, new_source, options);
    for block in blocks {
        diff.add_block_expression(block);
    }

    let result = diff.build().and_then(|html| {
        let operations = if with_operations { diff.operations()? } else { Vec::new() };
        Ok((html, operations))
    });
    result.unwrap_or_else(|e| {
        let (name, source) = match e.side {
            Some(TextSide::New) => (new_name, new_source),
            _ => (old_name, old_source),
        };
        report(&e, source, name)
    })
}

fn report(error: &DiffError, source: &str, name: &str) -> ! {
    if io::stderr().is_terminal() {
        eprint!("{}", error.render_color(source, name));
    } else {
        eprint!("{}", error.render(source, name));
    }
    std::process::exit(1);
}

fn emit(html: &str, operations: &[Operation], json: bool, output: Option<&Path>) {
    let text = if json {
        let out = DiffOutput { html, operations };
        serde_json::to_string(&out).unwrap_or_else(|e| fail(&e.to_string()))
    } else {
        html.to_string()
    };
    match output {
        Some(path) => {
            write_file(path, &text);
            print_generated(&path.display().to_string());
        }
        None if json => println!("{}", text),
        None => print!("{}", text),
    }
}

fn diff_files(old: &Path, new: &Path, args: &DiffArgs, json: bool, output: Option<&Path>) {
    let old_source = read_file(old);
    let new_source = read_file(new);
    let old_name = old.display().to_string();
    let new_name = new.display().to_string();

    let (html, operations) = run_diff(
        (old_name.as_str(), old_source.as_str()),
        (new_name.as_str(), new_source.as_str()),
        resolve_options(args, None),
        compile_blocks(&args.blocks),
        json,
    );
    emit(&html, &operations, json, output);
}

fn diff_stdin(args: &DiffArgs, json: bool, output: Option<&Path>) {
    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        fail(&format!("failed to read stdin: {}", e));
    }
    let request: StdinRequest =
        serde_json::from_str(&input).unwrap_or_else(|e| fail(&format!("invalid request: {}", e)));

    let mut blocks = request.blocks;
    blocks.extend(args.blocks.iter().cloned());

    let (html, operations) = run_diff(
        ("<old>", request.old.as_str()),
        ("<new>", request.new.as_str()),
        resolve_options(args, request.options),
        compile_blocks(&blocks),
        json,
    );
    emit(&html, &operations, json, output);
}

fn print_tokens(path: &Path, blocks: &[String], json: bool) {
    let source = read_file(path);
    let patterns = compile_blocks(blocks);
    let tokens = htmldiff::tokenizer::tokenize_with_blocks(&source, &patterns)
        .unwrap_or_else(|e| report(&e, &source, &path.display().to_string()));

    if json {
        let out: Vec<TokenOutput> = tokens
            .iter()
            .map(|t| TokenOutput { text: t, kind: token::classify(t) })
            .collect();
        println!("{}", serde_json::to_string(&out).unwrap_or_else(|e| fail(&e.to_string())));
    } else {
        for t in &tokens {
            let kind = format!("{:?}", token::classify(t)).to_lowercase();
            println!("{:<10} {:?}", kind, t);
        }
    }
}

fn diff_directory(dir: &Path, args: &DiffArgs) {
    if !dir.is_dir() {
        fail(&format!("{} is not a directory", dir.display()));
    }

    let start = Instant::now();
    let options = resolve_options(args, None);
    let mut file_count = 0;

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(OLD_SUFFIX))
    {
        let old_path = entry.path();
        let old_name = old_path.to_string_lossy();
        let stem = &old_name[..old_name.len() - OLD_SUFFIX.len()];
        let new_path = PathBuf::from(format!("{}{}", stem, NEW_SUFFIX));
        if !new_path.exists() {
            tracing::warn!(path = %old_path.display(), "no matching {} file, skipping", NEW_SUFFIX);
            continue;
        }

        let old_source = read_file(old_path);
        let new_source = read_file(&new_path);
        let new_name = new_path.display().to_string();
        let (html, _) = run_diff(
            (&*old_name, old_source.as_str()),
            (new_name.as_str(), new_source.as_str()),
            options,
            compile_blocks(&args.blocks),
            false,
        );

        let output = PathBuf::from(format!("{}{}", stem, DIFF_SUFFIX));
        write_file(&output, &html);
        print_generated(&output.display().to_string());
        file_count += 1;
    }

    if file_count == 0 {
        fail(&format!("no {} / {} pairs found in {}", OLD_SUFFIX, NEW_SUFFIX, dir.display()));
    }
    print_summary(file_count, start.elapsed());
}

fn run_demo() {
    let date = RegexBuilder::new(DEMO_DATE_PATTERN)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| fail(&e.to_string()));

    let (html, _) = run_diff(
        ("sample.old.html", DEMO_OLD),
        ("sample.new.html", DEMO_NEW),
        DiffOptions::default(),
        vec![date],
        false,
    );

    println!("Old text:\n\n{}\n", DEMO_OLD);
    println!("New text:\n\n{}\n", DEMO_NEW);
    println!("Diff:\n\n{}", html);
}

fn print_generated(path: &str) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if is_tty {
        eprintln!("\n\x1b[1m✨ Diffed {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\n✨ Diffed {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
