//! Property checks over every fixture pair.
//!
//! One trial per fixture and property, named `property::fixture`:
//!
//! - `partition`: operations cover both token streams once, in order
//! - `identity`: diffing a text against itself returns it unchanged
//! - `reconstruct`: dropping inserted content recovers the old text and
//!   dropping deleted content recovers the new text (plain text fixtures)
//! - `attributes`: attribute-only changes produce no markers
//! - `orphans`: raising the orphan threshold never shrinks the change

mod fixtures;

use fixtures::Fixture;
use htmldiff::{Action, DiffOptions, HtmlDiff, Operation, diff, token, tokenize};
use libtest_mimic::{Arguments, Failed, Trial};
use regex::{Captures, Regex};
use std::sync::Arc;

type Check = fn(&Fixture) -> Result<(), Failed>;

const CHECKS: &[(&str, Check)] = &[
    ("partition", check_partition),
    ("identity", check_identity),
    ("reconstruct", check_reconstruct),
    ("attributes", check_attributes),
    ("orphans", check_orphan_monotonicity),
];

fn operations(fixture: &Fixture, options: DiffOptions) -> Result<(Vec<String>, Vec<String>, Vec<Operation>), Failed> {
    let mut diff = HtmlDiff::with_options(&fixture.old, &fixture.new, options);
    for pattern in fixture.block_patterns()? {
        diff.add_block_expression(pattern);
    }
    let (old_words, new_words) = diff.tokens().map_err(|e| e.to_string())?;
    let operations = diff.operations().map_err(|e| e.to_string())?;
    Ok((old_words, new_words, operations))
}

fn check_partition(fixture: &Fixture) -> Result<(), Failed> {
    let (old_words, new_words, ops) = operations(fixture, fixture.options.diff)?;

    let mut old_end = 0;
    let mut new_end = 0;
    for op in &ops {
        if op.start_in_old != old_end || op.start_in_new != new_end {
            return Err(format!("gap or overlap before {:?}", op).into());
        }
        old_end = op.end_in_old;
        new_end = op.end_in_new;
    }
    if old_end != old_words.len() || new_end != new_words.len() {
        return Err("operations stop before the end of the token streams".into());
    }

    let old: String = ops.iter().flat_map(|op| op.old_slice(&old_words)).map(String::as_str).collect();
    let new: String = ops.iter().flat_map(|op| op.new_slice(&new_words)).map(String::as_str).collect();
    if old != old_words.concat() || new != new_words.concat() {
        return Err("operation slices do not reproduce the token streams".into());
    }
    Ok(())
}

fn check_identity(fixture: &Fixture) -> Result<(), Failed> {
    for text in [&fixture.old, &fixture.new] {
        let mut diff = HtmlDiff::with_options(text, text, fixture.options.diff);
        for pattern in fixture.block_patterns()? {
            diff.add_block_expression(pattern);
        }
        let output = diff.build().map_err(|e| e.to_string())?;
        if &output != text {
            return Err(format!("diff(x, x) != x\n--- output ---\n{}", output).into());
        }
    }
    Ok(())
}

/// Wrapped runs starting with a space render it as `&nbsp;`.
fn unwrap(caps: &Captures) -> String {
    let text = &caps[1];
    match text.strip_prefix("&nbsp;") {
        Some(rest) => format!(" {}", rest),
        None => text.to_string(),
    }
}

/// Only holds when the change does not touch markup, so it is checked on
/// the `text/` fixtures.
fn check_reconstruct(fixture: &Fixture) -> Result<(), Failed> {
    if fixture.group != "text" {
        return Ok(());
    }
    let output = diff(&fixture.old, &fixture.new);

    let ins = Regex::new(r"(?s)<ins class='(?:diffins|diffmod)'>(.*?)</ins>").map_err(|e| e.to_string())?;
    let del = Regex::new(r"(?s)<del class='(?:diffdel|diffmod)'>(.*?)</del>").map_err(|e| e.to_string())?;
    let old = ins.replace_all(&del.replace_all(&output, unwrap), "").into_owned();
    let new = del.replace_all(&ins.replace_all(&output, unwrap), "").into_owned();

    if old != fixture.old {
        return Err(format!("old text not recovered\n--- got ---\n{}", old).into());
    }
    if new != fixture.new {
        return Err(format!("new text not recovered\n--- got ---\n{}", new).into());
    }
    Ok(())
}

/// Adds an attribute to every opening tag and expects no markers at all.
fn check_attributes(fixture: &Fixture) -> Result<(), Failed> {
    if fixture.has_options {
        return Ok(());
    }
    for text in [&fixture.old, &fixture.new] {
        let annotated: String = tokenize(text)
            .iter()
            .map(|t| {
                if token::is_opening_tag(t) && !token::is_self_closing_tag(t) {
                    format!("{} data-changed=\"1\">", &t[..t.len() - 1])
                } else {
                    t.clone()
                }
            })
            .collect();

        let output = diff(text, &annotated);
        let expected = tokenize(&annotated).concat();
        if output != expected {
            return Err(format!("attribute change was reported\n--- output ---\n{}", output).into());
        }
    }
    Ok(())
}

fn changed_tokens(ops: &[Operation]) -> usize {
    ops.iter()
        .filter(|op| op.action != Action::Equal)
        .map(|op| (op.end_in_old - op.start_in_old) + (op.end_in_new - op.start_in_new))
        .sum()
}

fn check_orphan_monotonicity(fixture: &Fixture) -> Result<(), Failed> {
    let mut previous = 0;
    for step in 0..=10 {
        let threshold = step as f64 / 10.0;
        let options = DiffOptions { orphan_match_threshold: threshold, ..fixture.options.diff };
        let (_, _, ops) = operations(fixture, options)?;
        let changed = changed_tokens(&ops);
        if changed < previous {
            return Err(format!(
                "threshold {} changed {} tokens, fewer than {} at the previous step",
                threshold, changed, previous
            )
            .into());
        }
        previous = changed;
    }
    Ok(())
}

fn main() {
    let args = Arguments::from_args();

    let mut trials = Vec::new();
    for fixture in fixtures::discover() {
        let fixture = Arc::new(fixture);
        for &(property, check) in CHECKS {
            let fixture = Arc::clone(&fixture);
            trials.push(Trial::test(format!("{}::{}", property, fixture.name), move || check(&fixture)));
        }
    }

    libtest_mimic::run(&args, trials).exit()
}
