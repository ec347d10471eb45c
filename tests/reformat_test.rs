//! Reformatting code regions across a document tree.

use std::fs;
use std::path::Path;

use folio::Result;
use folio::reformat::{
    CommandFormatter, DEFAULT_BEGIN, DEFAULT_END, FormatOptions, RegionSyntax, format_tree,
};
use proptest::prelude::*;
use tempfile::TempDir;

fn syntax() -> RegionSyntax {
    RegionSyntax::new(DEFAULT_BEGIN, DEFAULT_END).unwrap()
}

fn upper(code: &str) -> Result<String> {
    Ok(format!("{}\n", code.to_uppercase()))
}

fn region(code: &str) -> String {
    format!("{DEFAULT_BEGIN}\n{code}\n{DEFAULT_END}")
}

/// Text between regions, in order.
fn gaps(text: &str) -> Vec<String> {
    let mut gaps = Vec::new();
    let mut last = 0;
    for region in syntax().find(text) {
        gaps.push(text[last..region.span.start].to_string());
        last = region.span.end;
    }
    gaps.push(text[last..].to_string());
    gaps
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_tree_reformats_nested_documents() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("contents");
    let chapter = format!("\\chapter{{Processes}}\n{}\nText.\n", region("  pid = spawn(fn -> :ok end)  "));
    write(&root, "part1/ch1.tex", &chapter);
    write(&root, "part2/ch2.tex", &format!("{}\n{}\n", region("a"), region("b")));
    write(&root, "notes.md", &region("untouched"));

    let report = format_tree(&FormatOptions::new(&root, syntax()), &upper).unwrap();

    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.regions(), 3);
    assert_eq!(
        fs::read_to_string(root.join("part1/ch1.tex")).unwrap(),
        format!("\\chapter{{Processes}}\n{}\nText.\n", region("PID = SPAWN(FN -> :OK END)"))
    );
    assert_eq!(
        fs::read_to_string(root.join("part2/ch2.tex")).unwrap(),
        format!("{}\n{}\n", region("A"), region("B"))
    );
    assert_eq!(fs::read_to_string(root.join("notes.md")).unwrap(), region("untouched"));
}

#[test]
fn test_check_mode_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    let doc = region("x = 1");
    write(dir.path(), "a.tex", &doc);
    write(dir.path(), "b.tex", &region("Y"));

    let options = FormatOptions {
        check: true,
        ..FormatOptions::new(dir.path(), syntax())
    };
    let report = format_tree(&options, &upper).unwrap();

    let changed: Vec<_> = report.changed().collect();
    assert_eq!(changed, vec![dir.path().join("a.tex")]);
    assert_eq!(fs::read_to_string(dir.path().join("a.tex")).unwrap(), doc);
}

#[test]
fn test_custom_markers_and_extensions() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "guide.md", "Intro\n```elixir\nx=1\n```\nEnd\n");

    let options = FormatOptions {
        extensions: vec!["md".to_string()],
        ..FormatOptions::new(dir.path(), RegionSyntax::new("```elixir", "```").unwrap())
    };
    format_tree(&options, &upper).unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("guide.md")).unwrap(),
        "Intro\n```elixir\nX=1\n```\nEnd\n"
    );
}

#[cfg(unix)]
#[test]
fn test_command_formatter_over_tree() {
    let dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    write(dir.path(), "ch.tex", &format!("before\n{}\nafter\n", region("defmodule a do end")));
    write(dir.path(), "broken.tex", &region("FAIL"));

    let formatter = CommandFormatter::new("sh")
        .with_args([
            "-c",
            r#"grep -q FAIL "$0" && { echo "cannot parse" >&2; exit 1; }; tr a-z A-Z < "$0" > "$0.out" && mv "$0.out" "$0""#,
        ])
        .with_suffix(".ex")
        .with_scratch_dir(scratch.path());

    let report = format_tree(&FormatOptions::new(dir.path(), syntax()), &formatter).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].0.ends_with("broken.tex"));
    assert!(report.failures[0].1.to_string().contains("cannot parse"));

    assert_eq!(
        fs::read_to_string(dir.path().join("ch.tex")).unwrap(),
        format!("before\n{}\nafter\n", region("DEFMODULE A DO END"))
    );
    assert_eq!(fs::read_to_string(dir.path().join("broken.tex")).unwrap(), region("FAIL"));
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

fn prose() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,{}%\n]{0,40}"
}

fn code() -> impl Strategy<Value = String> {
    "[a-z0-9 =():\n]{0,30}"
}

fn document() -> impl Strategy<Value = (Vec<String>, String)> {
    (prose(), prop::collection::vec((code(), prose()), 0..6)).prop_map(|(first, rest)| {
        let mut text = first.clone();
        let mut gaps = vec![first];
        for (code, prose) in rest {
            text.push_str(&region(&code));
            text.push_str(&prose);
            gaps.push(prose);
        }
        (gaps, text)
    })
}

proptest! {
    #[test]
    fn prop_text_outside_regions_is_preserved((expected_gaps, text) in document()) {
        let rewrite = syntax().rewrite(&text, &upper).unwrap();

        prop_assert_eq!(rewrite.regions, expected_gaps.len() - 1);
        prop_assert_eq!(syntax().find(&rewrite.text).len(), rewrite.regions);
        prop_assert_eq!(gaps(&rewrite.text), expected_gaps);
    }

    #[test]
    fn prop_rewrite_is_idempotent((_, text) in document()) {
        let once = syntax().rewrite(&text, &upper).unwrap().text;
        let twice = syntax().rewrite(&once, &upper).unwrap().text;
        prop_assert_eq!(once, twice);
    }
}
