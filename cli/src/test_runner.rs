use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use questmd::{BlockRegistry, ConvertError, Quest};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expected conversion error; its message must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If true, conversion must fail with a structural error
    /// (malformed header, missing/duplicate id, unknown block type).
    #[serde(default)]
    pub expect_structural_error: bool,

    /// Expected total number of blocks.
    #[serde(default)]
    pub expect_block_count: Option<usize>,

    /// Expected section names, in order.
    #[serde(default)]
    pub expect_sections: Option<Vec<String>>,

    /// Expected block `type` discriminants, in document order.
    #[serde(default)]
    pub expect_block_types: Option<Vec<String>>,
}

impl TestConfig {
    fn expects_error(&self) -> bool {
        self.expect_error.is_some() || self.expect_structural_error
    }
}

/// Parse a `.test.md` file into its TOML config and quest source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    // An empty frontmatter closes immediately.
    let close_pos = if after_open.starts_with("---") {
        0
    } else {
        after_open
            .find("\n---")
            .map(|pos| pos + 1)
            .ok_or("missing closing --- frontmatter delimiter")?
    };

    let toml_str = after_open[..close_pos].trim_end_matches(['\r', '\n']);
    let rest = &after_open[close_pos + 3..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path, registry: &BlockRegistry) -> TestResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let parser = questmd::Parser::new(source.to_string(), 0);
    let result = parser.parse(registry);

    let outcome = match check_error(&config, source, &result) {
        Some(reason) => TestOutcome::Fail(reason),
        None => match &result {
            Ok(quest) => match check_quest(&config, quest) {
                Some(reason) => TestOutcome::Fail(reason),
                None => TestOutcome::Pass,
            },
            Err(_) => TestOutcome::Pass,
        },
    };

    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Check error expectations. Returns `Some(reason)` on mismatch.
fn check_error(
    config: &TestConfig,
    source: &str,
    result: &Result<Quest, ConvertError>,
) -> Option<String> {
    let err = match (config.expects_error(), result) {
        (false, Ok(_)) => return None,
        (false, Err(err)) => return Some(format!("unexpected error: {}", describe(source, err))),
        (true, Ok(_)) => {
            return Some(match &config.expect_error {
                Some(expected) => format!(
                    "expected error containing \"{}\", but conversion succeeded",
                    expected
                ),
                None => "expected a structural error, but conversion succeeded".to_string(),
            });
        }
        (true, Err(err)) => err,
    };

    if config.expect_structural_error && !err.kind.is_structural() {
        return Some(format!(
            "expected a structural error, got {} error: {}",
            err.kind,
            describe(source, err)
        ));
    }
    if let Some(expected) = &config.expect_error {
        if !err.message.contains(expected.as_str()) {
            return Some(format!(
                "expected error containing \"{}\", got: {}",
                expected,
                describe(source, err)
            ));
        }
    }
    None
}

/// Check the converted quest against the expectations. Returns `Some(reason)` on mismatch.
fn check_quest(config: &TestConfig, quest: &Quest) -> Option<String> {
    if let Some(expected) = config.expect_block_count {
        if quest.block_count != expected {
            return Some(format!("expected {} block(s), got {}", expected, quest.block_count));
        }
    }

    if let Some(expected) = &config.expect_sections {
        let actual: Vec<&str> = quest.sections.iter().map(|s| s.name.as_str()).collect();
        if actual != *expected {
            return Some(format!(
                "section mismatch\n  expected: {}\n  actual:   {}",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    if let Some(expected) = &config.expect_block_types {
        let actual: Vec<&str> = quest.blocks().map(|b| b.block_type()).collect();
        if actual != *expected {
            return Some(format!(
                "block type mismatch\n  expected: {}\n  actual:   {}",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    None
}

/// Error message with the 1-based line it points at, if any.
fn describe(source: &str, err: &ConvertError) -> String {
    match &err.span {
        Some(span) => format!("{} (line {})", err, byte_offset_to_line(source, span.start)),
        None => err.to_string(),
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".test.md") {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn ok_label(no_color: bool) -> &'static str {
    if no_color { "ok" } else { "\x1b[32mok\x1b[0m" }
}

fn failed_label(no_color: bool) -> &'static str {
    if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn label_for<'a>(result: &'a TestResult) -> &'a str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(".test.md"))
            .unwrap_or("?")
    })
}

/// Filter categories by the requested names; a name also selects its sub-folders.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let run_categories: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        // Single file mode: categories are ignored.
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        select_categories(&all_categories, categories)
            .into_iter()
            .map(|(cat, files)| (cat.to_string(), files.clone()))
            .collect()
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let registry = BlockRegistry::with_builtins();
    report(&run_categories, &registry, no_color)
}

fn report(categories: &[(String, Vec<PathBuf>)], registry: &BlockRegistry, no_color: bool) -> i32 {
    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in categories {
        if !cat.is_empty() {
            eprintln!();
            eprintln!("{}", bold(cat, no_color));
        }

        for file in files {
            let result = run_single_test(file, registry);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), label_for(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", fail_label(no_color), label_for(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", ok_label(no_color), passed);
        0
    } else {
        let failed = failures.len();
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            failed_label(no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmatter_and_source() {
        let content =
            "---\ndescription = \"two sections\"\nexpect_sections = [\"A\", \"B\"]\n---\n# Quest: Q\n";
        let (config, source) = parse_test_file(content).unwrap();
        assert_eq!(config.description.as_deref(), Some("two sections"));
        assert_eq!(config.expect_sections, Some(vec!["A".to_string(), "B".to_string()]));
        assert!(!config.expects_error());
        assert_eq!(source, "# Quest: Q\n");
    }

    #[test]
    fn empty_frontmatter() {
        let (config, source) = parse_test_file("---\n---\n# Quest: Q").unwrap();
        assert!(config.description.is_none());
        assert_eq!(source, "# Quest: Q");
    }

    #[test]
    fn crlf_frontmatter() {
        let content = "---\r\nexpect_structural_error = true\r\n---\r\n# Quest: Q\r\n";
        let (config, source) = parse_test_file(content).unwrap();
        assert!(config.expect_structural_error);
        assert_eq!(source, "# Quest: Q\r\n");
    }

    #[test]
    fn missing_delimiters() {
        assert!(parse_test_file("# Quest: Q").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n# Quest: Q").is_err());
        assert!(parse_test_file("---\nunknown_key = 1\n---\n").is_err());
    }

    #[test]
    fn expectations() {
        let registry = BlockRegistry::with_builtins();
        let source = "# Quest: Q\nid: q\n\n## Section: S\n\n### para:\nid: p\n\nText.\n";
        let result = questmd::Parser::new(source.to_string(), 0).parse(&registry);

        let config = TestConfig {
            expect_block_count: Some(1),
            expect_block_types: Some(vec!["PARA".to_string()]),
            ..TestConfig::default()
        };
        assert!(check_error(&config, source, &result).is_none());
        assert!(check_quest(&config, result.as_ref().unwrap()).is_none());

        let config = TestConfig {
            expect_sections: Some(vec!["Other".to_string()]),
            ..TestConfig::default()
        };
        let reason = check_quest(&config, result.as_ref().unwrap()).unwrap();
        assert!(reason.starts_with("section mismatch"), "{}", reason);

        let config = TestConfig {
            expect_error: Some("boom".to_string()),
            ..TestConfig::default()
        };
        let reason = check_error(&config, source, &result).unwrap();
        assert_eq!(reason, "expected error containing \"boom\", but conversion succeeded");
    }

    #[test]
    fn error_lines_are_reported() {
        let source = "# Quest: Q\nid: q\n\n## Section: S\n\n### para: Empty\nid: e\n";
        let result =
            questmd::Parser::new(source.to_string(), 0).parse(&BlockRegistry::with_builtins());
        let reason = check_error(&TestConfig::default(), source, &result).unwrap();
        assert_eq!(
            reason,
            "unexpected error: Content cannot be empty for block ID: e (line 6)"
        );
    }

    #[test]
    fn quest_fixtures_pass() {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/quests");
        let categories = discover_categorized(&fixtures);
        assert!(categories.contains_key("errors"));
        assert_eq!(run_tests(&fixtures, true, &[]), 0);
    }
}
