use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use questmd::{BlockRegistry, ConvertError, Parser, Quest, QuestSummary};

use crate::config::BuildConfig;

/// A quest file that did not convert.
pub struct BuildFailure {
    pub path: PathBuf,
    pub source: String,
    pub error: ConvertError,
}

/// Outcome of a build. Nothing is written unless `failures` is empty.
#[derive(Default)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<BuildFailure>,
}

/// Convert every quest under `config.input_dir` and write the JSON output.
///
/// Writes `<output_dir>/<index_file>` holding every quest summary, plus one
/// `<output_dir>/<file_prefix><id>.json` per quest.
pub fn build(config: &BuildConfig) -> Result<BuildReport> {
    let files = find_quest_files(&config.input_dir)?;
    if files.is_empty() {
        bail!("no quest files found in '{}'", config.input_dir.display());
    }
    log::info!("converting {} quest file(s) from {}", files.len(), config.input_dir.display());

    let registry = BlockRegistry::with_builtins();
    let mut report = BuildReport::default();
    let mut quests: Vec<(PathBuf, Quest)> = Vec::with_capacity(files.len());

    for (file_id, path) in files.into_iter().enumerate() {
        let source = fs::read_to_string(&path)
            .with_context(|| format!("cannot read '{}'", path.display()))?;
        let parser = Parser::new(source.clone(), file_id).with_asset_base(&config.asset_base);
        match parser.parse(&registry) {
            Ok(quest) => {
                log::debug!("{}: {} blocks", path.display(), quest.block_count);
                quests.push((path, quest));
            }
            Err(error) => report.failures.push(BuildFailure { path, source, error }),
        }
    }
    if !report.failures.is_empty() {
        return Ok(report);
    }

    check_quest_ids(&quests)?;

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("cannot create '{}'", config.output_dir.display()))?;

    let summaries: Vec<QuestSummary> = quests.iter().map(|(_, quest)| quest.summary()).collect();
    let index_path = config.output_dir.join(&config.index_file);
    write_json(&index_path, &summaries)?;
    report.written.push(index_path);

    for (_, quest) in &quests {
        let path = config.output_dir.join(config.quest_file_name(&quest.id));
        write_json(&path, quest)?;
        report.written.push(path);
    }
    Ok(report)
}

/// Quest ids name the output files, so each must be present, unique and a
/// plain file name component.
fn check_quest_ids(quests: &[(PathBuf, Quest)]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for (path, quest) in quests {
        if quest.id.is_empty() {
            bail!("{}: quest \"{}\" has no id", path.display(), quest.name);
        }
        if quest.id.contains(['/', '\\']) || quest.id == "." || quest.id == ".." {
            bail!(
                "{}: quest id \"{}\" cannot be used as a file name",
                path.display(),
                quest.id
            );
        }
        if let Some(first) = seen.insert(&quest.id, path) {
            bail!(
                "{}: quest id \"{}\" is already used by {}",
                path.display(),
                quest.id,
                first.display()
            );
        }
    }
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json + "\n").with_context(|| format!("cannot write '{}'", path.display()))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// Quest sources under `dir`, sorted. `.test.md` fixtures are skipped.
pub fn find_quest_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_quest_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_quest_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot read directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_quest_files(&path, out)?;
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".md") && !name.ends_with(".test.md") {
                out.push(path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTRO: &str = "# Quest: Intro
id: intro
desc: First steps.
category: Basics

## Section: Start

### para: Hello
id: hello

Hello there. ![[wave.png]]
";

    const SETS: &str = "# Quest: Sets
id: sets
desc: Collections.

## Section: Definitions

### definition: Set
id: set-def

A set is a collection of distinct objects.
";

    fn config_for(input: &Path, output: &Path) -> BuildConfig {
        BuildConfig {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            ..BuildConfig::default()
        }
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn writes_index_and_quest_files() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::create_dir(input.path().join("algebra")).unwrap();
        fs::write(input.path().join("intro.md"), INTRO).unwrap();
        fs::write(input.path().join("algebra/sets.md"), SETS).unwrap();
        fs::write(input.path().join("notes.txt"), "not a quest").unwrap();

        let mut config = config_for(input.path(), &output.path().join("quests"));
        config.asset_base = "/img".to_string();
        let report = build(&config).unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.written.len(), 3);

        let index = read_json(&output.path().join("quests/quests.json"));
        let ids: Vec<&str> = index
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["sets", "intro"]);
        assert_eq!(index[1]["blockCount"], 1);
        assert!(index[1].get("sections").is_none());

        for id in ids {
            let quest = read_json(&output.path().join(format!("quests/quest-{}.json", id)));
            assert_eq!(quest["id"], id);
        }
        let intro = read_json(&output.path().join("quests/quest-intro.json"));
        assert_eq!(
            intro["sections"][0]["blocks"][0]["content"],
            "Hello there. ![wave](/img/wave.png)"
        );
    }

    #[test]
    fn failing_quest_writes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("intro.md"), INTRO).unwrap();
        fs::write(
            input.path().join("broken.md"),
            "# Quest: Broken\nid: broken\n\n## Section: S\n\n### para: No id\n\nText.\n",
        )
        .unwrap();

        let out_dir = output.path().join("out");
        let report = build(&config_for(input.path(), &out_dir)).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("broken.md"));
        assert!(report.written.is_empty());
        assert!(!out_dir.exists());
    }

    #[test]
    fn duplicate_quest_ids_are_rejected() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a.md"), INTRO).unwrap();
        fs::write(input.path().join("b.md"), INTRO).unwrap();

        let err = build(&config_for(input.path(), output.path())).err().expect("duplicate ids");
        assert!(err.to_string().contains("quest id \"intro\" is already used"), "{}", err);
    }

    #[test]
    fn quest_ids_must_be_file_names() {
        for id in ["../escape", "nested/quest", "back\\slash", ".."] {
            let input = tempfile::tempdir().unwrap();
            let output = tempfile::tempdir().unwrap();
            let quest = format!("# Quest: Bad\nid: {}\n\n## Section: S\n", id);
            fs::write(input.path().join("bad.md"), quest).unwrap();

            let out_dir = output.path().join("out");
            let err = build(&config_for(input.path(), &out_dir)).err().expect("bad id");
            assert!(err.to_string().contains("cannot be used as a file name"), "{}", err);
            assert!(!out_dir.exists());
            assert!(!output.path().join("escape.json").exists());
        }
    }

    #[test]
    fn fixtures_and_other_files_are_skipped() {
        let input = tempfile::tempdir().unwrap();
        fs::write(input.path().join("quest.md"), INTRO).unwrap();
        fs::write(input.path().join("case.test.md"), "---\n---\n").unwrap();
        fs::write(input.path().join("readme.txt"), "").unwrap();

        let files = find_quest_files(input.path()).unwrap();
        assert_eq!(files, vec![input.path().join("quest.md")]);
    }
}
