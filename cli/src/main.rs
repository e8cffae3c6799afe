mod build;
mod config;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use questmd::{BlockRegistry, ConvertError, Quest};

use crate::config::{BuildConfig, DEFAULT_CONFIG_FILE};

const SUBCOMMANDS: &[&str] = &["show", "check", "build", "test", "help"];

#[derive(Parser)]
#[command(name = "questmd", version, about = "Quest markdown to JSON converter")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more (repeat for more detail). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one quest and print it
    Show(ShowArgs),

    /// Convert quests and report errors without writing anything
    Check(CheckArgs),

    /// Convert a directory of quests into JSON files
    Build(BuildArgs),

    /// Run .test.md test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ShowArgs {
    /// Quest markdown file
    file: PathBuf,

    /// Print the plain-text projection instead of JSON
    #[arg(long, conflicts_with = "list_blocks")]
    text: bool,

    /// List sections and blocks only
    #[arg(long)]
    list_blocks: bool,

    /// URL prefix for rewritten image embeds
    #[arg(long)]
    asset_base: Option<String>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Quest markdown files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Directory holding quest .md files (overrides the config)
    input: Option<PathBuf>,

    /// Output directory (overrides the config)
    output: Option<PathBuf>,

    /// Build config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL prefix for rewritten image embeds (overrides the config)
    #[arg(long)]
    asset_base: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // If the first positional arg is not a known subcommand, inject "show"
    // so `questmd quest.md` works like `questmd show quest.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        if !SUBCOMMANDS.contains(&args[pos + 1].as_str()) {
            args.insert(pos + 1, "show".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Show(show_args) => do_show(show_args, color_choice),
        Command::Check(check_args) => do_check(check_args, color_choice),
        Command::Build(build_args) => do_build(build_args, color_choice),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn emit_error(
    color_choice: ColorChoice,
    files: &SimpleFiles<String, String>,
    error: &ConvertError,
) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    if error.span.is_some() {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    } else {
        eprintln!("error: {}", error);
    }
}

fn convert(path: &Path, asset_base: Option<&str>, color_choice: ColorChoice) -> Quest {
    let source = read_source(path);
    let mut files = SimpleFiles::new();
    let file_id = files.add(path.display().to_string(), source.clone());

    let mut parser = questmd::Parser::new(source, file_id);
    if let Some(base) = asset_base {
        parser = parser.with_asset_base(base);
    }
    match parser.parse(&BlockRegistry::with_builtins()) {
        Ok(quest) => quest,
        Err(error) => {
            emit_error(color_choice, &files, &error);
            process::exit(1);
        }
    }
}

fn do_show(args: ShowArgs, color_choice: ColorChoice) {
    let quest = convert(&args.file, args.asset_base.as_deref(), color_choice);

    if args.text {
        println!("{}", quest.text());
        return;
    }

    if args.list_blocks {
        println!("# Quest: {} ({})", quest.name, quest.id);
        for section in &quest.sections {
            println!("  ## {}", section.name);
            for block in &section.blocks {
                match block.name() {
                    Some(name) if !name.is_empty() => {
                        println!("    ### {} {} ({})", block.block_type(), block.id(), name)
                    }
                    _ => println!("    ### {} {}", block.block_type(), block.id()),
                }
            }
        }
        return;
    }

    match serde_json::to_string_pretty(&quest) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("error: cannot serialize quest: {}", e);
            process::exit(1);
        }
    }
}

fn do_check(args: CheckArgs, color_choice: ColorChoice) {
    let registry = BlockRegistry::with_builtins();
    let mut files = SimpleFiles::new();
    let mut failed = 0usize;

    for path in &args.files {
        let source = read_source(path);
        let file_id = files.add(path.display().to_string(), source.clone());
        match questmd::Parser::new(source, file_id).parse(&registry) {
            Ok(quest) => eprintln!(
                "ok: {} ({} sections, {} blocks)",
                path.display(),
                quest.sections.len(),
                quest.block_count
            ),
            Err(error) => {
                failed += 1;
                emit_error(color_choice, &files, &error);
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} file(s) failed", failed, args.files.len());
        process::exit(1);
    }
}

fn do_build(args: BuildArgs, color_choice: ColorChoice) {
    let config_path = args.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = match BuildConfig::load(&config_path, args.config.is_some()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    };
    if let Some(input) = args.input {
        config.input_dir = input;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if let Some(asset_base) = args.asset_base {
        config.asset_base = asset_base;
    }

    let report = match build::build(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    };

    if !report.failures.is_empty() {
        let mut files = SimpleFiles::new();
        for failure in &report.failures {
            let file_id = files.add(failure.path.display().to_string(), failure.source.clone());
            emit_error(color_choice, &files, &failure.error.clone().with_file_id(file_id));
        }
        eprintln!("{} quest file(s) failed; nothing written", report.failures.len());
        process::exit(1);
    }

    eprintln!(
        "wrote {} file(s) to {}",
        report.written.len(),
        config.output_dir.display()
    );
}
