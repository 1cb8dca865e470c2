use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use kata_common::{Difficulty, EditorConfig, ProblemPayload, telemetry};
use kata_editor_core::ProblemComposer;
use kata_renderer::{SummaryPreview, render_problem_html};
use miette::{IntoDiagnostic, Result};

mod config;

#[derive(Parser)]
#[command(version, about = "Kata - author coding practice problems", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a KDL config file (defaults to <config dir>/kata/config.kdl)
    #[arg(long, global = true, env = "KATA_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a new problem payload with one default statement
    New {
        /// Problem title
        #[arg(long, default_value = "")]
        title: String,

        /// easy, medium or hard
        #[arg(long, default_value = "easy")]
        difficulty: Difficulty,

        /// Tag, may be repeated
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a problem payload
    Check {
        /// Payload JSON file
        file: PathBuf,
    },
    /// Render a problem payload to HTML
    Preview {
        /// Payload JSON file
        file: PathBuf,

        /// Render every section instead of the summary card
        #[arg(long)]
        full: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    telemetry::init(if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    });

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::New {
            title,
            difficulty,
            tags,
            output,
        } => new_problem(config, &title, difficulty, &tags, output.as_deref()),
        Commands::Check { file } => check_problem(&file),
        Commands::Preview { file, full, output } => {
            preview_problem(&config, &file, full, output.as_deref())
        }
    }
}

fn new_problem(
    config: EditorConfig,
    title: &str,
    difficulty: Difficulty,
    tags: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let mut composer: ProblemComposer = ProblemComposer::new(config);
    composer.set_title(title);
    composer.set_difficulty(difficulty);
    for tag in tags {
        composer.add_tag(tag);
    }
    let payload = composer.publish();
    write_output(output, &payload.to_json()?)
}

fn read_payload(file: &Path) -> Result<ProblemPayload> {
    let json = std::fs::read_to_string(file)
        .into_diagnostic()
        .map_err(|err| err.wrap_err(format!("reading {}", file.display())))?;
    Ok(ProblemPayload::from_json(&json)?)
}

fn check_problem(file: &Path) -> Result<()> {
    let payload = read_payload(file)?;
    let title = if payload.title.trim().is_empty() {
        "(untitled)"
    } else {
        payload.title.as_str()
    };
    println!(
        "✓ {} - {}, {} sections",
        title,
        payload.difficulty,
        payload.sections.len()
    );
    Ok(())
}

fn preview_problem(
    config: &EditorConfig,
    file: &Path,
    full: bool,
    output: Option<&Path>,
) -> Result<()> {
    let payload = read_payload(file)?;
    let meta = payload.meta();
    let html = if full {
        render_problem_html(&meta, &payload.sections)
    } else {
        SummaryPreview::build(&meta, &payload.sections, config).to_html()
    };
    write_output(output, &html)
}

fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents).into_diagnostic()?;
            tracing::info!(path = %path.display(), bytes = contents.len(), "written");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn init_miette() {
    // A hook can only be installed once; a second install is harmless.
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    miette::set_panic_hook();
}
