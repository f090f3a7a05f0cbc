use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use solgrep_engine::{
    builtin, builtin_descriptions, EngineConfig, EngineError, Finding, GenericGrep, Observer,
    Rule, SolGrep, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "solgrep")]
#[command(about = "Semantic grep for Solidity source trees")]
#[command(version = VERSION)]
struct Cli {
    /// Directories or files to analyze
    targets: Vec<PathBuf>,

    /// Built-in rule to run (repeatable); defaults apply when omitted
    #[arg(short = 'r', long = "rule")]
    rules: Vec<String>,

    /// Match pattern to grep for (repeatable); implies the pattern rule
    #[arg(short = 'f', long = "find")]
    find: Vec<String>,

    /// Write the findings map as JSON to this file
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// List available built-in rules and exit
    #[arg(short = 'l', long = "list-rules")]
    list_rules: bool,

    /// Process files one at a time instead of on the worker pool
    #[arg(long)]
    sequential: bool,
}

/// Progress lines and error reporting for interactive runs.
struct ConsoleObserver {
    files_done: AtomicUsize,
}

impl ConsoleObserver {
    fn new() -> Self {
        Self {
            files_done: AtomicUsize::new(0),
        }
    }
}

impl Observer for ConsoleObserver {
    fn on_analyze_dir(&self, target: &Path, num_files: usize) {
        println!(
            "📁 {} ({} files)",
            target.display().to_string().bright_blue().bold(),
            num_files
        );
    }

    fn on_file_ok(&self, _file: &Path) {
        self.files_done.fetch_add(1, Ordering::Relaxed);
    }

    fn on_file_error(&self, file: &Path, error: &EngineError) {
        eprintln!(
            "   {} {}: {}",
            "✖".red(),
            file.display().to_string().dimmed(),
            error
        );
    }

    fn on_report(&self, key: &str, finding: &Finding) {
        println!(
            "   {} [{}] {} ({})",
            "→".green(),
            finding.rule.yellow(),
            finding.tag,
            key.dimmed()
        );
    }

    fn on_dir_analyzed(&self, target: &Path) {
        println!(
            "   {} finished {}",
            "✓".green(),
            target.display().to_string().dimmed()
        );
    }
}

fn build_rules(cli: &Cli) -> Result<Vec<Box<dyn Rule>>> {
    let mut rules: Vec<Box<dyn Rule>> = Vec::new();
    for name in &cli.rules {
        match builtin(name) {
            Some(rule) => rules.push(rule),
            None => {
                let known: Vec<&str> = builtin_descriptions().iter().map(|(n, _)| *n).collect();
                bail!("unknown rule `{name}`; available: {}", known.join(", "));
            }
        }
    }
    if !cli.find.is_empty() {
        rules.push(Box::new(GenericGrep::new(&cli.find)?));
    }
    Ok(rules)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    println!("{}", format!("🧠 solgrep v{VERSION}").bright_blue().bold());

    if cli.list_rules {
        println!("\nAvailable rules:");
        for (name, description) in builtin_descriptions() {
            println!("   {} - {}", name.yellow().bold(), description);
        }
        return Ok(());
    }

    if cli.targets.is_empty() {
        bail!("no targets given; pass one or more directories or .sol files");
    }

    let rules = build_rules(&cli)?;
    let engine = SolGrep::new(rules)
        .with_observer(Box::new(ConsoleObserver::new()))
        .with_config(EngineConfig {
            parallel: !cli.sequential,
        });

    for target in &cli.targets {
        engine
            .analyze(target)
            .with_context(|| format!("failed to analyze {}", target.display()))?;
    }
    engine.close();

    println!();
    println!(
        "{}",
        format!(
            "⚡ {} findings across {} files ({} errors)",
            engine.total_findings(),
            engine.total_files(),
            engine.error_count()
        )
        .bold()
    );
    for (file, message) in engine.errors() {
        eprintln!("   {} {}: {}", "✖".red(), file.display(), message);
    }

    if let Some(path) = &cli.output {
        let json = engine.findings_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("💾 findings written to {}", path.display());
    }

    Ok(())
}
