use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use go_retag::config::{load_from_path, OptimizationPolicy, Preset, RetagConfig};
use go_retag::{
    DiagnosticLog, FileDriver, FileReport, FileStatus, NamespaceRegistry, PolicyEngine,
    RunSummary, WarnedNamespaces,
};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "go-retag")]
#[command(about = "Rewrite Go struct tags under an optimization policy", long_about = None)]
#[command(version)]
struct Cli {
    /// More console logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite tags in place
    Apply {
        #[command(flatten)]
        run: RunArgs,

        /// Dry run - report what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Copy each file to <file>.bak before its first rewrite
        #[arg(short, long)]
        backup: bool,
    },

    /// Report files whose tags would change; exits 1 if any would
    Check {
        #[command(flatten)]
        run: RunArgs,
    },

    /// List the built-in XML namespace prefixes
    Namespaces,
}

#[derive(Args)]
struct RunArgs {
    /// Files or directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// TOML config file with [policy], [run] and [formatter] tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Policy preset; replaces the config file's [policy] table
    #[arg(short, long, value_enum)]
    preset: Option<PresetArg>,

    /// Refuse to rewrite any file that produced an error
    #[arg(long)]
    strict: bool,

    /// Do not run the formatter after rewriting
    #[arg(long)]
    no_format: bool,

    /// Diagnostic log file (default: go-retag.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    None,
    Complete,
}

impl From<PresetArg> for Preset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::None => Preset::None,
            PresetArg::Complete => Preset::Complete,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            run,
            dry_run,
            backup,
        } => cmd_apply(run, dry_run, backup),

        Commands::Check { run } => cmd_check(run),

        Commands::Namespaces => cmd_namespaces(),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Helper: Build the effective config from file, preset and flags.
fn resolve_config(run: &RunArgs, backup: bool) -> Result<RetagConfig> {
    let mut config = match &run.config {
        Some(path) => load_from_path(path)?,
        None => RetagConfig::default(),
    };
    if let Some(preset) = run.preset {
        config.policy = OptimizationPolicy::from_preset(preset.into());
    }
    config.run.strict |= run.strict;
    config.run.backup |= backup;
    if run.no_format {
        config.formatter.enabled = false;
    }
    if let Some(log_file) = &run.log_file {
        config.run.log_file = log_file.clone();
    }
    config.validate()?;
    Ok(config)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    dry_run: bool,
    log_file: &'a Path,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

/// Helper: Run the driver over every path and print per-file results.
fn execute(run: &RunArgs, config: &RetagConfig, dry_run: bool) -> Result<RunSummary> {
    let registry = NamespaceRegistry::builtin();
    let engine = PolicyEngine::new(config.policy, &registry);
    let driver = FileDriver::from_config(engine, config, dry_run);

    let log_path = &config.run.log_file;
    let mut log = DiagnosticLog::create(log_path, config.run.tab_width)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;
    log.banner(&format!(
        "go-retag {}: {} path(s){}",
        env!("CARGO_PKG_VERSION"),
        run.paths.len(),
        if dry_run { " [dry run]" } else { "" }
    ));

    let mut warned = WarnedNamespaces::new();
    let quiet = run.json;
    let summary = driver.run(
        &run.paths,
        &config.run.extensions,
        &mut warned,
        &mut log,
        |report| {
            if !quiet {
                print_report(report, run.diff);
            }
        },
    );
    log.finish()
        .with_context(|| format!("failed to write log file {}", log_path.display()))?;

    if run.json {
        let report = JsonReport {
            dry_run,
            log_file: log_path,
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&summary, log_path);
    }
    Ok(summary)
}

fn print_report(report: &FileReport, show_diff: bool) {
    let file = report.path.display();
    match report.status {
        FileStatus::Unchanged => return,
        FileStatus::Rewritten => println!(
            "{} {}: {} line(s) rewritten",
            "✓".green(),
            file,
            report.changed_lines
        ),
        FileStatus::WouldRewrite => println!(
            "{} {}: {} line(s) would change",
            "~".cyan(),
            file,
            report.changed_lines
        ),
        FileStatus::Blocked => eprintln!(
            "{} {}: not rewritten, see log for errors",
            "✗".red(),
            file
        ),
        FileStatus::Skipped => println!("{} {}: skipped", "⊘".yellow(), file),
    }
    if show_diff {
        if let Some(change) = &report.change {
            display_diff(&report.path, &change.before, &change.after);
        }
    }
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (retagged)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for hunk in diff.unified_diff().context_radius(2).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{}", change).red(),
                ChangeTag::Insert => format!("+{}", change).green(),
                ChangeTag::Equal => format!(" {}", change).normal(),
            };
            print!("{}", line);
            if change.missing_newline() {
                println!();
            }
        }
    }
}

fn print_summary(summary: &RunSummary, log_path: &Path) {
    let counts = summary.diagnostics;
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files scanned", summary.scanned);
    println!("  {} rewritten", format!("{}", summary.rewritten).green());
    println!(
        "  {} would change",
        format!("{}", summary.would_rewrite).cyan()
    );
    println!("  {} blocked", format!("{}", summary.blocked).red());
    println!("  {} skipped", format!("{}", summary.skipped).yellow());
    println!("  {} failed", format!("{}", summary.failed).red());
    println!(
        "  diagnostics: {} info, {} warnings, {} errors (log: {})",
        counts.info,
        format!("{}", counts.warnings).yellow(),
        format!("{}", counts.errors).red(),
        log_path.display()
    );
}

fn cmd_apply(run: RunArgs, dry_run: bool, backup: bool) -> Result<()> {
    let config = resolve_config(&run, backup)?;
    if !dry_run && !config.policy.has_rewrites() && !run.json {
        println!(
            "{}",
            "Note: every policy switch is off; only origin comments will be restored".dimmed()
        );
    }

    let summary = execute(&run, &config, dry_run)?;
    if summary.diagnostics.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_check(run: RunArgs) -> Result<()> {
    let config = resolve_config(&run, false)?;
    let summary = execute(&run, &config, true)?;
    if summary.diagnostics.errors > 0 || summary.changed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_namespaces() -> Result<()> {
    let registry = NamespaceRegistry::builtin();
    println!("{}", "Known namespaces:".bold());
    for (short, long) in registry.entries() {
        println!("  {:<10} {}", short.green(), long);
    }
    println!();
    println!("{} namespace(s)", registry.len());
    Ok(())
}
