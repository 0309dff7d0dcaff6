use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use ruleval_core::{
    build_receipt, export_mismatch_tables, render_confusion, render_markdown_for_receipt,
    ReceiptContext,
};
use ruleval_domain::{compile_rules, EvalOptions, Evaluator, TextCleaner};
use ruleval_types::{
    ConfigFile, Document, EvalReceipt, RunMeta, ToolMeta, DEFAULT_CONTEXT_WINDOW,
};

mod config_loader;

use config_loader::load_config_with_includes;

#[derive(Parser)]
#[command(name = "ruleval")]
#[command(about = "Confusion-tally evaluation for regex rule classifiers", long_about = None)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every rule against a labeled document corpus.
    Eval(Box<EvalArgs>),

    /// Print the effective rules (config + includes merged).
    Rules(RulesArgs),

    /// Validate the configuration file (check regex patterns).
    Validate(ValidateArgs),

    /// Initialize a new ruleval.toml configuration file.
    Init(InitArgs),

    /// Export mismatch tables from a JSON receipt (render-only mode).
    Csv(CsvArgs),

    /// Print the confusion matrix for one rule from a JSON receipt.
    Confusion(ConfusionArgs),
}

#[derive(Parser, Debug)]
struct EvalArgs {
    /// Path to a config file. If omitted, uses ./ruleval.toml if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Labeled corpus: one JSON document per line
    /// ({"id": .., "text": .., "label": ..}), or '-' for stdin.
    #[arg(long, value_name = "PATH")]
    docs: PathBuf,

    /// Match case-sensitively (default: document text is lowercased first).
    #[arg(long)]
    case_sensitive: bool,

    /// Context window (bytes per side) around a matched span.
    #[arg(long)]
    window: Option<usize>,

    /// Collapse whitespace and line breaks in document text before matching.
    #[arg(long)]
    clean: bool,

    /// Where to write the JSON receipt.
    #[arg(long, default_value = "artifacts/ruleval/report.json")]
    out: PathBuf,

    /// Write a Markdown summary.
    ///
    /// If provided with no value, defaults to artifacts/ruleval/summary.md
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = "artifacts/ruleval/summary.md"
    )]
    md: Option<PathBuf>,

    /// Write per-rule overmatch/undermatch CSV tables.
    ///
    /// If provided with no value, defaults to artifacts/ruleval/export
    #[arg(
        long,
        value_name = "DIR",
        num_args = 0..=1,
        default_missing_value = "artifacts/ruleval/export"
    )]
    export_dir: Option<PathBuf>,

    /// Exit with code 2 when any overmatch or undermatch was recorded.
    #[arg(long)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct RulesArgs {
    /// Path to a config file. If omitted, uses ./ruleval.toml if present.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RulesFormat::Toml)]
    format: RulesFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RulesFormat {
    Toml,
    Json,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Path to a config file. If omitted, uses ./ruleval.toml if present.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Where to write the config file.
    #[arg(long, default_value = "ruleval.toml")]
    path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

#[derive(Parser, Debug)]
struct CsvArgs {
    /// Path to a JSON receipt produced by `ruleval eval`.
    #[arg(long)]
    receipt: PathBuf,

    /// Directory to write the per-rule tables into.
    #[arg(long, value_name = "DIR", default_value = "artifacts/ruleval/export")]
    export_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct ConfusionArgs {
    /// Path to a JSON receipt produced by `ruleval eval`.
    #[arg(long)]
    receipt: PathBuf,

    /// Rule name to render.
    #[arg(long)]
    rule: String,
}

fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize logging based on flags
    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Eval(args) => cmd_eval(*args),
        Commands::Rules(args) => {
            cmd_rules(args)?;
            Ok(0)
        }
        Commands::Validate(args) => cmd_validate(args),
        Commands::Init(args) => {
            cmd_init(args)?;
            Ok(0)
        }
        Commands::Csv(args) => {
            cmd_csv(args)?;
            Ok(0)
        }
        Commands::Confusion(args) => {
            cmd_confusion(args)?;
            Ok(0)
        }
    }
}

/// Initialize tracing/logging based on CLI flags.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn cmd_eval(args: EvalArgs) -> Result<i32> {
    let started_at = Utc::now();
    let timer = Instant::now();

    let config = load_config(args.config.as_deref())?;
    let rules = compile_rules(&config.rule)?;

    let case_insensitive = if args.case_sensitive {
        false
    } else {
        config.defaults.case_insensitive.unwrap_or(true)
    };
    let window = args
        .window
        .or(config.defaults.window)
        .unwrap_or(DEFAULT_CONTEXT_WINDOW);

    let mut evaluator = Evaluator::new(
        rules,
        EvalOptions {
            case_insensitive,
            window,
        },
    );

    let docs = load_documents(&args.docs)?;
    info!(
        "Evaluating {} document(s) against {} rule(s)",
        docs.len(),
        evaluator.rules().len()
    );

    let cleaner = args.clean.then(TextCleaner::new);
    for doc in &docs {
        match &cleaner {
            Some(cleaner) => {
                let cleaned = Document {
                    id: doc.id.clone(),
                    text: cleaner.clean(&doc.text),
                    label: doc.label.clone(),
                };
                evaluator.evaluate_document(&cleaned)?;
            }
            None => evaluator.evaluate_document(doc)?,
        }
    }

    let receipt = build_receipt(
        &evaluator,
        ReceiptContext {
            tool: ToolMeta {
                name: "ruleval".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            run: RunMeta {
                started_at: started_at.to_rfc3339(),
                ended_at: Utc::now().to_rfc3339(),
                duration_ms: timer.elapsed().as_millis().min(u64::MAX as u128) as u64,
            },
            documents_evaluated: docs.len().min(u32::MAX as usize) as u32,
        },
    );

    write_receipt(&receipt, &args.out)?;
    debug!("Receipt written to '{}'", args.out.display());

    if let Some(md_path) = &args.md {
        write_text(md_path, &render_markdown_for_receipt(&receipt))?;
    }

    if let Some(dir) = &args.export_dir {
        let written = export_mismatch_tables(&receipt, dir)?;
        info!("Exported {} mismatch table(s) to '{}'", written.len(), dir.display());
    }

    print!("{}", render_markdown_for_receipt(&receipt));

    let has_mismatches = receipt
        .rules
        .iter()
        .any(|r| r.counts.overmatched > 0 || r.counts.undermatched > 0);
    Ok(if args.strict && has_mismatches { 2 } else { 0 })
}

fn cmd_rules(args: RulesArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;

    match args.format {
        RulesFormat::Toml => {
            let s = toml::to_string_pretty(&cfg).context("render toml")?;
            print!("{s}");
        }
        RulesFormat::Json => {
            let s = serde_json::to_string_pretty(&cfg).context("render json")?;
            println!("{s}");
        }
    }

    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> Result<i32> {
    info!("Validating configuration file");
    let cfg = load_config(args.config.as_deref())?;

    match compile_rules(&cfg.rule) {
        Ok(rules) => {
            println!("ok: {} rule(s) compile", rules.len());
            Ok(0)
        }
        Err(err) => {
            eprintln!("invalid: {err}");
            Ok(1)
        }
    }
}

fn cmd_init(args: InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "'{}' already exists; pass --force to overwrite",
            args.path.display()
        );
    }

    let text = toml::to_string_pretty(&ConfigFile::example()).context("render example config")?;
    write_text(&args.path, &text)?;

    println!("Wrote {}", args.path.display());
    println!("Next steps:");
    println!("  1. Replace the example rules with your own patterns");
    println!("  2. ruleval eval --docs corpus.jsonl");
    Ok(())
}

fn cmd_csv(args: CsvArgs) -> Result<()> {
    let receipt = read_receipt(&args.receipt)?;
    let written = export_mismatch_tables(&receipt, &args.export_dir)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_confusion(args: ConfusionArgs) -> Result<()> {
    let receipt = read_receipt(&args.receipt)?;

    let Some(report) = receipt.rules.iter().find(|r| r.rule == args.rule) else {
        let known: Vec<&str> = receipt.rules.iter().map(|r| r.rule.as_str()).collect();
        bail!(
            "rule '{}' not present in receipt (known rules: {})",
            args.rule,
            known.join(", ")
        );
    };

    print!("{}", render_confusion(&report.rule, &report.counts));
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<ConfigFile> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from("ruleval.toml");
            if p.exists() {
                p
            } else {
                bail!("No configuration file found. Specify --config or create ruleval.toml");
            }
        }
    };

    load_config_with_includes(&path)
}

/// Reads a JSONL corpus: one document per non-empty line.
fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read documents from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("read documents '{}'", path.display()))?
    };

    let mut docs = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(line).with_context(|| {
            format!("parse document at line {} of '{}'", lineno + 1, path.display())
        })?;
        docs.push(doc);
    }

    if docs.is_empty() {
        bail!("no documents found in '{}'", path.display());
    }

    Ok(docs)
}

fn read_receipt(path: &Path) -> Result<EvalReceipt> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read receipt '{}'", path.display()))?;
    let receipt: EvalReceipt =
        serde_json::from_str(&text).with_context(|| format!("parse receipt '{}'", path.display()))?;
    Ok(receipt)
}

fn write_receipt(receipt: &EvalReceipt, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(receipt).context("render receipt json")?;
    write_text(path, &json)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory '{}'", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))
}
