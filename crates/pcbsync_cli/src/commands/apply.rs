//! `pcbsync apply` command.
//!
//! # Responsibility
//! - Load the shadow model, the config and the diff files named on the command line.
//! - Apply the merged diff to an in-memory mirror of the board.
//! - Print the report to stderr and emit the updated shadow model.
//!
//! # Invariants
//! - Diff files are merged in command-line order before anything is applied.
//! - The shadow model is written even when the report carries issues.

use clap::Args;
use log::info;
use pcbsync_core::{
    init_logging, ApplierConfig, ApplyReport, Diff, DiffApplier, LogTarget, MemoryBoard,
    ShadowModel,
};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Shadow model JSON file
    #[arg(long)]
    pub shadow: PathBuf,

    /// Diff JSON files, merged in the given order
    #[arg(long = "diff", required = true, num_args = 1..)]
    pub diffs: Vec<PathBuf>,

    /// Optional TOML file with layer and stroke settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the updated shadow model here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Enable file logging into this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[arg(long, default_value_t = pcbsync_core::default_log_level().to_string())]
    pub log_level: String,

    /// Fail when the report contains errors other than known gaps
    #[arg(long)]
    pub strict: bool,
}

pub fn execute(args: ApplyArgs) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = &args.log_dir {
        let dir = if dir.is_absolute() {
            dir.clone()
        } else {
            std::env::current_dir()?.join(dir)
        };
        init_logging(&args.log_level, dir, LogTarget::FileOnly)?;
    }

    let config = match &args.config {
        Some(path) => ApplierConfig::load(path)?,
        None => ApplierConfig::default(),
    };

    let mut shadow: ShadowModel = read_json(&args.shadow)?;
    shadow.validate()?;

    let mut diff = Diff::default();
    for path in &args.diffs {
        let next: Diff = read_json(path)?;
        diff.merge(next);
    }

    let mut board = MemoryBoard::from_shadow(&shadow, &config);
    let report = DiffApplier::with_config(&mut board, config).apply(&mut shadow, &diff);
    print_report(&report);

    let rendered = serde_json::to_string_pretty(&shadow)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered + "\n")
                .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
            info!(
                "event=shadow_write module=cli status=ok path={}",
                path.display()
            );
        }
        None => println!("{}", rendered),
    }

    let failures = report.errors().count();
    if args.strict && failures > 0 {
        return Err(format!("{} entries could not be applied", failures).into());
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse {}: {}", path.display(), e))?;
    Ok(value)
}

fn print_report(report: &ApplyReport) {
    eprintln!(
        "added={} updated={} errors={} gaps={}",
        report.added.len(),
        report.updated.len(),
        report.errors().count(),
        report.gaps().count()
    );
    for issue in &report.issues {
        let kind = if issue.error.is_gap() { "gap" } else { "error" };
        eprintln!("  [{}] {}: {}", kind, issue.category, issue.error);
    }
}
