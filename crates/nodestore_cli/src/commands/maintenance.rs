//! Index rebuild and verification commands.

use super::{explain, Context};
use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Drop all indexes and re-derive them from node records.
pub fn rebuild(ctx: &Context) -> Result<()> {
    let start = Instant::now();
    let _lock = ctx.lock()?;
    let store = ctx.open()?;

    let pb = spinner("Rebuilding indexes...");
    let result = store.rebuild_indexes();
    pb.finish_and_clear();
    let report = result.map_err(explain)?;

    println!(
        "Indexes rebuilt in {:.2}s: {} node(s) in {} workspace(s), {} reference(s)",
        start.elapsed().as_secs_f64(),
        style(report.nodes_indexed).cyan(),
        style(report.workspaces).cyan(),
        style(report.references_indexed).cyan()
    );
    if !report.corrupt_records.is_empty() {
        println!(
            "{} Skipped {} corrupt record(s):",
            style("⚠").yellow(),
            report.corrupt_records.len()
        );
        for path in &report.corrupt_records {
            println!("    {} {}", style("×").red(), path);
        }
    }
    Ok(())
}

/// Check the indexes against node records without changing anything.
pub fn verify(ctx: &Context) -> Result<()> {
    let store = ctx.open()?;

    let pb = spinner("Verifying indexes...");
    let result = store.verify();
    pb.finish_and_clear();
    let report = result.map_err(explain)?;

    println!("{}", style("Verification Report:").bold());
    println!("  Nodes checked:      {}", style(report.nodes_checked).cyan());
    println!("  Entries checked:    {}", style(report.entries_checked).cyan());

    for (label, items) in [
        ("Corrupt records", &report.corrupt_records),
        ("Missing entries", &report.missing_entries),
        ("Dangling entries", &report.dangling_entries),
    ] {
        if items.is_empty() {
            continue;
        }
        println!("  {}: {}", label, style(items.len()).red());
        for item in items {
            println!("    {} {}", style("×").red(), item);
        }
    }

    println!();
    if report.has_issues() {
        println!("{}", style(report.summary()).yellow().bold());
        println!("Run 'nodestore rebuild' to regenerate the indexes.");
        std::process::exit(1);
    }

    println!("{} {}", style("✓").green(), style(report.summary()).green());
    Ok(())
}
