//! Image Normalizer
//!
//! Renames every garden folder's images to `01.jpg`, `02.jpg`, … and
//! converts PNGs to white-backed JPEGs. Defaults to asking for confirmation;
//! use `--dry-run` to preview the plan without touching any file.
//!
//! Usage:
//!   cargo run --bin normalize_images -- --dry-run
//!   cargo run --bin normalize_images -- --backup --quality 95

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Parser;

use suzhou_garden_prep::images::{NormalizeOptions, Normalizer};

#[derive(Parser, Debug)]
#[command(about = "Normalize garden image folders to canonical NN.jpg naming")]
struct Args {
    /// Preview the operations without modifying any file
    #[arg(long)]
    dry_run: bool,

    /// Back up each folder before processing it
    #[arg(long)]
    backup: bool,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Image directory
    #[arg(long, default_value = "public/dataset/images")]
    dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.dry_run && !confirm(args.backup)? {
        println!("aborted.");
        return Ok(());
    }

    let opts = NormalizeOptions {
        dry_run: args.dry_run,
        backup: args.backup,
        quality: args.quality,
    };
    let mut normalizer = Normalizer::new(args.dir, opts);

    let reports = normalizer.run()?;
    normalizer.print_summary();

    let report_path = PathBuf::from("logs").join(format!(
        "image_normalization_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    normalizer.write_report(&reports, &report_path)?;
    println!("\n✓ Report saved to: {}\n", report_path.display());

    Ok(())
}

/// Ask for a y/N confirmation before a live run.
fn confirm(backup: bool) -> Result<bool> {
    println!("\nwarning: this will modify image files in place.");
    if backup {
        println!("backup is enabled; originals will be copied first.");
    } else {
        println!("backup is disabled; consider --dry-run first.");
    }
    print!("\ncontinue? (y/N): ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
