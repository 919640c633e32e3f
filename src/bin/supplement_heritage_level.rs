//! Heritage-Level Supplement
//!
//! Enriches the Suzhou garden list with a protection-level column inferred
//! from the national heritage-site register: name match first, then
//! geographic proximity, then description keywords. Writes the input table
//! plus the new column as BOM-prefixed UTF-8 CSV and prints match statistics.
//!
//! Usage:
//!   cargo run --bin supplement_heritage_level

use std::path::Path;

use anyhow::Result;
use rustc_hash::FxHashMap;

use suzhou_garden_prep::dataset;
use suzhou_garden_prep::heritage::{self, MatchMethod};

const GARDEN_CSV: &str = "dataset/SuzhouGardenList.csv";
const HERITAGE_CSV: &str = "dataset/全国重点文物保护单位名单.csv";
const OUTPUT_CSV: &str = "dataset/SuzhouGardenList_补充文保级别.csv";

#[derive(Debug, Default)]
struct MatchTally {
    name: usize,
    location: usize,
    description: usize,
    unmatched: usize,
}

fn main() -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("HERITAGE-LEVEL SUPPLEMENT");
    println!("{}", "=".repeat(80));

    for path in [GARDEN_CSV, HERITAGE_CSV] {
        if !Path::new(path).exists() {
            anyhow::bail!("input file not found: {}", path);
        }
    }

    println!("\nLoading datasets...");
    let gardens = dataset::load_gardens(Path::new(GARDEN_CSV))?;
    let sites = dataset::load_sites(Path::new(HERITAGE_CSV))?;
    println!("  Gardens: {}", gardens.records.len());
    println!("  Heritage sites: {}", sites.len());

    println!("\nMatching...");
    let total = gardens.records.len();
    let mut tally = MatchTally::default();
    let mut levels: Vec<Option<&'static str>> = Vec::with_capacity(total);

    for (idx, record) in gardens.records.iter().enumerate() {
        println!("[{}/{}] {}", idx + 1, total, record.name);

        match heritage::resolve(record, &sites) {
            Some(resolution) => {
                let label = match resolution.method {
                    MatchMethod::Name => {
                        tally.name += 1;
                        "name match"
                    }
                    MatchMethod::Location => {
                        tally.location += 1;
                        "location match"
                    }
                    MatchMethod::Description => {
                        tally.description += 1;
                        "description match"
                    }
                };
                println!("  ✓ {}: {}", label, resolution.level);
                levels.push(Some(resolution.level));
            }
            None => {
                tally.unmatched += 1;
                println!("  ✗ no match");
                levels.push(None);
            }
        }
    }

    println!("\nWriting: {}", OUTPUT_CSV);
    dataset::write_with_levels(gardens.df, levels.clone(), Path::new(OUTPUT_CSV))?;

    println!("\n{}", "=".repeat(80));
    println!("MATCH STATISTICS");
    println!("{}", "=".repeat(80));
    println!("  Name matches:        {}", tally.name);
    println!("  Location matches:    {}", tally.location);
    println!("  Description matches: {}", tally.description);
    println!("  Unmatched:           {}", tally.unmatched);
    println!("  Total:               {}", total);

    let mut level_counts: FxHashMap<&str, usize> = FxHashMap::default();
    for level in levels.into_iter().flatten() {
        *level_counts.entry(level).or_insert(0) += 1;
    }
    let mut level_counts: Vec<(&str, usize)> = level_counts.into_iter().collect();
    level_counts.sort_by(|a, b| b.1.cmp(&a.1));

    println!("\nLevel breakdown:");
    for (level, count) in level_counts {
        println!("  {}: {}", level, count);
    }

    println!("\n✓ Done. Output saved to: {}\n", OUTPUT_CSV);
    Ok(())
}
