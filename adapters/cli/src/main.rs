#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs battles from map text files.

mod render;

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use skirmish_system_outcome::{run_combat, run_until_flawless};
use skirmish_world::Board;

/// Deterministic grid-combat simulator.
#[derive(Debug, Parser)]
#[command(name = "skirmish", version)]
struct Args {
    /// Path to the map text file.
    map: PathBuf,
    /// After the battle, search for the minimal elf attack power that wins
    /// without losing a single elf.
    #[arg(long)]
    sweep: bool,
    /// Print the final battlefield after the battle.
    #[arg(long)]
    show_final: bool,
    /// Emit the reports as JSON instead of prose.
    #[arg(long)]
    json: bool,
}

/// Entry point for the skirmish command-line interface.
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.map)
        .with_context(|| format!("reading map file {}", args.map.display()))?;
    let lines: Vec<&str> = text.lines().collect();
    log::debug!("loaded map {} ({} rows)", args.map.display(), lines.len());

    let mut board = Board::from_lines(&lines)
        .with_context(|| format!("building board from {}", args.map.display()))?;
    let report = run_combat(&mut board).context("running combat")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Combat ends after {} full rounds; {:?}s win with {} total hit points.",
            report.completed_rounds, report.winner, report.remaining_hit_points
        );
        println!("Score: {}", report.score());
    }
    if args.show_final {
        print!("{}", render::battlefield(&board));
    }

    if args.sweep {
        let flawless = run_until_flawless(|power| Board::from_lines_with_elf_power(&lines, power))
            .context("sweeping elf attack power")?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&flawless)?);
        } else {
            println!(
                "Flawless elf victory at attack power {}; score {}.",
                flawless.power.get(),
                flawless.report.score()
            );
        }
    }

    Ok(())
}
