#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads a dungeon level and replays its script.

mod level;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    level::Level,
    session::{Session, Summary},
};

/// Command-line arguments accepted by the dungeon keeper adapter.
#[derive(Debug, Parser)]
#[command(name = "dungeon-keeper", about = "Replays a scripted dungeon level")]
struct CliArgs {
    /// Level manifest to load.
    #[arg(long, value_name = "PATH", default_value_os_t = Level::default_path())]
    level: PathBuf,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, value_name = "FILTER", default_value = "info")]
    log_level: String,
    /// Prints the summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Entry point for the dungeon keeper command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_level);

    let level = Level::load(&args.level)?;
    let mut session = Session::start(&level)?;
    session.run(&level.script)?;
    let summary = session.summary(&level.name);

    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to encode summary as json")?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &Summary) {
    println!("{}", summary.banner);
    println!(
        "{} ({}x{}): {} commands, {} tile changes, {} rooms claimed",
        summary.level,
        summary.columns,
        summary.rows,
        summary.commands,
        summary.tiles_changed,
        summary.rooms_claimed
    );

    if !summary.room_types.is_empty() {
        println!("room types: {}", summary.room_types.join(", "));
    }
    for player in &summary.players {
        println!("player {}: {} gold", player.player, player.gold);
    }
    if summary.loose_gold > 0 {
        println!("loose gold: {}", summary.loose_gold);
    }

    for room in &summary.rooms {
        let gold = match (room.stored_gold, room.capacity) {
            (Some(stored), Some(capacity)) => format!(", {stored}/{capacity} gold"),
            _ => String::new(),
        };
        println!(
            "room #{} {} of player {}: {} tiles{gold}",
            room.instance, room.room, room.owner, room.tiles
        );
    }

    for path in &summary.paths {
        match path.steps {
            Some(steps) => println!(
                "path ({}, {}) -> ({}, {}): {steps} steps",
                path.from.x(),
                path.from.y(),
                path.to.x(),
                path.to.y()
            ),
            None => println!(
                "path ({}, {}) -> ({}, {}): unreachable",
                path.from.x(),
                path.from.y(),
                path.to.x(),
                path.to.y()
            ),
        }
    }
}
