use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use cuberec::{CardId, CooccurrenceRecommender, Normalization, SnapshotStats, load_snapshot};
use serde::Serialize;

#[derive(Debug)]
struct Args {
    snapshot: PathBuf,
    top: usize,
}

#[derive(Debug, Serialize)]
struct CardRow {
    name: String,
    appearances: u32,
    neighbors: usize,
    strongest_neighbor: Option<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    stats: SnapshotStats,
    most_played: Vec<CardRow>,
}

fn parse_args() -> Result<Args, String> {
    let mut snapshot = None;
    let mut top = 20usize;

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--snapshot" => {
                snapshot = Some(PathBuf::from(
                    iter.next()
                        .ok_or_else(|| "--snapshot requires a path".to_string())?,
                ));
            }
            "--top" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| "--top requires a number".to_string())?;
                top = raw
                    .parse::<usize>()
                    .map_err(|e| format!("invalid --top value '{raw}': {e}"))?;
            }
            _ => {
                return Err(format!(
                    "unknown argument '{arg}'. supported: --snapshot <dir> --top <n>"
                ));
            }
        }
    }

    Ok(Args {
        snapshot: snapshot.ok_or_else(|| "--snapshot is required".to_string())?,
        top,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = parse_args().map_err(io::Error::other)?;

    let snapshot = load_snapshot(&args.snapshot, Normalization::Conditional)?;
    let engine = CooccurrenceRecommender::new(&snapshot);
    let matrix = snapshot.matrix();

    let mut by_appearances: Vec<(CardId, &str, u32)> = snapshot
        .index()
        .iter()
        .map(|(id, key)| (id, key, matrix.total_count(id)))
        .collect();
    by_appearances.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(b.1)));
    by_appearances.truncate(args.top);

    let most_played = by_appearances
        .into_iter()
        .map(|(id, key, appearances)| CardRow {
            name: key.to_string(),
            appearances,
            neighbors: matrix.row(id).count(),
            strongest_neighbor: engine.neighbors(key, 1).into_vec().pop().map(|card| card.key),
        })
        .collect();

    let report = Report {
        stats: snapshot.stats(),
        most_played,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    Ok(())
}
