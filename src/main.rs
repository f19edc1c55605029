//! cuberec - cube card recommendations
//!
//! ## Usage
//!
//! ```text
//! cuberec build --corpus <corpus.json> --out <dir> [--sequential]
//! cuberec recommend --snapshot <dir> --cube <list.txt> [--amount N] [--row-stochastic]
//! cuberec cuts --snapshot <dir> --cube <list.txt> [--amount N] [--row-stochastic]
//! cuberec neighbors --snapshot <dir> --card <name> [--amount N] [--row-stochastic]
//! ```
//!
//! The corpus is a JSON array of card-name arrays. A cube list has one card
//! name per line. Results print as `name<TAB>score`, one per line.
//! Set `RUST_LOG=info` to see build and load progress.

use std::env;
use std::fs;
use std::path::PathBuf;

use cuberec::{
    BuildOptions, Collection, CooccurrenceRecommender, Normalization, RankedRecommendation,
    Snapshot, load_corpus, load_snapshot, normalize_card_name, parse_amount, save_snapshot,
};

const DEFAULT_AMOUNT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Build,
    Recommend,
    Cuts,
    Neighbors,
}

#[derive(Debug)]
struct Args {
    command: Command,
    corpus: Option<PathBuf>,
    out: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    cube: Option<PathBuf>,
    card: Option<String>,
    amount: usize,
    sequential: bool,
    normalization: Normalization,
}

fn usage() -> &'static str {
    "usage: cuberec <build|recommend|cuts|neighbors> [options]\n\
     \n\
     build      --corpus <corpus.json> --out <dir> [--sequential]\n\
     recommend  --snapshot <dir> --cube <list.txt> [--amount N] [--row-stochastic]\n\
     cuts       --snapshot <dir> --cube <list.txt> [--amount N] [--row-stochastic]\n\
     neighbors  --snapshot <dir> --card <name> [--amount N] [--row-stochastic]"
}

fn parse_args() -> Result<Args, String> {
    let mut iter = env::args().skip(1);
    let command = match iter.next().as_deref() {
        Some("build") => Command::Build,
        Some("recommend") => Command::Recommend,
        Some("cuts") => Command::Cuts,
        Some("neighbors") => Command::Neighbors,
        Some(other) => return Err(format!("unknown command '{other}'\n{}", usage())),
        None => return Err(usage().to_string()),
    };

    let mut args = Args {
        command,
        corpus: None,
        out: None,
        snapshot: None,
        cube: None,
        card: None,
        amount: DEFAULT_AMOUNT,
        sequential: false,
        normalization: Normalization::Conditional,
    };

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--corpus" => {
                args.corpus = Some(
                    iter.next()
                        .ok_or_else(|| "--corpus requires a path".to_string())?
                        .into(),
                );
            }
            "--out" => {
                args.out = Some(
                    iter.next()
                        .ok_or_else(|| "--out requires a path".to_string())?
                        .into(),
                );
            }
            "--snapshot" => {
                args.snapshot = Some(
                    iter.next()
                        .ok_or_else(|| "--snapshot requires a path".to_string())?
                        .into(),
                );
            }
            "--cube" => {
                args.cube = Some(
                    iter.next()
                        .ok_or_else(|| "--cube requires a path".to_string())?
                        .into(),
                );
            }
            "--card" => {
                args.card = Some(
                    iter.next()
                        .ok_or_else(|| "--card requires a card name".to_string())?,
                );
            }
            "--amount" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| "--amount requires a number".to_string())?;
                args.amount = parse_amount(&raw)
                    .map_err(|e| format!("invalid --amount value '{raw}': {e}"))?;
            }
            "--sequential" => {
                args.sequential = true;
            }
            "--row-stochastic" => {
                args.normalization = Normalization::RowStochastic;
            }
            _ => {
                return Err(format!("unknown argument '{arg}'\n{}", usage()));
            }
        }
    }

    Ok(args)
}

fn required<'a, T>(value: &'a Option<T>, flag: &str) -> Result<&'a T, String> {
    value
        .as_ref()
        .ok_or_else(|| format!("{flag} is required for this command"))
}

fn print_ranked(ranked: &RankedRecommendation) {
    if ranked.is_empty() {
        eprintln!("No results.");
        return;
    }
    for card in ranked {
        println!("{}\t{:.4}", card.key, card.score);
    }
}

fn build(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let corpus = load_corpus(required(&args.corpus, "--corpus")?)?;
    let out = required(&args.out, "--out")?;
    let options = BuildOptions {
        parallel: !args.sequential,
        ..BuildOptions::default()
    };
    let snapshot = Snapshot::build(&corpus, options);
    save_snapshot(&snapshot, out)?;
    let stats = snapshot.stats();
    println!(
        "Indexed {} cards and {} pairs from {} collections into {}",
        stats.cards,
        stats.pairs,
        stats.collections,
        out.display()
    );
    Ok(())
}

fn read_cube(args: &Args) -> Result<Collection, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(required(&args.cube, "--cube")?)?;
    Ok(Collection::parse_list(&text))
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.command == Command::Build {
        return build(args);
    }

    let snapshot = load_snapshot(required(&args.snapshot, "--snapshot")?, args.normalization)?;
    let engine = CooccurrenceRecommender::new(&snapshot);

    let ranked = if args.command == Command::Neighbors {
        let card = normalize_card_name(required(&args.card, "--card")?);
        if !snapshot.index().contains(&card) {
            eprintln!("Unknown card: {card}");
        }
        engine.neighbors(&card, args.amount)
    } else {
        let cube = read_cube(args)?;
        let known = snapshot.index().resolve(&cube).len();
        if known < cube.len() {
            eprintln!(
                "Skipping {} unknown cards (e.g. custom cards)",
                cube.len() - known
            );
        }
        if args.command == Command::Cuts {
            engine.suggest_cuts(&cube, args.amount)
        } else {
            engine.recommend(&cube, args.amount)
        }
    };

    print_ranked(&ranked);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
