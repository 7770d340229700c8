use lifeswarm::prelude::*;
use std::time::Instant;

struct BatchArgs {
    games: usize,
    ticks: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    every: u64,
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h" || a == "help") {
        print_help();
        return;
    }

    let batch = match parse_args(&args) {
        Ok(b) => b,
        Err(msg) => {
            eprintln!("{msg}");
            print_help();
            std::process::exit(2);
        }
    };

    let mut rng = match batch.seed {
        Some(seed) => Prng::new(seed),
        None => Prng::from_clock(),
    };
    let mut swarm = Swarm::random(batch.games, &mut rng);
    if let Some(threads) = batch.threads {
        swarm.set_max_parallelism(threads);
    }

    let start = Instant::now();
    for _ in 0..batch.ticks {
        let report = swarm.tick();
        for f in &report.faults {
            eprintln!("instance {} skipped: {}", f.id, f.fault);
        }
        if report.stats.iterations % batch.every == 0 {
            println!(
                "t={:5}  living={:7}  active={:5}/{}  elapsed={:.2?}",
                report.stats.iterations,
                report.stats.total_living_cells,
                report.stats.active_count,
                swarm.len(),
                start.elapsed()
            );
        }
    }
}

fn parse_args(args: &[String]) -> Result<BatchArgs, String> {
    let mut batch = BatchArgs {
        games: 1000,
        ticks: 100,
        seed: None,
        threads: None,
        every: 10,
    };

    let mut it = args.iter();
    while let Some(flag) = it.next() {
        let mut value = || {
            it.next()
                .ok_or_else(|| format!("missing value for {flag}"))
                .and_then(|v| v.parse::<u64>().map_err(|e| format!("bad value for {flag}: {e}")))
        };
        match flag.as_str() {
            "--games" => batch.games = value()? as usize,
            "--ticks" => batch.ticks = value()?,
            "--seed" => batch.seed = Some(value()?),
            "--threads" => batch.threads = Some(value()? as usize),
            "--every" => batch.every = value()?.max(1),
            other => return Err(format!("Unknown argument: {other}")),
        }
    }
    Ok(batch)
}

fn print_help() {
    println!("lifeswarm (headless batch run of many Game of Life boards)");
    println!("usage:");
    println!("  lifeswarm [--games N] [--ticks T] [--seed S] [--threads N] [--every K]");
    println!("  lifeswarm --help");
    println!();
    println!("For the interactive view, run the swarmd daemon.");
}
