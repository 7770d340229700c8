//! Lifeswarm Daemon - many Game of Life boards on a fixed cadence
//!
//! This daemon runs until told to quit, managing:
//! - The swarm and its tick loop
//! - The paged terminal view (single list or board grid)
//! - Saving and restoring every game at once
//! - An optional control socket for `swarm-cli`
//!
//! Storage locations:
//! - Linux: ~/.local/share/lifeswarm/
//! - Windows: %APPDATA%\lifeswarm\
//! - MacOS: ~/Library/Application Support/lifeswarm/

use std::sync::Arc;

use lifeswarm::command::Command;
use lifeswarm::observer::PageRenderer;
use lifeswarm::prng::Prng;
use lifeswarm::swarm::Swarm;
use lifeswarm::view::ViewState;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod config;
mod control;
mod display;
mod error;
mod gate;
mod input;
mod orchestrator;
mod paths;
mod persist;
mod router;

use display::{LogRenderer, TerminalRenderer, ViewHandle};
use gate::PauseGate;
use orchestrator::{Orchestrator, SwarmHandles};
use persist::FileStore;
use router::{CommandRouter, Envelope};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout belongs to the terminal view.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let (config, paths) = config::resolve(&args)?;
    info!("Data directory: {:?}", paths.data_dir());
    info!("Saves directory: {:?}", paths.saves_dir());
    info!(?config, "configuration");

    let mut rng = match config.seed {
        Some(seed) => Prng::new(seed),
        None => Prng::from_clock(),
    };
    let mut swarm = Swarm::random(config.total_games, &mut rng);
    if let Some(threads) = config.max_parallelism {
        swarm.set_max_parallelism(threads);
    }
    let swarm = Arc::new(swarm);
    info!(
        games = swarm.len(),
        threads = swarm.max_parallelism(),
        "swarm created"
    );

    let renderer: Arc<dyn PageRenderer> = if config.headless {
        Arc::new(LogRenderer)
    } else {
        Arc::new(TerminalRenderer)
    };
    let cancel = CancellationToken::new();
    let handles = SwarmHandles {
        view: ViewHandle::new(ViewState::new(
            swarm.len(),
            config.page_size,
            config.multi_page_size,
        )),
        swarm,
        gate: PauseGate::new(config.start_paused),
        renderer,
        cancel: cancel.clone(),
    };

    let (tx, rx) = mpsc::channel::<Envelope>(32);

    // Start the tick loop
    let tick_task = Orchestrator::new(handles.clone(), config.tick_interval()).spawn();

    // Start the control socket
    if let Some(addr) = &config.listen {
        let listener = TcpListener::bind(addr).await?;
        info!("Lifeswarm daemon listening on {}", listener.local_addr()?);
        tokio::spawn(control::serve(listener, tx.clone(), cancel.clone()));
    }

    // Keyboard; with no socket, closing stdin is the only way to say goodbye.
    input::spawn_stdin_reader(handles.view.clone(), tx.clone(), config.listen.is_none());

    // Quit cleanly on Ctrl-C
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = tx.send(Envelope::fire(Command::Quit)).await;
        }
    });

    let store = Arc::new(FileStore::new(paths, config.save_format()));
    let mut router = CommandRouter::new(
        handles,
        store,
        config.multi_display_interval(),
        config.poll_interval(),
    );
    router.attach_tick_task(tick_task);
    router.run(rx).await;

    info!("Lifeswarm daemon stopped");
    Ok(())
}

fn print_help() {
    println!("swarmd (interactive swarm of Game of Life boards)");
    println!("usage:");
    println!("  swarmd [--games N] [--page-size N] [--multi-page-size N]");
    println!("         [--tick-ms N] [--multi-ms N] [--poll-ms N] [--seed S] [--threads N]");
    println!("         [--listen ADDR] [--compress] [--paused] [--headless] [--data-dir PATH]");
    println!();
    println!("keys (type, then Enter):");
    println!("  single view: n next, p prev, m grid, space pause, s save, l load, q quit");
    println!("  grid view:   n next, p prev, q back, space pause, s save, l load");
    println!("  quit exits from either view");
}
