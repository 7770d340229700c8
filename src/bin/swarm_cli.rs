//! CLI client for the `swarmd` control socket.
//!
//! Examples:
//!   swarm-cli status
//!   swarm-cli pause
//!   swarm-cli next
//!   swarm-cli multi
//!   swarm-cli save
//!   swarm-cli load
//!   swarm-cli quit
//!
//! The daemon only listens when started with `--listen`; this client talks to
//! 127.0.0.1:9877 by default, override with `--addr host:port`.

use lifeswarm::command::{Command, Response, StatusReport};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::process;
use std::time::Duration;

fn usage() -> ! {
    eprintln!("swarm-cli (talks to swarmd @ 127.0.0.1:9877 by default)");
    eprintln!("Usage: swarm-cli [--addr host:port] <command>\n");
    eprintln!("Commands:");
    eprintln!("  status                      Show paging, pause state and totals");
    eprintln!("  next | prev                 Page the single view");
    eprintln!("  multi | single              Enter / leave the board grid");
    eprintln!("  multi-next | multi-prev     Page the board grid");
    eprintln!("  pause                       Toggle pause");
    eprintln!("  save | load                 Save or restore every game");
    eprintln!("  quit                        Stop the daemon");
    process::exit(1);
}

fn parse_args() -> (String, Command) {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let mut addr = "127.0.0.1:9877".to_string();
    if args.len() >= 2 && args[0] == "--addr" {
        addr = args[1].clone();
        args.drain(0..2);
    }

    let Some(name) = args.first() else { usage() };
    match Command::from_name(name) {
        Some(cmd) => (addr, cmd),
        None => {
            eprintln!("Unknown command: {name}");
            usage()
        }
    }
}

fn send_command(addr: &str, cmd: &Command) -> Result<Response, String> {
    let mut stream = TcpStream::connect(addr).map_err(|e| format!("connect: {e}"))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .map_err(|e| format!("set_read_timeout: {e}"))?;
    let mut reader = BufReader::new(stream.try_clone().map_err(|e| format!("clone: {e}"))?);

    let line = serde_json::to_string(cmd).map_err(|e| format!("serialize: {e}"))?;
    stream
        .write_all(line.as_bytes())
        .and_then(|_| stream.write_all(b"\n"))
        .map_err(|e| format!("send: {e}"))?;

    let mut resp_line = String::new();
    reader
        .read_line(&mut resp_line)
        .map_err(|e| format!("recv: {e}"))?;
    serde_json::from_str(&resp_line).map_err(|e| format!("parse response: {e}"))
}

fn print_status(s: StatusReport) {
    println!(
        "paused={} mode={:?} page={}/{} games={}",
        s.paused,
        s.mode,
        s.page + 1,
        s.page_count,
        s.instances,
    );
    println!(
        "iterations={} living_cells={} active_games={}",
        s.stats.iterations, s.stats.total_living_cells, s.stats.active_count,
    );
}

fn main() {
    let (addr, cmd) = parse_args();

    match send_command(&addr, &cmd) {
        Ok(Response::State(s)) => print_status(s),
        Ok(Response::Success { message }) => println!("{message}"),
        Ok(Response::Error { message }) => {
            eprintln!("Error: {message}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed: {e}");
            process::exit(1);
        }
    }
}
