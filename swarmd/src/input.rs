//! Keyboard input, one line per key.
//!
//! Stdin is read on a plain thread: a blocking read must not hold up runtime
//! shutdown once Quit has been handled.

use std::io::BufRead;
use std::thread;

use lifeswarm::command::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::display::ViewHandle;
use crate::router::Envelope;

pub fn spawn_stdin_reader(
    view: ViewHandle,
    commands: mpsc::Sender<Envelope>,
    quit_on_eof: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || pump_keys(std::io::stdin().lock(), &view, &commands, quit_on_eof))
}

/// Translate lines into commands for the current view until Quit, EOF, or
/// the router goes away.
pub fn pump_keys<R: BufRead>(
    reader: R,
    view: &ViewHandle,
    commands: &mpsc::Sender<Envelope>,
    quit_on_eof: bool,
) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("stdin read failed: {e}");
                return;
            }
        };
        let Some(command) = Command::from_key(&line, view.snapshot().mode()) else {
            debug!(key = %line.trim(), "unbound key");
            continue;
        };
        if commands.blocking_send(Envelope::fire(command)).is_err() || command == Command::Quit {
            return;
        }
    }

    if quit_on_eof {
        debug!("stdin closed");
        let _ = commands.blocking_send(Envelope::fire(Command::Quit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeswarm::view::{ViewMode, ViewState};

    fn drain(rx: &mut mpsc::Receiver<Envelope>) -> Vec<Command> {
        let mut out = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            out.push(envelope.command);
        }
        out
    }

    #[test]
    fn keys_follow_the_view_mode() {
        let view = ViewHandle::new(ViewState::new(20, 5, 5));
        let (tx, mut rx) = mpsc::channel(16);

        pump_keys("n\nx\n \ns\n".as_bytes(), &view, &tx, false);
        assert_eq!(
            drain(&mut rx),
            vec![Command::NextPage, Command::TogglePause, Command::SaveAll]
        );

        view.update(|v| v.enter_multi());
        pump_keys("n\np\nq\n".as_bytes(), &view, &tx, false);
        assert_eq!(
            drain(&mut rx),
            vec![Command::MultiNextPage, Command::MultiPrevPage, Command::ReturnToSingle]
        );
        assert_eq!(view.snapshot().mode(), ViewMode::MultiGrid);
    }

    #[test]
    fn quit_stops_reading() {
        let view = ViewHandle::new(ViewState::new(20, 5, 5));
        let (tx, mut rx) = mpsc::channel(16);
        pump_keys("q\nn\n".as_bytes(), &view, &tx, true);
        assert_eq!(drain(&mut rx), vec![Command::Quit]);
    }

    #[test]
    fn eof_quits_only_when_asked() {
        let view = ViewHandle::new(ViewState::new(20, 5, 5));
        let (tx, mut rx) = mpsc::channel(16);

        pump_keys("".as_bytes(), &view, &tx, false);
        assert!(drain(&mut rx).is_empty());

        pump_keys("l\n".as_bytes(), &view, &tx, true);
        assert_eq!(drain(&mut rx), vec![Command::LoadAll, Command::Quit]);
    }
}
