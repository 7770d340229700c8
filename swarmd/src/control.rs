//! TCP control socket: one JSON command per line in, one JSON response out.

use lifeswarm::command::{Command, Response};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::SwarmError;
use crate::router::{Envelope, Outcome};

pub fn response_for(result: Result<Outcome, SwarmError>) -> Response {
    match result {
        Ok(Outcome::Status(report)) => Response::State(report),
        Ok(outcome) => Response::Success {
            message: outcome.to_string(),
        },
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

/// Accept clients until cancelled.
pub async fn serve(
    listener: TcpListener,
    commands: mpsc::Sender<Envelope>,
    cancel: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, addr)) => {
                info!("Client connected: {}", addr);
                let commands = commands.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, commands).await {
                        error!("Client handler error: {}", e);
                    }
                    info!("Client disconnected: {}", addr);
                });
            }
            Err(e) => error!("accept failed: {e}"),
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    commands: mpsc::Sender<Envelope>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let response = match serde_json::from_str::<Command>(&line) {
            Ok(command) => {
                let (envelope, reply) = Envelope::with_reply(command);
                if commands.send(envelope).await.is_err() {
                    response_for(Err(SwarmError::ShuttingDown))
                } else {
                    // A dropped reply means the router went away mid-command.
                    response_for(reply.await.unwrap_or(Err(SwarmError::ShuttingDown)))
                }
            }
            Err(e) => Response::Error {
                message: format!("Invalid request: {}", e),
            },
        };

        writer
            .write_all(serde_json::to_string(&response)?.as_bytes())
            .await?;
        writer.write_all(b"\n").await?;
    }

    Ok(())
}
