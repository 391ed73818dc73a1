//! Game server implementation.
//!
//! One task owns the [`GameState`]; every websocket connection gets its own
//! task that forwards parsed input over an mpsc queue and relays the encoded
//! frames addressed to it from a broadcast channel.

use crate::config::Config;
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod client;
pub mod game;

pub use game::{run_game_loop, Command, GameState, Outbound, Recipient};

use protocol::ClientMessage;

/// Peers that have not completed the websocket upgrade by then are dropped.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on delivering the close frame to a peer that stopped reading.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// An encoded server message on its way to the connections it is addressed to.
#[derive(Debug, Clone)]
pub struct Frame {
    pub recipient: Recipient,
    pub text: Arc<str>,
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn run(config: Config, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);
    serve(listener, config, shutdown).await
}

/// Serve websocket clients on an already bound listener.
///
/// On shutdown the game loop is stopped, every connection is sent a close
/// frame, and this returns once all tasks have finished. Connections still
/// in the handshake are abandoned.
pub async fn serve(
    listener: TcpListener,
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    config.validate()?;

    let (command_tx, command_rx) = mpsc::channel::<Command>(config.server.command_buffer);
    let (frame_tx, _frame_rx) = broadcast::channel::<Frame>(config.server.frame_buffer);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = GameState::new(&config);
    let game_loop = tokio::spawn(run_game_loop(state, command_rx, frame_tx.clone(), shutdown_rx.clone()));

    let permits = Arc::new(Semaphore::new(config.server.max_connections));
    let mut connections = JoinSet::new();
    let mut next_client_id: u32 = 1;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            accepted = listener.accept() => {
                let (stream, addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let Ok(permit) = Arc::clone(&permits).try_acquire_owned() else {
                    warn!("Connection rejected (limit reached): {}", addr);
                    continue;
                };

                let client_id = next_client_id;
                next_client_id = next_client_id.wrapping_add(1).max(1);

                let commands = command_tx.clone();
                let frames = frame_tx.subscribe();
                let shutdown = shutdown_rx.clone();
                connections.spawn(async move {
                    if let Err(e) = handle_connection(stream, addr, client_id, commands, frames, shutdown).await {
                        error!("Connection error from {}: {}", addr, e);
                    }
                    drop(permit);
                });
            }
            // Reap finished connection tasks so the set does not grow unbounded.
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    let _ = shutdown_tx.send(true);
    while connections.join_next().await.is_some() {}
    game_loop.await?;
    info!("Server stopped");
    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    client_id: u32,
    commands: mpsc::Sender<Command>,
    mut frames: broadcast::Receiver<Frame>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let ws_stream = tokio::select! {
        accepted = timeout(HANDSHAKE_TIMEOUT, accept_async(stream)) => accepted??,
        _ = shutdown.changed() => {
            debug!("Dropping {} mid-handshake on shutdown", addr);
            return Ok(());
        }
    };
    info!("New connection from {} (player {})", addr, client_id);

    let (mut write, mut read) = ws_stream.split();

    // Subscribed before joining, so the initial gameState cannot be missed.
    commands.send(Command::Join { client_id, addr }).await?;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ClientMessage::parse(&text) {
                            Ok(message) => {
                                if commands.send(Command::Client { client_id, message }).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => debug!("Dropping malformed message from {}: {}", addr, e),
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
            frame = frames.recv() => {
                match frame {
                    Ok(frame) => {
                        if !frame.recipient.includes(client_id) {
                            continue;
                        }
                        if let Err(e) = write.send(Message::Text(frame.text.to_string().into())).await {
                            warn!("Failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!("Client {} fell behind, skipped {} frames", addr, missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = shutdown.changed() => {
                if timeout(CLOSE_TIMEOUT, write.send(Message::Close(None))).await.is_err() {
                    debug!("Close frame to {} timed out", addr);
                }
                break;
            }
        }
    }

    // The game loop may already be gone during shutdown.
    let _ = commands.send(Command::Leave { client_id }).await;
    Ok(())
}
