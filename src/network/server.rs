//! WebSocket Gateway
//!
//! Async WebSocket server for participant connections. Assigns identities,
//! forwards intents (find-match, submit-selection, disconnect) into the
//! matchmaker, and delivers emitted events back to connected participants.
//!
//! All game state lives in the [`Matchmaker`] behind one async mutex; every
//! operation locks it, runs to completion, and releases before any delivery
//! happens. That is the whole concurrency discipline: a room is never
//! observed in a half-updated state.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::game::matchmaker::{MatchDecision, Matchmaker, SubmitResult};
use crate::game::room::{ParticipantId, TurnResolution};
use crate::network::protocol::{ClientMessage, SelectionRequest, ServerMessage};
use crate::PICK_TIMEOUT_SECS;

/// Convert a resolved ball into the wire message both participants receive.
fn resolution_to_message(resolution: &TurnResolution) -> ServerMessage {
    match resolution {
        TurnResolution::TurnResult {
            score,
            balls,
            is_out,
            batsman_pick,
            bowler_pick,
            innings,
        } => ServerMessage::TurnResult {
            score: *score,
            balls: *balls,
            is_out: *is_out,
            batsman_pick: *batsman_pick,
            bowler_pick: *bowler_pick,
            current_innings: innings.number(),
        },
        TurnResolution::InningsComplete {
            first_innings_score,
            new_roles,
        } => ServerMessage::InningsComplete {
            first_innings_score: *first_innings_score,
            new_roles: new_roles.clone(),
        },
        TurnResolution::GameOver {
            winner,
            first_innings_score,
            second_innings_score,
            winning_participant,
        } => ServerMessage::GameOver {
            first_innings_score: *first_innings_score,
            second_innings_score: *second_innings_score,
            winner: *winner,
            winning_participant: *winning_participant,
        },
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Per-ball pick countdown advertised to clients (seconds).
    pub pick_timeout_secs: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".parse().unwrap(),
            max_connections: 1000,
            pick_timeout_secs: PICK_TIMEOUT_SECS,
        }
    }
}

/// Gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Per-participant delivery handles.
type ClientMap = BTreeMap<ParticipantId, mpsc::Sender<ServerMessage>>;

/// The session gateway.
pub struct Gateway {
    /// Server configuration.
    config: ServerConfig,
    /// All game state, serialized behind one lock.
    matchmaker: Arc<Mutex<Matchmaker>>,
    /// Connected participants.
    clients: Arc<RwLock<ClientMap>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            matchmaker: Arc::new(Mutex::new(Matchmaker::new())),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    pub async fn run(&self) -> Result<(), GatewayError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Gateway listening on {}", self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let connected = self.clients.read().await.len();
                            if connected >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            debug!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection on its own task.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let matchmaker = self.matchmaker.clone();
        let clients = self.clients.clone();
        let pick_timeout_secs = self.config.pick_timeout_secs;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            // Identity is assigned here, at connection time, and never reused.
            let participant = ParticipantId::generate();
            info!("Participant {} connected from {}", participant, addr);

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Register and announce the new connection count.
            {
                let mut clients = clients.write().await;
                clients.insert(participant, msg_tx.clone());
            }
            Self::broadcast_players_update(&clients).await;

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", participant, e);
                                        let _ = msg_tx.send(ServerMessage::Error {
                                            message: "Invalid message format".to_string(),
                                        }).await;
                                        continue;
                                    }
                                };

                                Self::handle_client_message(
                                    participant,
                                    client_msg,
                                    &matchmaker,
                                    &clients,
                                    pick_timeout_secs,
                                    &msg_tx,
                                ).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Participant {} disconnected", participant);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", participant, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            sender_task.abort();
            Self::handle_disconnect(participant, &matchmaker, &clients).await;
            info!("Participant {} cleaned up", participant);
        });
    }

    /// Handle a client message.
    async fn handle_client_message(
        participant: ParticipantId,
        msg: ClientMessage,
        matchmaker: &Arc<Mutex<Matchmaker>>,
        clients: &Arc<RwLock<ClientMap>>,
        pick_timeout_secs: u32,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        match msg {
            ClientMessage::FindMatch => {
                Self::handle_find_match(
                    participant,
                    matchmaker,
                    clients,
                    pick_timeout_secs,
                    sender,
                )
                .await;
            }
            ClientMessage::SubmitSelection(req) => {
                Self::handle_submit_selection(participant, req, matchmaker, clients).await;
            }
        }
    }

    /// Handle a find-match request.
    async fn handle_find_match(
        participant: ParticipantId,
        matchmaker: &Arc<Mutex<Matchmaker>>,
        clients: &Arc<RwLock<ClientMap>>,
        pick_timeout_secs: u32,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let decision = {
            let mut matchmaker = matchmaker.lock().await;
            matchmaker.find_match(participant)
        };

        match decision {
            MatchDecision::Waiting { room_id } => {
                debug!("Participant {} waiting in room {}", participant, room_id);
                let _ = sender.send(ServerMessage::Waiting { room_id }).await;
            }
            MatchDecision::Matched {
                room_id,
                assignments,
            } => {
                info!("Room {} paired", room_id);
                let clients = clients.read().await;
                for (id, assignment) in assignments {
                    if let Some(tx) = clients.get(&id) {
                        let _ = tx
                            .send(ServerMessage::GameStart {
                                room_id,
                                role: assignment.current,
                                current_innings: 1,
                                pick_timeout_secs,
                            })
                            .await;
                    }
                }
            }
        }
    }

    /// Handle a pick submission.
    async fn handle_submit_selection(
        participant: ParticipantId,
        req: SelectionRequest,
        matchmaker: &Arc<Mutex<Matchmaker>>,
        clients: &Arc<RwLock<ClientMap>>,
    ) {
        let result = {
            let mut matchmaker = matchmaker.lock().await;
            matchmaker.submit_selection(req.room_id, participant, req.pick, req.timed_out)
        };

        match result {
            SubmitResult::UnknownRoom => {
                // Likely a race against the peer's disconnect; ignore.
                debug!(
                    "Submission for unknown room {} from {}",
                    req.room_id, participant
                );
            }
            SubmitResult::Pending => {}
            SubmitResult::Rejected(rejection) => {
                debug!(
                    "Ignored submission from {} in room {}: {:?}",
                    participant, req.room_id, rejection
                );
            }
            SubmitResult::Resolved {
                resolution,
                recipients,
            } => {
                let message = resolution_to_message(&resolution);
                if matches!(resolution, TurnResolution::GameOver { .. }) {
                    info!("Room {} finished", req.room_id);
                }
                let clients = clients.read().await;
                for id in recipients {
                    if let Some(tx) = clients.get(&id) {
                        let _ = tx.send(message.clone()).await;
                    }
                }
            }
        }
    }

    /// Tear down everything the departing participant was part of.
    async fn handle_disconnect(
        participant: ParticipantId,
        matchmaker: &Arc<Mutex<Matchmaker>>,
        clients: &Arc<RwLock<ClientMap>>,
    ) {
        let departures = {
            let mut matchmaker = matchmaker.lock().await;
            matchmaker.disconnect(participant)
        };

        {
            let clients = clients.read().await;
            for departure in &departures {
                info!("Room {} torn down by disconnect", departure.room_id);
                if let Some(peer) = departure.peer {
                    if let Some(tx) = clients.get(&peer) {
                        let _ = tx.send(ServerMessage::PlayerDisconnected).await;
                    }
                }
            }
        }

        {
            let mut clients = clients.write().await;
            clients.remove(&participant);
        }
        Self::broadcast_players_update(clients).await;
    }

    /// Tell every connected client the live connection count.
    async fn broadcast_players_update(clients: &Arc<RwLock<ClientMap>>) {
        let clients = clients.read().await;
        let total = clients.len();
        for tx in clients.values() {
            let _ = tx.send(ServerMessage::PlayersUpdate { total }).await;
        }
    }

    /// Shutdown the gateway.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get live room count.
    pub async fn room_count(&self) -> usize {
        self.matchmaker.lock().await.room_count()
    }
}
