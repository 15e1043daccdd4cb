use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use minigame_engine::collaborators::{AdGate, Collaborators, PremiumFlag, SharedScoreStore};
use minigame_engine::config::{RulesBook, ServerConfig};
use minigame_engine::engine::RoundEngine;
use minigame_engine::score_store::ScoreStore;
use minigame_engine::server_protocol::{parse_client_message, ParsedClientMessage};
use minigame_engine::server_utils::{permission_block_reason, resolve_static_dir, session_seed};
use minigame_engine::signal::FeedSource;
use minigame_engine::types::{GameId, RoundState};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ClientSession {
    tx: mpsc::Sender<OutboundMessage>,
    seq: u64,
    premium: PremiumFlag,
    engine: Option<RoundEngine>,
}

struct ServerState {
    sessions: HashMap<String, ClientSession>,
    scores: SharedScoreStore,
    rules: RulesBook,
    started: Instant,
    entropy: u32,
}

impl ServerState {
    fn new(scores: ScoreStore, rules: RulesBook) -> Self {
        Self {
            sessions: HashMap::new(),
            scores: SharedScoreStore(Arc::new(parking_lot::Mutex::new(scores))),
            rules,
            started: Instant::now(),
            entropy: rand::random(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

struct ClientAdGate {
    client_id: String,
}

impl AdGate for ClientAdGate {
    fn request_interstitial(&mut self) {
        info!(client_id = %self.client_id, "interstitial requested");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid server configuration: {err}");
            std::process::exit(2);
        }
    };
    let rules = match config.load_rules() {
        Ok(rules) => rules,
        Err(err) => {
            error!("failed to load rules: {err}");
            std::process::exit(2);
        }
    };

    let state = Arc::new(Mutex::new(ServerState::new(
        ScoreStore::new(config.score_db_path.clone()),
        rules,
    )));
    start_tick_loop(state.clone(), config.tick_ms);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/scores", get(scores_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir(config.static_dir.clone()) {
        let index_file = static_dir.join("index.html");
        info!("static file root: {}", static_dir.to_string_lossy());
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found; serving the API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    info!("listening on :{}", config.port);
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn scores_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let scores = state.lock().await.scores.clone();
    let response = scores.0.lock().build_response();
    Json(response)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (client_id, seq) = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard.sessions.insert(
            client_id.clone(),
            ClientSession {
                tx: tx.clone(),
                seq,
                premium: PremiumFlag::new(false),
                engine: None,
            },
        );
    }
    debug!(%client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => match std::str::from_utf8(&raw) {
                Ok(text) => handle_client_message(&state, &client_id, text).await,
                Err(_) => send_error_to_client(&state, &client_id, "invalid utf8 message").await,
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle_disconnect(&state, &client_id).await;
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Hello {
            game,
            premium,
            permission,
        } => handle_hello(&mut guard, client_id, game, premium, permission),
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
        ParsedClientMessage::SetPremium { premium } => {
            if let Some(session) = guard.sessions.get(client_id) {
                session.premium.set(premium);
            }
        }
        command => handle_round_command(&mut guard, client_id, command),
    }
}

fn handle_hello(
    state: &mut ServerState,
    client_id: &str,
    game: GameId,
    premium: bool,
    permission: bool,
) {
    let rules = state.rules.rules_for(game);
    let scores = state.scores.clone();
    let Some(session) = state.sessions.get_mut(client_id) else {
        return;
    };

    if let Some(mut previous) = session.engine.take() {
        previous.quit();
    }
    session.premium.set(premium);

    let kind = rules.signal_kind();
    let mut feed = FeedSource::new(kind);
    if !permission {
        feed.set_blocked(Some(permission_block_reason(kind)));
    }
    let collaborators = Collaborators::new(
        scores,
        session.premium.clone(),
        ClientAdGate {
            client_id: client_id.to_string(),
        },
    );
    let engine = RoundEngine::new(
        game,
        rules,
        Box::new(feed),
        collaborators,
        session_seed(session.seq, state.entropy),
    );
    let snapshot = engine.snapshot();
    session.engine = Some(engine);
    info!(%client_id, %game, premium, permission, "session bound to game");

    send_to_client(
        state,
        client_id,
        &json!({
            "type": "welcome",
            "clientId": client_id,
            "game": game,
            "signalKind": kind,
        }),
        QueuePolicy::DisconnectOnFull,
    );
    send_to_client(
        state,
        client_id,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn handle_round_command(state: &mut ServerState, client_id: &str, command: ParsedClientMessage) {
    let now_ms = state.now_ms();
    let Some(session) = state.sessions.get_mut(client_id) else {
        return;
    };
    let Some(engine) = session.engine.as_mut() else {
        send_to_client(
            state,
            client_id,
            &json!({
                "type": "error",
                "message": "send hello first",
            }),
            QueuePolicy::DisconnectOnFull,
        );
        return;
    };

    let result = match command {
        ParsedClientMessage::Start => engine.start(now_ms),
        ParsedClientMessage::Reset => engine.reset(),
        ParsedClientMessage::Signal { value } => {
            engine.push_signal(value);
            return;
        }
        ParsedClientMessage::DismissAd => {
            engine.dismiss_interstitial();
            Ok(())
        }
        ParsedClientMessage::Quit => {
            engine.quit();
            session.engine = None;
            info!(%client_id, "session quit");
            return;
        }
        ParsedClientMessage::Hello { .. }
        | ParsedClientMessage::Ping { .. }
        | ParsedClientMessage::SetPremium { .. } => return,
    };

    if let Err(err) = result {
        debug!(%client_id, "round command rejected: {err}");
        send_to_client(
            state,
            client_id,
            &json!({
                "type": "error",
                "message": err.to_string(),
            }),
            QueuePolicy::DisconnectOnFull,
        );
        return;
    }
    flush_session(state, client_id, QueuePolicy::DisconnectOnFull);
}

async fn handle_disconnect(state: &SharedState, client_id: &str) {
    let mut guard = state.lock().await;
    disconnect_client_internal(&mut guard, client_id);
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    let Some(mut session) = state.sessions.remove(client_id) else {
        return;
    };
    if let Some(engine) = session.engine.as_mut() {
        engine.quit();
    }
    let _ = session.tx.try_send(OutboundMessage::Close {
        code: 1000,
        reason: "bye".to_string(),
    });
    debug!(%client_id, "client disconnected");
}

fn start_tick_loop(state: SharedState, tick_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_sessions(&mut guard);
        }
    });
}

fn tick_sessions(state: &mut ServerState) {
    let now_ms = state.now_ms();
    let mut playing = Vec::new();
    for (client_id, session) in state.sessions.iter_mut() {
        let Some(engine) = session.engine.as_mut() else {
            continue;
        };
        if engine.state() != RoundState::Playing {
            continue;
        }
        engine.advance(now_ms);
        playing.push(client_id.clone());
    }

    for client_id in playing {
        flush_session(state, &client_id, QueuePolicy::DropOnFull);
    }
}

fn flush_session(state: &mut ServerState, client_id: &str, policy: QueuePolicy) {
    let Some(engine) = state
        .sessions
        .get_mut(client_id)
        .and_then(|session| session.engine.as_mut())
    else {
        return;
    };
    let snapshot = engine.snapshot();
    let events = engine.drain_events();

    send_to_client(
        state,
        client_id,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        policy,
    );
    for event in events {
        send_to_client(
            state,
            client_id,
            &json!({
                "type": "event",
                "event": event,
            }),
            QueuePolicy::DisconnectOnFull,
        );
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(session) = state.sessions.get(client_id) {
        session
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        warn!(%client_id, "outbound queue full; dropping client");
        disconnect_client_internal(state, client_id);
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> (String, u64) {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    (format!("{prefix}_{seq}"), seq)
}
