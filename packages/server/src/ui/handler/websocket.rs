//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{ClientName, MessageContent, Session, SessionIdFactory, ValueObjectError},
    infrastructure::{dto::websocket::ClientMessage, session::WebSocketSession},
    ui::state::{AppState, ConnectQuery},
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, IdentifyParticipantUseCase,
        ListRoomsUseCase, SendMessageError, SendMessageUseCase,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> ClientName (Domain Model)
    let client_name = match query.client_name.map(ClientName::try_from).transpose() {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Rejecting connection with invalid client_name: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, client_name)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, client_name: Option<ClientName>) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this client to receive messages
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Arc::new(WebSocketSession::new(SessionIdFactory::generate(), tx));
    if let Some(name) = client_name {
        session.identify(name);
    }
    let session_id = session.id();

    // Use ConnectParticipantUseCase to place the session in the lobby
    let connect_usecase = ConnectParticipantUseCase::new(state.registry.clone());
    if let Err(e) = connect_usecase.execute(session.clone()).await {
        tracing::error!("Failed to connect session '{}': {}", session_id, e);
        return;
    }
    tracing::info!("Session '{}' connected", session_id);

    // Spawn a task to forward queued frames to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let recv_session = session.clone();
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    // Spawn a task to receive frames from this client. It only stops between
    // frames so a half-handled command never leaves the rooms inconsistent.
    let mut recv_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                msg = receiver.next() => msg,
                _ = &mut stop_rx => break,
            };
            let Some(msg) = msg else {
                break;
            };
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text: {}", text);
                    handle_frame(&recv_state, &recv_session, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Session '{}' requested close", recv_session.id());
                    break;
                }
                _ => {}
            }
        }
    });

    // If the client goes away, stop sending. If sending fails, let the
    // receiver finish the frame in hand before it stops.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => {
            let _ = stop_tx.send(());
            if let Err(e) = (&mut recv_task).await {
                tracing::error!("Receive task for '{}' failed: {}", session_id, e);
            }
        }
    };

    // Use DisconnectParticipantUseCase to handle disconnection
    DisconnectParticipantUseCase::new().execute(session).await;
}

/// Dispatch one client frame.
async fn handle_frame(state: &AppState, session: &Arc<WebSocketSession>, text: &str) {
    let frame = match serde_json::from_str::<ClientMessage>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Failed to parse frame from '{}': {}", session.id(), e);
            session.send_error(format!("Invalid frame: {e}"));
            return;
        }
    };

    match frame {
        ClientMessage::Identify { client_name } => {
            let name = match ClientName::try_from(client_name) {
                Ok(name) => name,
                Err(e) => {
                    session.send_error(e.to_string());
                    return;
                }
            };
            let usecase = IdentifyParticipantUseCase::new(state.registry.clone());
            if let Err(e) = usecase.execute(session.clone(), name).await {
                tracing::warn!("Identify failed for '{}': {}", session.id(), e);
                session.send_error(e.to_string());
            }
        }
        ClientMessage::Chat { content } => {
            let content = match MessageContent::try_from(content) {
                Ok(content) => content,
                Err(ValueObjectError::MessageContentEmpty) => {
                    tracing::debug!("Ignoring empty message from '{}'", session.id());
                    return;
                }
                Err(e) => {
                    session.send_error(e.to_string());
                    return;
                }
            };
            match SendMessageUseCase::new()
                .execute(session.clone(), content)
                .await
            {
                Ok(()) => {}
                Err(e @ SendMessageError::NotIdentified) => {
                    session.send_error(e.to_string());
                }
                Err(e) => {
                    tracing::warn!("Failed to send message from '{}': {}", session.id(), e);
                }
            }
        }
        ClientMessage::GetRooms { query } => {
            let rooms = ListRoomsUseCase::new(state.registry.clone())
                .execute(query.as_deref())
                .await;
            session.send_room_list(rooms);
        }
    }
}
