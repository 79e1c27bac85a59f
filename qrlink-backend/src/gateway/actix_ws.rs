//! WebSocket notification endpoint
//!
//! `GET /ws/{session_id}` accepts the connection, binds it as the session's
//! observer, then answers every inbound frame with the current status
//! snapshot. An `expired` snapshot is terminal for the binding.

use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::{CloseCode, CloseReason, Message, MessageStream, Session};
use futures_util::StreamExt;
use uuid::Uuid;

use crate::AppState;
use crate::gateway::protocol::EventStatus;

pub async fn ws_handler(
    req: HttpRequest,
    body: web::Payload,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    let session_id = path.into_inner();
    let (response, ws, stream) = actix_ws::handle(&req, body)?;

    // Unknown id: accept the handshake, then close with a policy code.
    if state.coordinator.check_session(&session_id).is_none() {
        actix_web::rt::spawn(async move {
            let _ = ws
                .close(Some(CloseReason {
                    code: CloseCode::Policy,
                    description: Some("unknown or expired session".into()),
                }))
                .await;
        });
        return Ok(response);
    }

    log::debug!("notification channel bound for session {}", session_id);
    let conn_id = state.coordinator.connections().bind(&session_id, ws.clone());
    actix_web::rt::spawn(poll_loop(state, session_id, conn_id, ws, stream));

    Ok(response)
}

async fn poll_loop(
    state: web::Data<AppState>,
    session_id: String,
    conn_id: Uuid,
    mut ws: Session,
    mut stream: MessageStream,
) {
    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(_) | Message::Binary(_) => {
                let event = match state.coordinator.poll_snapshot(&session_id) {
                    Ok(event) => event,
                    Err(e) => {
                        log::error!("poll snapshot failed for session {}: {}", session_id, e);
                        break;
                    }
                };
                let Ok(reply) = serde_json::to_string(&event) else {
                    break;
                };
                if ws.text(reply).await.is_err() {
                    break;
                }
                if event.status == EventStatus::Expired {
                    break;
                }
            }
            Message::Ping(bytes) => {
                if ws.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Release promptly on disconnect, unless a newer connection has already
    // superseded this one.
    state.coordinator.connections().unbind_if(&session_id, conn_id);
    let _ = ws.close(None).await;
    log::debug!("notification channel released for session {}", session_id);
}
