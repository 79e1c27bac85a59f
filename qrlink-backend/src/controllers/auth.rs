use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::handshake::HandshakeError;
use crate::middleware::session_auth::extract_token;
use crate::qr;

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    session_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    username: String,
    token: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(login_page));
    cfg.route("/api/qr-login", web::post().to(qr_login));
    cfg.route("/api/logout", web::post().to(logout));
    cfg.route(
        "/api/check-session/{session_id}",
        web::get().to(check_session),
    );
}

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>QR Login</title>
</head>
<body>
  <h1>Scan to sign in</h1>
  <img src="__QR_CODE__" alt="login QR code" width="240" height="240">
  <p>Session: <code>__SESSION_ID__</code></p>
  <p id="status">pending</p>
  <script>
    var sessionId = "__SESSION_ID__";
    var statusEl = document.getElementById("status");
    var scheme = location.protocol === "https:" ? "wss://" : "ws://";
    var ws = new WebSocket(scheme + location.host + "/ws/" + sessionId);
    var poll = null;
    ws.onopen = function () {
      poll = setInterval(function () { ws.send("poll"); }, 2000);
    };
    ws.onmessage = function (e) {
      var data = JSON.parse(e.data);
      statusEl.textContent = data.status;
      if (data.status === "authenticated") {
        localStorage.setItem("token", data.token);
        statusEl.textContent = "signed in as " + data.user;
        ws.close();
      }
    };
    ws.onclose = function () {
      if (poll) clearInterval(poll);
    };
  </script>
</body>
</html>
"#;

/// Login page: allocates a session and renders its QR code inline.
async fn login_page(state: web::Data<AppState>) -> impl Responder {
    let (session, payload) = state.coordinator.start_login();
    match qr::svg_data_uri(&payload) {
        Ok(qr_code) => {
            let page = LOGIN_PAGE
                .replace("__QR_CODE__", &qr_code)
                .replace("__SESSION_ID__", &session.id);
            HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(page)
        }
        Err(e) => {
            log::error!("QR encoding failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to render login page"
            }))
        }
    }
}

/// Confirmation from the second device. The session flips to authenticated
/// and any bound channel is pushed the new status.
async fn qr_login(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SessionRequest>,
) -> impl Responder {
    // Subject comes from the confirming device's bearer token when one is
    // presented; otherwise the configured stand-in subject.
    let subject = match extract_token(&req) {
        Some(token) => match state.tokens.verify(&token) {
            Ok(subject) => subject,
            Err(e) => {
                log::debug!("confirm with rejected bearer: {}", e);
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "Invalid or expired token"
                }));
            }
        },
        None => state.config.fallback_subject.clone(),
    };

    match state.coordinator.confirm(&body.session_id, &subject).await {
        Ok((username, token)) => HttpResponse::Ok().json(LoginResponse { username, token }),
        Err(HandshakeError::SessionNotFound) => {
            HttpResponse::NotFound().json(serde_json::json!({
                "error": "Session not found or expired"
            }))
        }
        Err(e) => {
            log::error!("confirm failed for session {}: {}", body.session_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to confirm session"
            }))
        }
    }
}

async fn logout(state: web::Data<AppState>, body: web::Json<SessionRequest>) -> impl Responder {
    state.coordinator.logout(&body.session_id).await;
    HttpResponse::Ok().json(serde_json::json!({ "status": "success" }))
}

async fn check_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.coordinator.check_session(&path.into_inner()) {
        Some(session) => HttpResponse::Ok().json(serde_json::json!({
            "status": session.status.as_str(),
            "user": session.user,
        })),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Session not found or expired"
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use std::sync::Arc;

    use crate::config::Config;
    use crate::feed::FeedStore;
    use crate::gateway::ConnectionRegistry;
    use crate::handshake::{LoginCoordinator, SweepPolicy};
    use crate::store::SessionStore;
    use crate::tokens::TokenService;

    fn test_state() -> web::Data<AppState> {
        let config = Config {
            secret_key: "test-secret".to_string(),
            port: 0,
            pending_session_ttl_secs: 300,
            auth_session_ttl_secs: 3600,
            sweep_interval_secs: 60,
            fallback_subject: "user1".to_string(),
        };
        let tokens = Arc::new(TokenService::new(&config.secret_key));
        let coordinator = Arc::new(LoginCoordinator::new(
            Arc::new(SessionStore::new()),
            Arc::new(ConnectionRegistry::new()),
            tokens.clone(),
            SweepPolicy {
                pending_ttl: chrono::Duration::seconds(config.pending_session_ttl_secs as i64),
                authenticated_ttl: chrono::Duration::seconds(config.auth_session_ttl_secs as i64),
                interval: std::time::Duration::from_secs(config.sweep_interval_secs),
            },
        ));
        web::Data::new(AppState {
            config,
            tokens,
            coordinator,
            feed: Arc::new(FeedStore::new()),
        })
    }

    #[actix_web::test]
    async fn test_login_page_embeds_qr_and_session() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("data:image/svg+xml;base64,"));
        assert_eq!(state.coordinator.store().len(), 1);
    }

    #[actix_web::test]
    async fn test_check_session_lifecycle_over_http() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let (session, _) = state.coordinator.start_login();

        let req = test::TestRequest::get()
            .uri(&format!("/api/check-session/{}", session.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "pending");
        assert!(body["user"].is_null());

        let req = test::TestRequest::post()
            .uri("/api/qr-login")
            .set_json(serde_json::json!({ "session_id": session.id }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["username"], "user1");
        let token = body["token"].as_str().unwrap();
        assert_eq!(state.tokens.verify(token).unwrap(), "user1");

        let req = test::TestRequest::get()
            .uri(&format!("/api/check-session/{}", session.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "authenticated");
        assert_eq!(body["user"], "user1");
    }

    #[actix_web::test]
    async fn test_confirm_unknown_session_is_404() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/qr-login")
            .set_json(serde_json::json!({ "session_id": "missing" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
        assert!(state.coordinator.store().is_empty());
    }

    #[actix_web::test]
    async fn test_confirm_with_valid_bearer_uses_its_subject() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let (session, _) = state.coordinator.start_login();
        let bearer = state.tokens.issue_confirm_token("alice").unwrap();

        let req = test::TestRequest::post()
            .uri("/api/qr-login")
            .insert_header(("Authorization", format!("Bearer {}", bearer)))
            .set_json(serde_json::json!({ "session_id": session.id }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["username"], "alice");
    }

    #[actix_web::test]
    async fn test_logout_nonexistent_still_succeeds() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/logout")
            .set_json(serde_json::json!({ "session_id": "missing" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "success");
    }

    #[actix_web::test]
    async fn test_logout_removes_existing_session() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;
        let (session, _) = state.coordinator.start_login();

        let req = test::TestRequest::post()
            .uri("/api/logout")
            .set_json(serde_json::json!({ "session_id": session.id }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "success");

        let req = test::TestRequest::get()
            .uri(&format!("/api/check-session/{}", session.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
