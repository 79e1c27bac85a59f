//! Bearer token authentication
//!
//! Feed endpoints require a signed bearer token; the helpers here extract
//! and verify it, handing controllers the token's subject.

use actix_web::{HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::tokens::TokenService;

pub fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_start_matches("Bearer ").to_string())
}

/// Verify the request's bearer token and return its subject, or the 401
/// response to send back.
pub fn require_subject(
    tokens: &Arc<TokenService>,
    req: &HttpRequest,
) -> Result<String, HttpResponse> {
    let token = extract_token(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "No authorization token provided"
        }))
    })?;

    tokens.verify(&token).map_err(|e| {
        log::debug!("token rejected: {}", e);
        HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid or expired token"
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_missing_header_is_rejected() {
        let tokens = Arc::new(TokenService::new("test-secret"));
        let req = TestRequest::default().to_http_request();

        assert!(require_subject(&tokens, &req).is_err());
    }

    #[test]
    fn test_valid_bearer_yields_subject() {
        let tokens = Arc::new(TokenService::new("test-secret"));
        let token = tokens.issue_confirm_token("user1").unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        assert_eq!(require_subject(&tokens, &req).unwrap(), "user1");
    }

    #[test]
    fn test_forged_bearer_is_rejected() {
        let tokens = Arc::new(TokenService::new("test-secret"));
        let forged = TokenService::new("other-secret")
            .issue_confirm_token("user1")
            .unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", forged)))
            .to_http_request();

        assert!(require_subject(&tokens, &req).is_err());
    }
}
