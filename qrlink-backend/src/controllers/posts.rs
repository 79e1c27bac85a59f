use actix_web::{HttpRequest, HttpResponse, Responder, web};

use crate::AppState;
use crate::middleware::session_auth::require_subject;
use crate::models::{CommentCreate, PostCreate};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/posts")
            .route("", web::get().to(list_posts))
            .route("", web::post().to(create_post))
            .route("/{post_id}/comments", web::post().to(add_comment)),
    );
}

async fn list_posts(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_subject(&state.tokens, &req) {
        return resp;
    }
    HttpResponse::Ok().json(state.feed.list())
}

async fn create_post(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<PostCreate>,
) -> impl Responder {
    let username = match require_subject(&state.tokens, &req) {
        Ok(subject) => subject,
        Err(resp) => return resp,
    };
    let post = state.feed.create_post(&username, &body.content);
    HttpResponse::Created().json(post)
}

async fn add_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CommentCreate>,
) -> impl Responder {
    let username = match require_subject(&state.tokens, &req) {
        Ok(subject) => subject,
        Err(resp) => return resp,
    };
    match state
        .feed
        .add_comment(path.into_inner(), &username, &body.content)
    {
        Some(comment) => HttpResponse::Created().json(comment),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Post not found"
        })),
    }
}
