use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
pub struct PostCreate {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentCreate {
    pub content: String,
}
