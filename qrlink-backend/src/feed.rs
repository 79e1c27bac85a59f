//! Post feed
//!
//! A minimal authenticated append-only feed, kept as the demonstration
//! consumer of the bearer-token contract. Newest posts first; ids are
//! assigned from the running count and nothing is ever deleted.

use chrono::Utc;
use parking_lot::RwLock;

use crate::models::{Comment, Post};

#[derive(Default)]
pub struct FeedStore {
    posts: RwLock<Vec<Post>>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
        }
    }

    pub fn list(&self) -> Vec<Post> {
        self.posts.read().clone()
    }

    pub fn create_post(&self, username: &str, content: &str) -> Post {
        let mut posts = self.posts.write();
        let post = Post {
            id: posts.len() as i64 + 1,
            username: username.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            comments: Vec::new(),
        };
        posts.insert(0, post.clone());
        post
    }

    /// Append a comment; ids count from 1 within each post. None when the
    /// post does not exist.
    pub fn add_comment(&self, post_id: i64, username: &str, content: &str) -> Option<Comment> {
        let mut posts = self.posts.write();
        let post = posts.iter_mut().find(|p| p.id == post_id)?;
        let comment = Comment {
            id: post.comments.len() as i64 + 1,
            username: username.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        post.comments.push(comment.clone());
        Some(comment)
    }
}
