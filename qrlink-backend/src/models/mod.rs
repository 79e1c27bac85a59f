pub mod feed;
pub mod session;

pub use feed::{Comment, CommentCreate, Post, PostCreate};
pub use session::{LoginSession, SessionStatus};
