//! Content writer port.
//!
//! Posts and replies are stored by the content service. The entitlement
//! engine only gates their creation; once the gate allows, the write is
//! delegated through this port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, UserId};

/// A new top-level post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub author_id: UserId,
    pub title: String,
    pub content: String,
}

/// A reply to an existing post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReply {
    pub author_id: UserId,
    pub post_id: i64,
    pub content: String,
}

/// Identifier of the stored content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub id: i64,
}

/// Port for persisting user content.
#[async_trait]
pub trait ContentWriter: Send + Sync {
    async fn create_post(&self, post: NewPost) -> Result<ContentRef, DomainError>;

    /// Fails with a not-found error if `post_id` does not exist.
    async fn create_reply(&self, reply: NewReply) -> Result<ContentRef, DomainError>;
}
