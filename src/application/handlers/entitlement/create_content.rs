//! CreatePostHandler and CreateReplyHandler - gated content creation.
//!
//! Content storage is an external collaborator behind `ContentWriter`;
//! these handlers only decide whether the author may write.

use std::sync::Arc;

use super::entitlement_gate::EntitlementGate;
use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::UserId;
use crate::ports::{ContentRef, ContentWriter, NewPost, NewReply};

pub const CREATE_POSTS: &str = "create posts";
pub const CREATE_REPLIES: &str = "create replies";

/// Command to create a post.
#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub author_id: UserId,
    pub title: String,
    pub content: String,
}

/// Command to reply to a post.
#[derive(Debug, Clone)]
pub struct CreateReplyCommand {
    pub author_id: UserId,
    pub post_id: i64,
    pub content: String,
}

fn require_text(field: &str, value: &str) -> Result<(), EntitlementError> {
    if value.trim().is_empty() {
        return Err(EntitlementError::validation(field, "cannot be empty"));
    }
    Ok(())
}

/// Handler for creating posts.
pub struct CreatePostHandler {
    gate: EntitlementGate,
    writer: Arc<dyn ContentWriter>,
}

impl CreatePostHandler {
    pub fn new(gate: EntitlementGate, writer: Arc<dyn ContentWriter>) -> Self {
        Self { gate, writer }
    }

    pub async fn handle(&self, cmd: CreatePostCommand) -> Result<ContentRef, EntitlementError> {
        self.gate.require(cmd.author_id, CREATE_POSTS).await?;

        require_text("title", &cmd.title)?;
        require_text("content", &cmd.content)?;

        let created = self
            .writer
            .create_post(NewPost {
                author_id: cmd.author_id,
                title: cmd.title,
                content: cmd.content,
            })
            .await?;

        tracing::debug!(author_id = %cmd.author_id, post_id = created.id, "post created");
        Ok(created)
    }
}

/// Handler for creating replies.
pub struct CreateReplyHandler {
    gate: EntitlementGate,
    writer: Arc<dyn ContentWriter>,
}

impl CreateReplyHandler {
    pub fn new(gate: EntitlementGate, writer: Arc<dyn ContentWriter>) -> Self {
        Self { gate, writer }
    }

    pub async fn handle(&self, cmd: CreateReplyCommand) -> Result<ContentRef, EntitlementError> {
        self.gate.require(cmd.author_id, CREATE_REPLIES).await?;

        if cmd.post_id <= 0 {
            return Err(EntitlementError::validation("post_id", "must be positive"));
        }
        require_text("content", &cmd.content)?;

        let created = self
            .writer
            .create_reply(NewReply {
                author_id: cmd.author_id,
                post_id: cmd.post_id,
                content: cmd.content,
            })
            .await?;

        tracing::debug!(author_id = %cmd.author_id, post_id = cmd.post_id, reply_id = created.id, "reply created");
        Ok(created)
    }
}
