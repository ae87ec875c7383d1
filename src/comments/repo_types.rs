use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Stored comment. `parent_id == None` marks a top-level comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub content: String,
    pub likes: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }
}

/// Result of flipping one user's membership in a like set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub is_liked: bool,
    pub likes_count: usize,
}

/// Visible comment counts of one recipe. Replies whose parent is gone are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentCounts {
    pub top_level: usize,
    pub replies: usize,
}

impl CommentCounts {
    pub fn total(&self) -> usize {
        self.top_level + self.replies
    }
}
