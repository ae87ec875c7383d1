use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tree::{CommentView, ThreadNode};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsQuery {
    #[serde(default)]
    pub count_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CommentsResponse {
    Thread {
        success: bool,
        comments: Vec<ThreadNode>,
        #[serde(rename = "totalCount")]
        total_count: usize,
    },
    Counts {
        success: bool,
        count: usize,
        #[serde(rename = "commentsCount")]
        comments_count: usize,
        #[serde(rename = "repliesCount")]
        replies_count: usize,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCommentRequest {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentEnvelope {
    pub success: bool,
    pub comment: CommentView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLikeResponse {
    pub success: bool,
    pub is_liked: bool,
    pub likes_count: usize,
}
