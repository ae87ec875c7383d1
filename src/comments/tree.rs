//! Server-side comment threads.
//!
//! A thread is two levels deep: top-level comments newest first, each with its
//! replies oldest first. Replies whose parent is gone are dropped, never
//! promoted.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::repo_types::Comment;

/// A comment as rendered, with its like count derived from the like set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub likes_count: usize,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            likes_count: comment.likes_count(),
            comment,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadNode {
    #[serde(flatten)]
    pub view: CommentView,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, Default)]
pub struct Thread {
    pub comments: Vec<ThreadNode>,
    pub total_count: usize,
}

pub fn build_tree(all: Vec<Comment>) -> Thread {
    let mut top = Vec::new();
    let mut replies: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for c in all {
        match c.parent_id {
            Some(parent) => replies.entry(parent).or_default().push(c),
            None => top.push(c),
        }
    }
    top.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut total_count = 0;
    let comments = top
        .into_iter()
        .map(|c| {
            let mut kids = replies.remove(&c.id).unwrap_or_default();
            kids.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            total_count += 1 + kids.len();
            ThreadNode {
                view: c.into(),
                replies: kids.into_iter().map(CommentView::from).collect(),
            }
        })
        .collect();

    Thread {
        comments,
        total_count,
    }
}
