use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    repo_types::{Comment, CommentCounts, LikeToggle},
    tree::{build_tree, CommentView, Thread},
};
use crate::{
    error::{AppError, AppResult},
    identity::Identity,
    recipes::moderation,
    state::AppState,
};

fn clean_content(raw: &str) -> AppResult<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::validation("Comment cannot be empty"));
    }
    Ok(content.to_string())
}

async fn visible_recipe(state: &AppState, recipe_id: Uuid, viewer: Option<&Identity>) -> AppResult<()> {
    state
        .store
        .find_recipe(recipe_id)
        .await?
        .filter(|r| moderation::can_view(r, viewer))
        .map(|_| ())
        .ok_or(AppError::NotFound("recipe"))
}

pub async fn thread(state: &AppState, recipe_id: Uuid, viewer: Option<&Identity>) -> AppResult<Thread> {
    visible_recipe(state, recipe_id, viewer).await?;
    let all = state.store.list_comments(recipe_id).await?;
    Ok(build_tree(all))
}

pub async fn counts(
    state: &AppState,
    recipe_id: Uuid,
    viewer: Option<&Identity>,
) -> AppResult<CommentCounts> {
    visible_recipe(state, recipe_id, viewer).await?;
    Ok(state.store.count_comments(recipe_id).await?)
}

pub async fn post(
    state: &AppState,
    author: &Identity,
    recipe_id: Uuid,
    content: &str,
    parent_id: Option<Uuid>,
) -> AppResult<CommentView> {
    let content = clean_content(content)?;
    visible_recipe(state, recipe_id, Some(author)).await?;

    if let Some(parent_id) = parent_id {
        let parent = state
            .store
            .find_comment(parent_id)
            .await?
            .ok_or(AppError::NotFound("parent comment"))?;
        if parent.recipe_id != recipe_id {
            return Err(AppError::validation("parent comment belongs to another recipe"));
        }
        if parent.is_reply() {
            return Err(AppError::validation("cannot reply to a reply"));
        }
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        recipe_id,
        parent_id,
        user_id: author.user_id,
        user_name: author.display_name(),
        user_email: author.email.clone(),
        content,
        likes: Vec::new(),
        created_at: OffsetDateTime::now_utc(),
        updated_at: None,
    };
    state.store.insert_comment(&comment).await?;

    match state.store.adjust_comments_count(recipe_id, 1).await {
        Ok(Some(counters)) => state.events.publish(counters),
        Ok(None) => warn!(consistency_risk = true, %recipe_id, comment_id = %comment.id, "recipe vanished after comment insert"),
        Err(e) => {
            warn!(consistency_risk = true, %recipe_id, comment_id = %comment.id, error = %e, "comment count not incremented");
            return Err(e.into());
        }
    }

    info!(comment_id = %comment.id, %recipe_id, reply = comment.is_reply(), "comment posted");
    Ok(comment.into())
}

pub async fn edit(state: &AppState, editor: &Identity, id: Uuid, content: &str) -> AppResult<CommentView> {
    let content = clean_content(content)?;
    let comment = state
        .store
        .find_comment(id)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    if comment.user_id != editor.user_id {
        warn!(comment_id = %id, user_id = %editor.user_id, "edit of foreign comment refused");
        return Err(AppError::forbidden("you can only edit your own comments"));
    }
    let updated = state
        .store
        .update_comment_content(id, &content, OffsetDateTime::now_utc())
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    info!(comment_id = %id, "comment edited");
    Ok(updated.into())
}

pub async fn delete(state: &AppState, who: &Identity, id: Uuid) -> AppResult<()> {
    let comment = state
        .store
        .find_comment(id)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    if !who.can_manage(Some(comment.user_id)) {
        warn!(comment_id = %id, user_id = %who.user_id, "delete of foreign comment refused");
        return Err(AppError::forbidden("you can't delete this comment"));
    }
    if !state.store.delete_comment(id).await? {
        return Err(AppError::NotFound("comment"));
    }

    match state.store.adjust_comments_count(comment.recipe_id, -1).await {
        Ok(Some(counters)) => state.events.publish(counters),
        Ok(None) => {}
        Err(e) => {
            warn!(consistency_risk = true, recipe_id = %comment.recipe_id, comment_id = %id, error = %e, "comment count not decremented");
            return Err(e.into());
        }
    }

    info!(comment_id = %id, recipe_id = %comment.recipe_id, "comment deleted");
    Ok(())
}

pub async fn toggle_like(state: &AppState, who: &Identity, id: Uuid) -> AppResult<LikeToggle> {
    let toggled = state
        .store
        .toggle_comment_like(id, who.user_id)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    info!(comment_id = %id, user_id = %who.user_id, liked = toggled.is_liked, "comment like toggled");
    Ok(toggled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fixtures::{admin, user};
    use crate::recipes::repo_types::fixtures::recipe;

    async fn seeded() -> (AppState, Uuid) {
        let state = AppState::fake();
        let r = recipe("Phở bò", vec![]);
        state.store.insert_recipe(&r).await.unwrap();
        (state, r.id)
    }

    async fn comments_count(state: &AppState, recipe_id: Uuid) -> i64 {
        state
            .store
            .find_recipe(recipe_id)
            .await
            .unwrap()
            .unwrap()
            .comments_count
    }

    #[tokio::test]
    async fn post_trims_content_and_bumps_count() {
        let (state, rid) = seeded().await;
        let mut rx = state.events.subscribe();
        let c = post(&state, &user("lan@example.com"), rid, "  ngon quá  ", None)
            .await
            .unwrap();
        assert_eq!(c.comment.content, "ngon quá");
        assert_eq!(c.likes_count, 0);
        assert!(c.comment.updated_at.is_none());
        assert_eq!(comments_count(&state, rid).await, 1);
        assert_eq!(rx.recv().await.unwrap().comments_count, 1);
    }

    #[tokio::test]
    async fn blank_comment_creates_nothing() {
        let (state, rid) = seeded().await;
        let res = post(&state, &user("lan@example.com"), rid, "   \n ", None).await;
        assert!(matches!(res, Err(AppError::Validation(_))));
        assert!(state.store.list_comments(rid).await.unwrap().is_empty());
        assert_eq!(comments_count(&state, rid).await, 0);
    }

    #[tokio::test]
    async fn reply_to_missing_parent_is_not_found() {
        let (state, rid) = seeded().await;
        let res = post(&state, &user("lan@example.com"), rid, "đồng ý", Some(Uuid::new_v4())).await;
        assert!(matches!(res, Err(AppError::NotFound("parent comment"))));
        assert_eq!(comments_count(&state, rid).await, 0);
    }

    #[tokio::test]
    async fn replies_cannot_nest() {
        let (state, rid) = seeded().await;
        let who = user("lan@example.com");
        let top = post(&state, &who, rid, "hỏi", None).await.unwrap();
        let reply = post(&state, &who, rid, "đáp", Some(top.comment.id)).await.unwrap();
        let res = post(&state, &who, rid, "đáp nữa", Some(reply.comment.id)).await;
        assert!(matches!(res, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn post_on_unknown_recipe_is_not_found() {
        let state = AppState::fake();
        let res = post(&state, &user("lan@example.com"), Uuid::new_v4(), "hi", None).await;
        assert!(matches!(res, Err(AppError::NotFound("recipe"))));
    }

    #[tokio::test]
    async fn deleting_parent_hides_its_replies() {
        let (state, rid) = seeded().await;
        let who = user("lan@example.com");
        let top = post(&state, &who, rid, "hỏi", None).await.unwrap();
        post(&state, &who, rid, "đáp", Some(top.comment.id)).await.unwrap();
        let other = post(&state, &who, rid, "khác", None).await.unwrap();

        delete(&state, &who, top.comment.id).await.unwrap();

        let t = thread(&state, rid, None).await.unwrap();
        assert_eq!(t.comments.len(), 1);
        assert_eq!(t.comments[0].view.comment.id, other.comment.id);
        assert_eq!(t.total_count, 1);
        assert_eq!(counts(&state, rid, None).await.unwrap().total(), 1);
    }

    #[tokio::test]
    async fn only_owner_edits_and_admin_may_delete() {
        let (state, rid) = seeded().await;
        let owner = user("lan@example.com");
        let c = post(&state, &owner, rid, "ngon", None).await.unwrap();

        let stranger = user("x@example.com");
        assert!(matches!(
            edit(&state, &stranger, c.comment.id, "dở").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            edit(&state, &admin(), c.comment.id, "dở").await,
            Err(AppError::Forbidden(_))
        ));
        let edited = edit(&state, &owner, c.comment.id, " rất ngon ").await.unwrap();
        assert_eq!(edited.comment.content, "rất ngon");
        assert!(edited.comment.updated_at.is_some());
        assert_eq!(edited.comment.created_at, c.comment.created_at);

        assert!(matches!(
            delete(&state, &stranger, c.comment.id).await,
            Err(AppError::Forbidden(_))
        ));
        delete(&state, &admin(), c.comment.id).await.unwrap();
        assert_eq!(comments_count(&state, rid).await, 0);
    }

    #[tokio::test]
    async fn like_toggle_reports_set_size() {
        let (state, rid) = seeded().await;
        let c = post(&state, &user("lan@example.com"), rid, "ngon", None).await.unwrap();
        let a = user("a@example.com");
        let b = user("b@example.com");

        assert_eq!(
            toggle_like(&state, &a, c.comment.id).await.unwrap(),
            LikeToggle { is_liked: true, likes_count: 1 }
        );
        assert_eq!(
            toggle_like(&state, &b, c.comment.id).await.unwrap(),
            LikeToggle { is_liked: true, likes_count: 2 }
        );
        assert_eq!(
            toggle_like(&state, &a, c.comment.id).await.unwrap(),
            LikeToggle { is_liked: false, likes_count: 1 }
        );

        let t = thread(&state, rid, None).await.unwrap();
        assert_eq!(t.comments[0].view.likes_count, 1);
    }
}
