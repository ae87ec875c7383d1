use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        CommentEnvelope, CommentLikeResponse, CommentsResponse, EditCommentRequest,
        ListCommentsQuery, PostCommentRequest,
    },
    services,
};
use crate::{
    error::AppResult,
    identity::{AuthUser, MaybeAuthUser},
    recipes::dto::Ack,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/recipes/:id/comments",
            get(list_comments).post(post_comment),
        )
        .route("/comments/:id", put(edit_comment).delete(delete_comment))
        .route("/comments/:id/like", post(toggle_comment_like))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(recipe_id): Path<Uuid>,
    Query(q): Query<ListCommentsQuery>,
) -> AppResult<Json<CommentsResponse>> {
    if q.count_only {
        let c = services::counts(&state, recipe_id, viewer.as_ref()).await?;
        return Ok(Json(CommentsResponse::Counts {
            success: true,
            count: c.total(),
            comments_count: c.top_level,
            replies_count: c.replies,
        }));
    }
    let thread = services::thread(&state, recipe_id, viewer.as_ref()).await?;
    Ok(Json(CommentsResponse::Thread {
        success: true,
        comments: thread.comments,
        total_count: thread.total_count,
    }))
}

#[instrument(skip(state, body))]
pub async fn post_comment(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(recipe_id): Path<Uuid>,
    Json(body): Json<PostCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentEnvelope>)> {
    let comment = services::post(&state, &who, recipe_id, &body.content, body.parent_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentEnvelope {
            success: true,
            comment,
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn edit_comment(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<EditCommentRequest>,
) -> AppResult<Json<CommentEnvelope>> {
    let comment = services::edit(&state, &who, id, &body.content).await?;
    Ok(Json(CommentEnvelope {
        success: true,
        comment,
    }))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    services::delete(&state, &who, id).await?;
    Ok(Json(Ack { success: true }))
}

#[instrument(skip(state))]
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CommentLikeResponse>> {
    let t = services::toggle_like(&state, &who, id).await?;
    Ok(Json(CommentLikeResponse {
        success: true,
        is_liked: t.is_liked,
        likes_count: t.likes_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{identity::fixtures::user, recipes::repo_types::fixtures::recipe};

    #[tokio::test]
    async fn count_only_returns_split_counts() {
        let state = AppState::fake();
        let r = recipe("Bún chả", vec![]);
        state.store.insert_recipe(&r).await.unwrap();
        let who = user("lan@example.com");
        let top = services::post(&state, &who, r.id, "ngon", None).await.unwrap();
        services::post(&state, &who, r.id, "chuẩn", Some(top.comment.id))
            .await
            .unwrap();

        let q = ListCommentsQuery { count_only: true };
        let Json(res) = list_comments(State(state.clone()), MaybeAuthUser(None), Path(r.id), Query(q))
            .await
            .unwrap();
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["commentsCount"], 1);
        assert_eq!(json["repliesCount"], 1);

        let Json(res) = list_comments(
            State(state),
            MaybeAuthUser(None),
            Path(r.id),
            Query(ListCommentsQuery::default()),
        )
        .await
        .unwrap();
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["totalCount"], 2);
        assert_eq!(json["comments"][0]["replies"][0]["content"], "chuẩn");
    }

    #[tokio::test]
    async fn post_returns_created() {
        let state = AppState::fake();
        let r = recipe("Bún chả", vec![]);
        state.store.insert_recipe(&r).await.unwrap();
        let body = PostCommentRequest {
            content: "ngon".into(),
            parent_id: None,
        };
        let (status, Json(env)) = post_comment(State(state), AuthUser(user("a@example.com")), Path(r.id), Json(body))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(env.comment.comment.user_name, "a");
    }
}
