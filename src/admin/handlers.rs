use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::maintenance::{self, ReconcileReport};
use crate::{
    error::{AppError, AppResult},
    identity::{repo_types::User, AuthUser, Identity},
    recipes::dto::Ack,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", patch(set_locked).delete(delete_user))
        .route("/admin/maintenance/reconcile", post(reconcile))
}

fn require_admin(who: &Identity) -> AppResult<()> {
    if who.is_admin() {
        Ok(())
    } else {
        warn!(user_id = %who.user_id, "admin route refused");
        Err(AppError::forbidden("admin only"))
    }
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub success: bool,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ReconcileReport,
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>, AuthUser(who): AuthUser) -> AppResult<Json<UserList>> {
    require_admin(&who)?;
    let users = state.store.list_users().await?;
    Ok(Json(UserList { success: true, users }))
}

#[instrument(skip(state))]
pub async fn set_locked(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<LockRequest>,
) -> AppResult<Json<UserEnvelope>> {
    require_admin(&who)?;
    let target = state
        .store
        .find_user(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    if body.locked && state.config.is_admin_email(&target.email) {
        return Err(AppError::forbidden("the admin account cannot be locked"));
    }
    let user = state
        .store
        .set_user_locked(id, body.locked)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    info!(user_id = %id, locked = body.locked, "user lock changed");
    Ok(Json(UserEnvelope { success: true, user }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    require_admin(&who)?;
    let target = state
        .store
        .find_user(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    if state.config.is_admin_email(&target.email) {
        warn!(user_id = %id, "attempt to delete admin account");
        return Err(AppError::forbidden("the admin account cannot be deleted"));
    }
    if !state.store.delete_user(id).await? {
        return Err(AppError::NotFound("user"));
    }
    info!(user_id = %id, "user deleted");
    Ok(Json(Ack { success: true }))
}

#[instrument(skip(state))]
pub async fn reconcile(State(state): State<AppState>, AuthUser(who): AuthUser) -> AppResult<Json<ReconcileResponse>> {
    let report = maintenance::reconcile(&state, &who).await?;
    Ok(Json(ReconcileResponse { success: true, report }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fixtures::{admin, user};

    #[tokio::test]
    async fn non_admins_are_refused() {
        let state = AppState::fake();
        let res = list_users(State(state), AuthUser(user("a@example.com"))).await;
        assert!(matches!(res, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn admin_account_is_undeletable() {
        let state = AppState::fake();
        let boss = admin();
        state.store.ensure_user(boss.user_id, &boss.email, None).await.unwrap();

        let res = delete_user(State(state.clone()), AuthUser(boss.clone()), Path(boss.user_id)).await;
        assert!(matches!(res, Err(AppError::Forbidden(_))));
        assert!(state.store.find_user(boss.user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn lock_unlock_and_delete_regular_user() {
        let state = AppState::fake();
        let cook = user("cook@example.com");
        state.store.ensure_user(cook.user_id, &cook.email, None).await.unwrap();

        let Json(env) = set_locked(
            State(state.clone()),
            AuthUser(admin()),
            Path(cook.user_id),
            Json(LockRequest { locked: true }),
        )
        .await
        .unwrap();
        assert!(env.user.locked);

        let Json(list) = list_users(State(state.clone()), AuthUser(admin())).await.unwrap();
        assert_eq!(list.users.len(), 1);

        delete_user(State(state.clone()), AuthUser(admin()), Path(cook.user_id))
            .await
            .unwrap();
        assert!(matches!(
            delete_user(State(state), AuthUser(admin()), Path(cook.user_id)).await,
            Err(AppError::NotFound("user"))
        ));
    }
}
