//! Work item API endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use entities::WorkItem;
use tracing::{info, warn};
use work_protocol::{ErrorBody, WorkMutation};

use crate::config::OwnershipPolicy;
use crate::error::{ServerError, ServerResult};
use crate::middleware::AuthenticatedUser;
use crate::state::{AppState, SharedState};

/// Body extractor that turns JSON rejections into 400 responses.
type JsonBody<T> = WithRejection<Json<T>, ServerError>;

/// Lists the caller's work items.
#[utoipa::path(
    get,
    path = "/api",
    tag = "works",
    responses(
        (status = 200, description = "Work items of the caller, oldest first", body = [WorkItem]),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    security(("session_cookie" = []), ("bearer" = []))
)]
pub async fn list_works(
    State(state): State<SharedState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ServerResult<Json<Vec<WorkItem>>> {
    let items = state
        .store
        .list_by_owner(&user.id)
        .await
        .map_err(|e| state.store_failure(e))?;

    Ok(Json(items))
}

/// Creates a work item owned by the caller.
#[utoipa::path(
    post,
    path = "/api/add",
    tag = "works",
    request_body = WorkMutation,
    responses(
        (status = 201, description = "Work created", body = WorkItem),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    security(("session_cookie" = []), ("bearer" = []))
)]
pub async fn add_work(
    State(state): State<SharedState>,
    Extension(user): Extension<AuthenticatedUser>,
    WithRejection(Json(body), _): JsonBody<WorkMutation>,
) -> ServerResult<(StatusCode, Json<WorkItem>)> {
    let work = body.validate_create()?;

    let mut item = WorkItem::new(user.id, work.title, work.status, state.clock.now())
        .with_description(work.description);
    item.end_date = work.end_date;

    let item = state
        .store
        .create(item)
        .await
        .map_err(|e| state.store_failure(e))?;

    info!(work_id = %item.id, owner_id = %item.owner_id, "Created work item");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Applies a partial update to a work item.
#[utoipa::path(
    patch,
    path = "/api/update/{id}",
    tag = "works",
    params(("id" = String, Path, description = "Work item id")),
    request_body = WorkMutation,
    responses(
        (status = 200, description = "Work updated", body = WorkItem),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Work not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    security(("session_cookie" = []), ("bearer" = []))
)]
pub async fn update_work(
    State(state): State<SharedState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): JsonBody<WorkMutation>,
) -> ServerResult<Json<WorkItem>> {
    let patch = body.validate_patch()?;

    if !may_modify(&state, &user, &id).await? {
        return Err(work_not_found());
    }

    let item = state
        .store
        .update_by_id(&id, &patch)
        .await
        .map_err(|e| state.store_failure(e))?
        .ok_or_else(work_not_found)?;

    info!(work_id = %item.id, status = %item.status, "Updated work item");
    Ok(Json(item))
}

/// Deletes a work item. Always 204, whether or not a row was removed.
#[utoipa::path(
    delete,
    path = "/api/delete/{id}",
    tag = "works",
    params(("id" = String, Path, description = "Work item id")),
    responses(
        (status = 204, description = "Work deleted"),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    ),
    security(("session_cookie" = []), ("bearer" = []))
)]
pub async fn delete_work(
    State(state): State<SharedState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    if !may_modify(&state, &user, &id).await? {
        warn!(work_id = %id, user_id = %user.id, "Skipped delete of item not owned by caller");
        return Ok(StatusCode::NO_CONTENT);
    }

    let removed = state
        .store
        .delete_by_id(&id)
        .await
        .map_err(|e| state.store_failure(e))?;

    info!(work_id = %id, removed, "Deleted work item");
    Ok(StatusCode::NO_CONTENT)
}

fn work_not_found() -> ServerError {
    ServerError::NotFound("Work not found".to_string())
}

/// Applies the configured ownership policy to a by-id mutation.
async fn may_modify(state: &AppState, user: &AuthenticatedUser, id: &str) -> ServerResult<bool> {
    match state.config.ownership {
        OwnershipPolicy::Unscoped => Ok(true),
        OwnershipPolicy::Owner => {
            let item = state
                .store
                .get_by_id(id)
                .await
                .map_err(|e| state.store_failure(e))?;
            Ok(item.is_some_and(|item| item.is_owned_by(&user.id)))
        }
    }
}
