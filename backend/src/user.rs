use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::db::{Collection, Document, Filter, FindOptions, UpdateOutcome, ID_FIELD};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::handlers::AppState;
use crate::models::{require_non_empty, to_document, InsertResponse, UserRole, UserUpsert, STATUS_REQUESTED};

const DEFAULT_ROLE: &str = "user";

fn now_millis() -> Value {
    Value::from(chrono::Utc::now().timestamp_millis())
}

/// Login-time upsert keyed by email.
///
/// A new email is inserted with a write timestamp. A known email asking for
/// `status: "Requested"` only has its status changed. Anything else is a
/// login ping and gets the stored record back untouched.
pub async fn upsert_user(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<UserUpsert>,
) -> ApiResult<Response> {
    require_non_empty("email", &user.email)?;
    let by_email = Filter::eq("email", user.email.as_str());

    let Some(existing) = state.store.find_one(Collection::Users, by_email.clone()).await? else {
        let mut doc = to_document(&user, &["timestamp"])?;
        doc.insert("timestamp".to_string(), now_millis());
        let id = state.store.insert_one(Collection::Users, doc).await?;
        log::info!("Registered user {} as {}", user.email, id);
        return Ok(Json(InsertResponse::new(id)).into_response());
    };

    if user.status.as_deref() == Some(STATUS_REQUESTED) {
        let mut set = Document::new();
        set.insert("status".to_string(), Value::from(STATUS_REQUESTED));
        let outcome = state.store.update_one(Collection::Users, by_email, set).await?;
        log::info!("User {} requested a role change", user.email);
        return Ok(Json(outcome).into_response());
    }

    log::info!("User {} already exists", user.email);
    Ok(Json(existing).into_response())
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Document>> {
    state
        .store
        .find_one(Collection::Users, Filter::eq("email", email))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let users = state
        .store
        .find(Collection::Users, Filter::All, FindOptions::default())
        .await?;
    log::info!("Fetched {} users", users.len());
    Ok(Json(users))
}

pub async fn get_user_role(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<UserRole>> {
    let user = state
        .store
        .find_one(Collection::Users, Filter::eq("email", email.as_str()))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let role = user
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ROLE)
        .to_string();
    Ok(Json(UserRole { email, role }))
}

/// Unconditional merge, used by admins to change roles and statuses.
pub async fn update_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    ApiJson(mut changes): ApiJson<Document>,
) -> ApiResult<Json<UpdateOutcome>> {
    changes.remove(ID_FIELD);
    changes.remove("email");
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    changes.insert("timestamp".to_string(), now_millis());

    log::info!("Updating user {} ({} fields)", email, changes.len());
    let outcome = state
        .store
        .update_one(Collection::Users, Filter::eq("email", email), changes)
        .await?;
    if outcome.matched_count == 0 {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(outcome))
}
