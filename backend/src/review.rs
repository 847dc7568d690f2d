use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;

use crate::db::{parse_id, Collection, Document, Filter, FindOptions};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::handlers::AppState;
use crate::models::{require_non_empty, to_document, DeleteResponse, InsertResponse, NewReview};

const LATEST_REVIEWS: u64 = 4;

/// Appends a review. The property id always comes from the path.
pub async fn add_review(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
    ApiJson(review): ApiJson<NewReview>,
) -> ApiResult<Json<InsertResponse>> {
    parse_id(&property_id)?;
    require_non_empty("review", &review.review)?;
    require_non_empty("userEmail", &review.user_email)?;

    let mut doc = to_document(&review, &["propertyId", "createdAt"])?;
    doc.insert("propertyId".to_string(), Value::from(property_id.as_str()));
    doc.insert(
        "createdAt".to_string(),
        Value::from(chrono::Utc::now().to_rfc3339()),
    );

    let id = state.store.insert_one(Collection::Reviews, doc).await?;
    log::info!("{} reviewed property {}", review.user_email, property_id);
    Ok(Json(InsertResponse::new(id)))
}

pub async fn list_property_reviews(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let reviews = state
        .store
        .find(
            Collection::Reviews,
            Filter::eq("propertyId", property_id),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(reviews))
}

pub async fn list_user_reviews(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let reviews = state
        .store
        .find(
            Collection::Reviews,
            Filter::eq("userEmail", email),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(reviews))
}

/// The most recent reviews across every property, newest first.
pub async fn latest_reviews(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let reviews = state
        .store
        .find(
            Collection::Reviews,
            Filter::All,
            FindOptions::newest_first(LATEST_REVIEWS),
        )
        .await?;
    Ok(Json(reviews))
}

/// `DELETE /property/:id/reviews`, where `:id` names the review itself.
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let filter = Filter::id(&id)?;
    let deleted_count = state.store.delete_one(Collection::Reviews, filter).await?;
    if deleted_count == 0 {
        return Err(ApiError::not_found("Review not found"));
    }
    log::info!("Deleted review {}", id);
    Ok(Json(DeleteResponse { deleted_count }))
}
