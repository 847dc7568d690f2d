use axum::extract::{Path, State};
use axum::Json;

use crate::db::{Collection, Document, Filter, FindOptions};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::handlers::AppState;
use crate::models::{require_non_empty, to_document, DeleteResponse, InsertResponse, NewWishlistItem};

// Duplicate (user, property) pairs are allowed.
pub async fn add_item(
    State(state): State<AppState>,
    ApiJson(item): ApiJson<NewWishlistItem>,
) -> ApiResult<Json<InsertResponse>> {
    require_non_empty("userEmail", &item.user_email)?;
    require_non_empty("propertyId", &item.property_id)?;
    let doc = to_document(&item, &[])?;
    let id = state.store.insert_one(Collection::Wishlist, doc).await?;
    log::info!("{} wishlisted property {}", item.user_email, item.property_id);
    Ok(Json(InsertResponse::new(id)))
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let items = state
        .store
        .find(
            Collection::Wishlist,
            Filter::eq("userEmail", email.as_str()),
            FindOptions::default(),
        )
        .await?;
    log::info!("Fetched {} wishlist items for {}", items.len(), email);
    Ok(Json(items))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let filter = Filter::id(&id)?;
    let deleted_count = state.store.delete_one(Collection::Wishlist, filter).await?;
    if deleted_count == 0 {
        return Err(ApiError::not_found("Wishlist item not found"));
    }
    log::info!("Removed wishlist item {}", id);
    Ok(Json(DeleteResponse { deleted_count }))
}
