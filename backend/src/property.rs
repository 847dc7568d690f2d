use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;

use crate::db::{Collection, Document, Filter, FindOptions, UpdateOutcome, ID_FIELD};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::handlers::AppState;
use crate::models::{
    require_non_empty, to_document, DeleteResponse, InsertResponse, NewProperty, PriceRange,
    PropertyQuery, VerificationStatus,
};

const STATUS_FIELD: &str = "verification_status";

/// Fetches every listing, optionally narrowed to one verification status.
pub async fn list_properties(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PropertyQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = match query.verification_status {
        Some(status) => Filter::eq(STATUS_FIELD, status.as_str()),
        None => Filter::All,
    };
    log::info!("Fetching properties ({:?})", query.verification_status);
    let properties = state
        .store
        .find(Collection::Property, filter, FindOptions::default())
        .await?;
    log::info!("Fetched {} properties", properties.len());
    Ok(Json(properties))
}

pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Document>> {
    let filter = Filter::id(&id)?;
    log::info!("Fetching property with ID: {}", id);
    state
        .store
        .find_one(Collection::Property, filter)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Property not found"))
}

pub async fn list_agent_properties(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    log::info!("Fetching properties listed by {}", email);
    let properties = state
        .store
        .find(
            Collection::Property,
            Filter::eq("agent_email", email),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(properties))
}

/// Stores a new listing. Moderation always starts at `Pending`.
pub async fn create_property(
    State(state): State<AppState>,
    ApiJson(property): ApiJson<NewProperty>,
) -> ApiResult<Json<InsertResponse>> {
    require_non_empty("property_title", &property.property_title)?;
    require_non_empty("agent_email", &property.agent_email)?;
    property
        .price_range
        .parse::<PriceRange>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let mut doc = to_document(&property, &[STATUS_FIELD])?;
    doc.insert(
        STATUS_FIELD.to_string(),
        Value::from(VerificationStatus::default().as_str()),
    );

    log::info!("Creating property {:?} for agent {}", property.property_title, property.agent_email);
    let id = state.store.insert_one(Collection::Property, doc).await?;
    log::info!("Created property {}", id);
    Ok(Json(InsertResponse::new(id)))
}

/// Merges the body into the stored listing.
pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(mut changes): ApiJson<Document>,
) -> ApiResult<Json<UpdateOutcome>> {
    let filter = Filter::id(&id)?;
    changes.remove(ID_FIELD);
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if let Some(status) = changes.get(STATUS_FIELD) {
        serde_json::from_value::<VerificationStatus>(status.clone())
            .map_err(|_| ApiError::bad_request("Invalid verification_status"))?;
    }
    if let Some(range) = changes.get("price_range") {
        range
            .as_str()
            .ok_or_else(|| ApiError::bad_request("price_range must be a string"))?
            .parse::<PriceRange>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
    }

    log::info!("Updating property {} ({} fields)", id, changes.len());
    let outcome = state
        .store
        .update_one(Collection::Property, filter, changes)
        .await?;
    if outcome.matched_count == 0 {
        return Err(ApiError::not_found("Property not found"));
    }
    Ok(Json(outcome))
}

pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let filter = Filter::id(&id)?;
    log::info!("Deleting property {}", id);
    let deleted_count = state.store.delete_one(Collection::Property, filter).await?;
    if deleted_count == 0 {
        return Err(ApiError::not_found("Property not found"));
    }
    Ok(Json(DeleteResponse { deleted_count }))
}
