use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;

use crate::db::{parse_id, Collection, Document, Filter, FindOptions, StoreError, Update, UpdateOutcome};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::handlers::AppState;
use crate::models::{
    require_non_empty, to_document, InsertResponse, NewOffer, OfferStatus, OfferStatusUpdate,
    PriceRange, RejectOthers, TotalSoldAmount,
};

fn status_set(status: OfferStatus) -> Document {
    let mut set = Document::new();
    set.insert("status".to_string(), Value::from(status.as_str()));
    set
}

/// Every offer on `property_id` other than `keep`.
fn competing_offers(property_id: &str, keep: mongodb::bson::oid::ObjectId) -> Filter {
    Filter::eq("propertyId", property_id).and(Filter::NotId(keep))
}

/// Records a buyer's offer after checking it against the listing's price range.
pub async fn create_offer(
    State(state): State<AppState>,
    ApiJson(offer): ApiJson<NewOffer>,
) -> ApiResult<Json<InsertResponse>> {
    require_non_empty("buyerEmail", &offer.buyer_email)?;
    require_non_empty("agentEmail", &offer.agent_email)?;
    if !offer.offer_amount.is_finite() {
        return Err(ApiError::bad_request("offerAmount must be a finite number"));
    }

    let property = state
        .store
        .find_one(Collection::Property, Filter::id(&offer.property_id)?)
        .await?
        .ok_or_else(|| ApiError::not_found("Property not found"))?;

    let range = property
        .get("price_range")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Serialization(format!("property {} has no price_range", offer.property_id)))?
        .parse::<PriceRange>()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    if !range.contains(offer.offer_amount) {
        return Err(ApiError::bad_request(format!(
            "Offer amount must be between {} and {}",
            range.min, range.max
        )));
    }

    let mut doc = to_document(&offer, &["status", "transactionId"])?;
    doc.insert("status".to_string(), Value::from(OfferStatus::Pending.as_str()));

    log::info!(
        "Creating offer of {} on property {} by {}",
        offer.offer_amount,
        offer.property_id,
        offer.buyer_email
    );
    let id = state.store.insert_one(Collection::Offers, doc).await?;
    Ok(Json(InsertResponse::new(id)))
}

pub async fn list_agent_offers(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let offers = state
        .store
        .find(
            Collection::Offers,
            Filter::eq("agentEmail", email),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(offers))
}

pub async fn list_buyer_offers(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let offers = state
        .store
        .find(
            Collection::Offers,
            Filter::eq("buyerEmail", email),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(offers))
}

/// Moves an offer to a new status.
///
/// Accepting rejects every competing offer on the same property in the same
/// atomic batch. Marking an offer bought requires the payment transaction id.
pub async fn update_offer_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<OfferStatusUpdate>,
) -> ApiResult<Json<UpdateOutcome>> {
    let offer_id = parse_id(&id)?;
    let mut set = status_set(update.status);
    match (update.status, update.transaction_id) {
        (OfferStatus::Bought, Some(transaction_id)) if !transaction_id.trim().is_empty() => {
            set.insert("transactionId".to_string(), Value::from(transaction_id));
        }
        (OfferStatus::Bought, _) => {
            return Err(ApiError::bad_request("transactionId is required for Bought"));
        }
        (_, Some(transaction_id)) => {
            set.insert("transactionId".to_string(), Value::from(transaction_id));
        }
        (_, None) => {}
    }

    log::info!("Setting offer {} to {}", id, update.status.as_str());
    let outcome = if update.status == OfferStatus::Accepted {
        let offer = state
            .store
            .find_one(Collection::Offers, Filter::Id(offer_id))
            .await?
            .ok_or_else(|| ApiError::not_found("Offer not found"))?;
        let property_id = offer
            .get("propertyId")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Serialization(format!("offer {} has no propertyId", id)))?;

        let outcomes = state
            .store
            .apply_batch(
                Collection::Offers,
                vec![
                    Update::one(Filter::Id(offer_id), set),
                    Update::many(
                        competing_offers(property_id, offer_id),
                        status_set(OfferStatus::Rejected),
                    ),
                ],
            )
            .await?;
        if let Some(rejected) = outcomes.get(1) {
            log::info!("Rejected {} competing offers on {}", rejected.modified_count, property_id);
        }
        outcomes.into_iter().next().unwrap_or_default()
    } else {
        state
            .store
            .update_one(Collection::Offers, Filter::Id(offer_id), set)
            .await?
    };

    if outcome.matched_count == 0 {
        return Err(ApiError::not_found("Offer not found"));
    }
    Ok(Json(outcome))
}

pub async fn reject_others(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RejectOthers>,
) -> ApiResult<Json<UpdateOutcome>> {
    let keep = parse_id(&request.offer_id)?;
    require_non_empty("propertyId", &request.property_id)?;
    let outcome = state
        .store
        .update_many(
            Collection::Offers,
            competing_offers(&request.property_id, keep),
            status_set(OfferStatus::Rejected),
        )
        .await?;
    log::info!(
        "Rejected {} offers on {} other than {}",
        outcome.modified_count,
        request.property_id,
        request.offer_id
    );
    Ok(Json(outcome))
}

fn sold_by(email: String) -> Filter {
    Filter::eq("agentEmail", email).and(Filter::eq("status", OfferStatus::Bought.as_str()))
}

pub async fn sold_properties(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let sold = state
        .store
        .find(Collection::Offers, sold_by(email), FindOptions::default())
        .await?;
    Ok(Json(sold))
}

pub async fn total_sold_amount(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<TotalSoldAmount>> {
    let sold = state
        .store
        .find(Collection::Offers, sold_by(email.clone()), FindOptions::default())
        .await?;
    let total_sold_amount = sold
        .iter()
        .filter_map(|offer| offer.get("offerAmount").and_then(Value::as_f64))
        .sum();
    log::info!("Agent {} sold {} properties", email, sold.len());
    Ok(Json(TotalSoldAmount { total_sold_amount }))
}
