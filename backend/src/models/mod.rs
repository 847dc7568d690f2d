use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{Document, StoreError, ID_FIELD};
use crate::error::ApiError;

mod price;

pub use price::{PriceRange, PriceRangeError};

/// Moderation state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "Pending",
            VerificationStatus::Verified => "Verified",
            VerificationStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Bought,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "Pending",
            OfferStatus::Accepted => "Accepted",
            OfferStatus::Rejected => "Rejected",
            OfferStatus::Bought => "Bought",
        }
    }
}

/// User status marking a pending request to become an agent.
pub const STATUS_REQUESTED: &str = "Requested";

#[derive(Debug, Deserialize, Serialize)]
pub struct NewProperty {
    pub property_title: String,
    pub property_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price_range: String,
    pub agent_name: String,
    pub agent_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_image: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Debug, Deserialize)]
pub struct PropertyQuery {
    pub verification_status: Option<VerificationStatus>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UserUpsert {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Debug, Serialize)]
pub struct UserRole {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWishlistItem {
    pub property_id: String,
    pub user_email: String,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub review: String,
    pub user_email: String,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    pub property_id: String,
    pub offer_amount: f64,
    pub buyer_email: String,
    pub agent_email: String,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferStatusUpdate {
    pub status: OfferStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectOthers {
    pub offer_id: String,
    pub property_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    pub price: f64,
    #[serde(default)]
    pub offer_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertResponse {
    pub fn new(inserted_id: String) -> Self {
        Self { acknowledged: true, inserted_id }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSoldAmount {
    pub total_sold_amount: f64,
}

/// Serializes a request schema into a storable document, dropping fields the
/// server owns.
pub fn to_document<T: Serialize>(value: &T, server_owned: &[&str]) -> Result<Document, ApiError> {
    let mut doc = match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(ApiError::bad_request("Expected a JSON object")),
        Err(e) => return Err(StoreError::Serialization(e.to_string()).into()),
    };
    doc.remove(ID_FIELD);
    for field in server_owned {
        doc.remove(*field);
    }
    Ok(doc)
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_property_keeps_unknown_fields() {
        let body = json!({
            "property_title": "Villa",
            "property_location": "Dhaka",
            "price_range": "$100000 - 200000",
            "agent_name": "Rafi",
            "agent_email": "rafi@estate.io",
            "bedrooms": 4,
            "verification_status": "Verified",
            "_id": "65f1c2a9e4b0a1b2c3d4e5f6",
        });
        let property: NewProperty = serde_json::from_value(body).unwrap();
        let doc = to_document(&property, &["verification_status"]).unwrap();

        assert_eq!(doc["bedrooms"], json!(4));
        assert!(!doc.contains_key("verification_status"));
        assert!(!doc.contains_key("_id"));
        assert!(!doc.contains_key("description"));
    }

    #[test]
    fn offer_status_uses_pascal_case() {
        let update: OfferStatusUpdate =
            serde_json::from_value(json!({"status": "Bought", "transactionId": "pi_1"})).unwrap();
        assert_eq!(update.status, OfferStatus::Bought);
        assert_eq!(update.transaction_id.as_deref(), Some("pi_1"));
        assert!(serde_json::from_value::<OfferStatusUpdate>(json!({"status": "bought"})).is_err());
    }

    #[test]
    fn empty_strings_are_rejected() {
        assert!(require_non_empty("email", "  ").is_err());
        assert!(require_non_empty("email", "a@b.c").is_ok());
    }
}
