use async_trait::async_trait;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use crate::db::parse_id;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::handlers::AppState;
use crate::models::{PaymentIntentRequest, PaymentIntentResponse};

pub const CURRENCY: &str = "usd";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    InvalidAmount(String),
    #[error("payment processor unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payment processor rejected request: {0}")]
    Processor(String),
}

/// Converts a price in major units to the processor's minor units.
pub fn amount_in_cents(price: f64) -> Result<i64, PaymentError> {
    let cents = (price * 100.0).round();
    if !cents.is_finite() || cents <= 0.0 || cents > i64::MAX as f64 {
        return Err(PaymentError::InvalidAmount(format!("Invalid payment amount: {}", price)));
    }
    Ok(cents as i64)
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent and returns its client secret.
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        offer_id: Option<&str>,
    ) -> Result<String, PaymentError>;
}

pub struct StripeGateway {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct IntentBody {
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        offer_id: Option<&str>,
    ) -> Result<String, PaymentError> {
        if self.secret_key.is_empty() {
            return Err(PaymentError::Processor("no secret key configured".to_string()));
        }

        let mut form = vec![
            ("amount", amount_cents.to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];
        if let Some(offer_id) = offer_id {
            form.push(("metadata[offerId]", offer_id.to_string()));
        }

        log::info!("Creating payment intent for {} {} minor units", amount_cents, currency);
        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| status.to_string());
            return Err(PaymentError::Processor(detail));
        }

        response
            .json::<IntentBody>()
            .await?
            .client_secret
            .ok_or_else(|| PaymentError::Processor("response carried no client secret".to_string()))
    }
}

/// Starts a card payment for an offer and hands the client secret back to the
/// browser. The offer id, when given, is attached as processor metadata so a
/// captured payment can be matched to its offer later.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PaymentIntentRequest>,
) -> ApiResult<Json<PaymentIntentResponse>> {
    let amount = amount_in_cents(request.price)?;
    if let Some(offer_id) = request.offer_id.as_deref() {
        parse_id(offer_id)?;
    }
    let client_secret = state
        .payments
        .create_payment_intent(amount, CURRENCY, request.offer_id.as_deref())
        .await?;
    Ok(Json(PaymentIntentResponse { client_secret }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_minor_units() {
        assert_eq!(amount_in_cents(150000.0).unwrap(), 15_000_000);
        assert_eq!(amount_in_cents(19.99).unwrap(), 1999);
    }

    #[test]
    fn rejects_non_positive_and_non_finite() {
        for price in [0.0, -5.0, f64::NAN, f64::INFINITY, 0.001] {
            assert!(matches!(amount_in_cents(price), Err(PaymentError::InvalidAmount(_))));
        }
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let gateway = StripeGateway::new("http://127.0.0.1:9", "");
        let err = gateway.create_payment_intent(100, CURRENCY, None).await.unwrap_err();
        assert!(matches!(err, PaymentError::Processor(_)));
    }
}
