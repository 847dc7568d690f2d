//! Shared harness: the real router over an in-memory store and a fake
//! payment processor.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use estatenest_backend::db::{DocumentStore, MemoryStore};
use estatenest_backend::handlers::{router, AppState};
use estatenest_backend::payment::{PaymentError, PaymentGateway};

#[derive(Debug, Clone, PartialEq)]
pub struct IntentCall {
    pub amount_cents: i64,
    pub currency: String,
    pub offer_id: Option<String>,
}

#[derive(Default)]
pub struct FakeGateway {
    pub calls: Mutex<Vec<IntentCall>>,
    pub fail: bool,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        offer_id: Option<&str>,
    ) -> Result<String, PaymentError> {
        if self.fail {
            return Err(PaymentError::Processor("card_declined".to_string()));
        }
        self.calls.lock().unwrap().push(IntentCall {
            amount_cents,
            currency: currency.to_string(),
            offer_id: offer_id.map(str::to_string),
        });
        Ok(format!("pi_test_{}_secret", amount_cents))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_gateway(FakeGateway::default())
    }

    pub fn with_gateway(gateway: FakeGateway) -> Self {
        Self::with_parts(Arc::new(MemoryStore::new()), gateway)
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_parts(store, FakeGateway::default())
    }

    fn with_parts(store: Arc<dyn DocumentStore>, gateway: FakeGateway) -> Self {
        let gateway = Arc::new(gateway);
        let router = router(AppState::new(store.clone(), gateway.clone()));
        Self { router, store, gateway }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Posts a body verbatim, for payloads that are not valid JSON.
    pub async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Lists a property and returns its id.
    pub async fn create_property(&self, title: &str, price_range: &str) -> String {
        let (status, body) = self
            .post(
                "/property",
                json!({
                    "property_title": title,
                    "property_location": "Gulshan, Dhaka",
                    "description": "Three floors and a garden",
                    "price_range": price_range,
                    "agent_name": "Nadia Rahman",
                    "agent_email": "nadia@estatenest.io",
                    "agent_image": "https://img.example/nadia.png",
                    "property_image": "https://img.example/villa.png",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["insertedId"].as_str().unwrap().to_string()
    }

    /// Places an offer and returns its id.
    pub async fn create_offer(&self, property_id: &str, buyer: &str, amount: f64) -> String {
        let (status, body) = self
            .post(
                "/offers",
                json!({
                    "propertyId": property_id,
                    "offerAmount": amount,
                    "buyerEmail": buyer,
                    "buyerName": "Buyer",
                    "agentEmail": "nadia@estatenest.io",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["insertedId"].as_str().unwrap().to_string()
    }
}
