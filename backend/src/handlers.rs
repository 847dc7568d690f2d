use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::db::DocumentStore;
use crate::payment::{self, PaymentGateway};
use crate::{offer, property, review, user, wishlist};

/// Everything a handler needs, injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, payments: Arc<dyn PaymentGateway>) -> Self {
        Self { store, payments }
    }
}

/// Liveness check.
pub async fn root() -> &'static str {
    "Real estate server is running"
}

pub fn router(state: AppState) -> Router {
    let property_routes = Router::<AppState>::new()
        .route(
            "/property",
            get(property::list_properties).post(property::create_property),
        )
        .route(
            "/property/:id",
            get(property::get_property)
                .patch(property::update_property)
                .delete(property::delete_property),
        )
        .route("/property/agent/:email", get(property::list_agent_properties));

    let user_routes = Router::<AppState>::new()
        .route("/user", put(user::upsert_user))
        .route("/user/:email", get(user::get_user))
        .route("/users", get(user::list_users))
        .route("/users/:email", get(user::get_user_role))
        .route("/users/update/:email", patch(user::update_user));

    let wishlist_routes = Router::<AppState>::new()
        .route("/list", post(wishlist::add_item))
        .route(
            "/list/:key",
            get(wishlist::list_items).delete(wishlist::delete_item),
        );

    let review_routes = Router::<AppState>::new()
        .route(
            "/property/:id/reviews",
            get(review::list_property_reviews)
                .post(review::add_review)
                .delete(review::delete_review),
        )
        .route("/reviews/latest", get(review::latest_reviews))
        .route("/reviews/user/:email", get(review::list_user_reviews));

    let offer_routes = Router::<AppState>::new()
        .route("/offers", post(offer::create_offer))
        .route("/offers/rejectOthers", post(offer::reject_others))
        .route(
            "/offers/:key",
            get(offer::list_agent_offers).patch(offer::update_offer_status),
        )
        .route("/buyer/offers/:email", get(offer::list_buyer_offers))
        .route("/sold-properties/:email", get(offer::sold_properties))
        .route("/total-sold-amount/:email", get(offer::total_sold_amount))
        .route("/create-payment-intent", post(payment::create_payment_intent));

    Router::new()
        .route("/", get(root))
        .merge(property_routes)
        .merge(user_routes)
        .merge(wishlist_routes)
        .merge(review_routes)
        .merge(offer_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
