mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use std::sync::Arc;

use estatenest_backend::db::OfflineStore;

use common::TestApp;

#[tokio::test]
async fn liveness_answers() {
    let app = TestApp::new();
    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Real estate server is running"));
}

#[tokio::test]
async fn created_property_starts_pending() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/property",
            json!({
                "property_title": "Villa",
                "property_location": "Banani",
                "price_range": "$100000 - 200000",
                "agent_name": "Nadia",
                "agent_email": "nadia@estatenest.io",
                "verification_status": "Verified",
                "bedrooms": 5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acknowledged"], json!(true));
    let id = body["insertedId"].as_str().unwrap();

    let (status, property) = app.get(&format!("/property/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(property["_id"], json!(id));
    assert_eq!(property["verification_status"], json!("Pending"));
    assert_eq!(property["bedrooms"], json!(5));
    assert_eq!(property["price_range"], json!("$100000 - 200000"));
}

#[tokio::test]
async fn malformed_price_range_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/property",
            json!({
                "property_title": "Shack",
                "property_location": "Nowhere",
                "price_range": "cheap",
                "agent_name": "Nadia",
                "agent_email": "nadia@estatenest.io",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("price range"));

    let (_, all) = app.get("/property").await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn missing_required_field_never_reaches_storage() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/property", json!({ "property_title": "Half a listing" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("property_location"));
    let (_, all) = app.get("/property").await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn listing_filters_by_status_and_agent() {
    let app = TestApp::new();
    let villa = app.create_property("Villa", "$100000 - 200000").await;
    app.create_property("Flat", "$50000 - 60000").await;

    let (status, _) = app
        .patch(&format!("/property/{villa}"), json!({ "verification_status": "Verified" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, all) = app.get("/property").await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, verified) = app.get("/property?verification_status=Verified").await;
    let verified = verified.as_array().unwrap();
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0]["property_title"], json!("Villa"));

    let (_, by_agent) = app.get("/property/agent/nadia@estatenest.io").await;
    assert_eq!(by_agent.as_array().unwrap().len(), 2);
    let (_, by_other) = app.get("/property/agent/someone@else.io").await;
    assert_eq!(by_other, json!([]));
}

#[tokio::test]
async fn patch_merges_fields() {
    let app = TestApp::new();
    let id = app.create_property("Villa", "$100000 - 200000").await;

    let (status, outcome) = app
        .patch(&format!("/property/{id}"), json!({ "description": "Renovated", "parking": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, json!({ "matchedCount": 1, "modifiedCount": 1 }));

    let (_, property) = app.get(&format!("/property/{id}")).await;
    assert_eq!(property["description"], json!("Renovated"));
    assert_eq!(property["parking"], json!(true));
    assert_eq!(property["property_title"], json!("Villa"));
}

#[tokio::test]
async fn patch_validates_input() {
    let app = TestApp::new();
    let id = app.create_property("Villa", "$100000 - 200000").await;

    let (status, body) = app.patch("/property/not-an-id", json!({ "description": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid id format"));

    let (status, _) = app
        .patch(&format!("/property/{id}"), json!({ "verification_status": "Maybe" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.patch(&format!("/property/{id}"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch("/property/65f1c2a9e4b0a1b2c3d4e5f6", json!({ "description": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_and_reports_missing() {
    let app = TestApp::new();
    let id = app.create_property("Villa", "$100000 - 200000").await;

    let (status, body) = app.delete("/property/65f1c2a9e4b0a1b2c3d4e5f6").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Property not found"));

    let (status, body) = app.delete(&format!("/property/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deletedCount": 1 }));

    let (status, _) = app.get(&format!("/property/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/property/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_status_filter_is_a_json_400() {
    let app = TestApp::new();
    let (status, body) = app.get("/property?verification_status=Maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");
}

#[tokio::test]
async fn unparsable_body_is_a_json_400() {
    let app = TestApp::new();
    let (status, body) = app.post_raw("/property", "{ not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");
}

#[tokio::test]
async fn unreachable_database_answers_500_and_keeps_serving() {
    let app = TestApp::with_store(Arc::new(OfflineStore::new("no route to cluster")));

    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Real estate server is running"));

    let (status, body) = app.get("/property").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Internal server error" }));
}
