mod common;

use axum::http::StatusCode;
use common::{bearer, car_body, property_body, read_json, test_app};
use http_helpers::{authed_json_request, get};
use luxe_authz::Role;
use tower::ServiceExt;

async fn seed(app: &common::App, uri: &str, body: serde_json::Value) -> String {
    let response = app
        .clone()
        .oneshot(authed_json_request("POST", uri, &bearer(Role::Admin), body))
        .await
        .expect("seed");
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await["item"]["id"]
        .as_str()
        .expect("id")
        .to_string()
}

fn titles(payload: &serde_json::Value) -> Vec<String> {
    payload["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|item| item["title"].as_str().expect("title").to_string())
        .collect()
}

#[tokio::test]
async fn cards_list_featured_first_then_newest() {
    let app = test_app().app;
    seed(&app, "/api/properties", property_body("Old Farmhouse")).await;
    let mut featured = property_body("Banana Island Mansion");
    featured["featured"] = true.into();
    seed(&app, "/api/properties", featured).await;
    seed(&app, "/api/properties", property_body("New Duplex")).await;

    let response = app
        .clone()
        .oneshot(get("/api/public/properties"))
        .await
        .expect("public list");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(
        titles(&payload),
        ["Banana Island Mansion", "New Duplex", "Old Farmhouse"]
    );

    let card = &payload["items"][0];
    assert_eq!(card["price"], "₦250,000,000");
    assert_eq!(card["bedBath"], "4/5");
    assert_eq!(
        card["image"],
        "https://res.cloudinary.com/demo/image/upload/v1/tonyluxe/seaside.jpg"
    );
    assert!(card.get("description").is_none());

    let admin = read_json(
        app.clone()
            .oneshot(get("/api/properties"))
            .await
            .expect("admin list"),
    )
    .await;
    assert_eq!(
        titles(&admin),
        ["New Duplex", "Banana Island Mansion", "Old Farmhouse"]
    );
}

#[tokio::test]
async fn property_tabs_select_status_or_short_let() {
    let app = test_app().app;
    seed(&app, "/api/properties", property_body("Sale House")).await;
    let mut rental = property_body("Rental Flat");
    rental["status"] = "For Rent".into();
    seed(&app, "/api/properties", rental).await;
    let mut short_let = property_body("Weekend Loft");
    short_let["propertyType"] = "Short Let".into();
    short_let["status"] = "Available".into();
    seed(&app, "/api/properties", short_let).await;

    for (tab, expected) in [
        ("Buy", vec!["Sale House"]),
        ("Rent", vec!["Rental Flat"]),
        ("Airbnb", vec!["Weekend Loft"]),
        ("Castle", vec!["Weekend Loft", "Rental Flat", "Sale House"]),
    ] {
        let payload = read_json(
            app.clone()
                .oneshot(get(&format!("/api/public/properties?propertyType={tab}")))
                .await
                .expect("tab"),
        )
        .await;
        assert_eq!(titles(&payload), expected, "{tab}");
    }

    let payload = read_json(
        app.clone()
            .oneshot(get("/api/public/properties?propertyType=Rent"))
            .await
            .expect("rent"),
    )
    .await;
    assert_eq!(payload["items"][0]["price"], "₦250,000,000/yr");
}

#[tokio::test]
async fn detail_views_carry_formatted_fields() {
    let app = test_app().app;
    let property_id = seed(&app, "/api/properties", property_body("Seaside Villa")).await;
    let mut car = car_body("Land Cruiser", 85_000);
    car["currency"] = "USD".into();
    let car_id = seed(&app, "/api/cars", car).await;

    let payload = read_json(
        app.clone()
            .oneshot(get(&format!("/api/public/properties/{property_id}")))
            .await
            .expect("property detail"),
    )
    .await;
    let item = &payload["item"];
    assert_eq!(item["id"], property_id.as_str());
    assert_eq!(item["formattedPrice"], "₦250,000,000");
    assert_eq!(item["bedBath"], "4/5");
    assert_eq!(item["size"], 3200);
    assert_eq!(item["description"], "Ocean-view home with private beach access");

    let payload = read_json(
        app.clone()
            .oneshot(get(&format!("/api/public/cars/{car_id}")))
            .await
            .expect("car detail"),
    )
    .await;
    assert_eq!(payload["item"]["formattedPrice"], "$85,000");
    assert_eq!(payload["item"]["make"], "Toyota");

    let payload = read_json(
        app.clone()
            .oneshot(get("/api/public/cars"))
            .await
            .expect("car cards"),
    )
    .await;
    let card = &payload["items"][0];
    assert_eq!(card["location"], "Abuja");
    assert_eq!(card["bedBath"], "Toyota/Land Cruiser");
}

#[tokio::test]
async fn public_details_answer_404_for_unknown_ids() {
    let app = test_app().app;
    for uri in [
        "/api/public/properties/6f1c2a7e-7a43-4a8e-9d3c-0e6b8f1a2b3c",
        "/api/public/cars/definitely-not-an-id",
    ] {
        let response = app.clone().oneshot(get(uri)).await.expect("detail");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(read_json(response).await["code"], "not_found");
    }
}

#[tokio::test]
async fn public_lists_use_card_page_size() {
    let app = test_app().app;
    for index in 0..14 {
        seed(&app, "/api/cars", car_body(&format!("Car {index}"), 1_000_000)).await;
    }
    let payload = read_json(
        app.clone()
            .oneshot(get("/api/public/cars"))
            .await
            .expect("cards"),
    )
    .await;
    assert_eq!(payload["items"].as_array().expect("items").len(), 12);
    assert_eq!(payload["pagination"]["total"], 14);
    assert_eq!(payload["pagination"]["pages"], 2);
}
