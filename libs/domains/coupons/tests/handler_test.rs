//! Handler tests for the coupons domain

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_helpers::JwtClaims;
use chrono::{Duration, Utc};
use domain_coupons::*;
use domain_users::{InMemoryUserRepository, Role, User, UserRepository};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, body: Option<Value>, user: Option<&User>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let mut request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    if let Some(user) = user {
        request.extensions_mut().insert(JwtClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.full_name(),
            roles: user.role_names(),
            exp: i64::MAX,
            iat: 0,
            jti: "test".to_string(),
        });
    }
    request
}

fn coupon_json(code: &str) -> Value {
    let now = Utc::now();
    json!({
        "code": code,
        "state": "ACTIVE",
        "category": "GENERAL",
        "coupon_type": "FIXED",
        "minimum_order_amount": "30.00",
        "start_from": now - Duration::days(1),
        "end_at": now + Duration::days(10),
        "discount_fixed_amount": "12.50"
    })
}

async fn setup() -> (Router, User, User) {
    let users = Arc::new(InMemoryUserRepository::new());
    let mut seller = User::new("Sia".into(), "Seller".into(), "sia@shop.test", None, "h".into());
    seller.grant(Role::Seller);
    let seller = users.create(seller).await.unwrap();
    let buyer = users
        .create(User::new("Ben".into(), "Buyer".into(), "ben@shop.test", None, "h".into()))
        .await
        .unwrap();

    let service = CouponService::new(InMemoryCouponRepository::new(), users);
    (handlers::router(service), seller, buyer)
}

async fn create(app: &Router, seller: &User, code: &str) -> Coupon {
    let response = app
        .clone()
        .oneshot(request("POST", "/seller/coupons", Some(coupon_json(code)), Some(seller)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_create_and_list_coupons() {
    let (app, seller, _) = setup().await;
    let coupon = create(&app, &seller, "TAKE12").await;
    assert_eq!(coupon.state, CouponState::Active);

    let response = app
        .oneshot(request("GET", "/seller/coupons", None, Some(&seller)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let coupons: Vec<Coupon> = json_body(response.into_body()).await;
    assert_eq!(coupons.len(), 1);
    assert_eq!(coupons[0].id, coupon.id);
}

#[tokio::test]
async fn test_seller_routes_need_auth_and_role() {
    let (app, _, buyer) = setup().await;

    let response = app
        .clone()
        .oneshot(request("GET", "/seller/coupons", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request(
            "POST",
            "/seller/coupons",
            Some(coupon_json("NOPE")),
            Some(&buyer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_code_is_400() {
    let (app, seller, _) = setup().await;
    create(&app, &seller, "TWICE").await;

    let response = app
        .oneshot(request(
            "POST",
            "/seller/coupons",
            Some(coupon_json("TWICE")),
            Some(&seller),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Coupon code already exists: TWICE");
}

#[tokio::test]
async fn test_validate_returns_capped_discount() {
    let (app, seller, _) = setup().await;
    create(&app, &seller, "TAKE12").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/coupons/validate",
            Some(json!({ "code": "TAKE12", "order_total": "40.00" })),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let quote: Value = json_body(response.into_body()).await;
    assert_eq!(quote["discount"], "12.50");

    let response = app
        .oneshot(request(
            "POST",
            "/coupons/validate",
            Some(json!({ "code": "TAKE12", "order_total": "10.00" })),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_by_author_only() {
    let (app, seller, buyer) = setup().await;
    let coupon = create(&app, &seller, "TAKE12").await;
    let uri = format!("/seller/coupons/{}", coupon.id);

    let mut body = coupon_json("TAKE15");
    body["discount_fixed_amount"] = json!("15.00");
    let response = app
        .clone()
        .oneshot(request("PUT", &uri, Some(body), Some(&seller)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Coupon = json_body(response.into_body()).await;
    assert_eq!(updated.code, "TAKE15");

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, None, Some(&buyer)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, None, Some(&seller)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", &format!("/coupons/{}", coupon.id), None, None))
        .await
        .unwrap();
    let deleted: Coupon = json_body(response.into_body()).await;
    assert_eq!(deleted.state, CouponState::Deleted);
}
