//! Handler tests for the users domain
//!
//! Requests go straight to the domain router with an in-memory repository.
//! Authenticated calls carry the claims a JWT middleware would have inserted.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_helpers::{JwtAuth, JwtClaims, JwtConfig};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

const SECRET: &str = "handler-test-secret-0123456789abcdef";

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn jwt() -> JwtAuth {
    JwtAuth::new(&JwtConfig::new(SECRET, 3600).unwrap())
}

fn claims_for(user: &User) -> JwtClaims {
    JwtClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: user.full_name(),
        roles: user.role_names(),
        exp: i64::MAX,
        iat: 0,
        jti: "test".to_string(),
    }
}

fn signup(first: &str, email: &str) -> CreateUser {
    CreateUser {
        first_name: first.to_string(),
        last_name: "Tester".to_string(),
        email: email.to_string(),
        phone_number: None,
        password: "correct-horse".to_string(),
    }
}

/// Router plus a registered admin and a registered buyer.
async fn setup() -> (Router, UserService<InMemoryUserRepository>, User, User) {
    let repo = InMemoryUserRepository::new();
    let service = UserService::new(repo.clone());

    let admin = service.register(signup("Ada", "ada@shop.test")).await.unwrap();
    let admin = service
        .assign_role(&admin.email, "APP_ADMIN")
        .await
        .unwrap();
    let buyer = service
        .register(signup("Bob", "bob@shop.test"))
        .await
        .unwrap();

    let app = handlers::router(UserService::new(repo.clone()), jwt());
    (app, UserService::new(repo), admin, buyer)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn as_user(mut request: Request<Body>, user: &User) -> Request<Body> {
    request.extensions_mut().insert(claims_for(user));
    request
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_register_returns_201_without_password_hash() {
    let (app, _, _, _) = setup().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({
                "first_name": "Cleo",
                "last_name": "Shopper",
                "email": "Cleo@Shop.Test",
                "password": "long-enough-pw"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["email"], "cleo@shop.test");
    assert_eq!(body["roles"], json!(["BUYER"]));
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_invalid_payload() {
    let (app, _, _, _) = setup().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({
                "first_name": "",
                "last_name": "Shopper",
                "email": "not-an-email",
                "password": "short"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_duplicate_email_returns_409() {
    let (app, _, _, _) = setup().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({
                "first_name": "Bob",
                "last_name": "Again",
                "email": "BOB@shop.test",
                "password": "long-enough-pw"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_issues_verifiable_token() {
    let (app, _, _, buyer) = setup().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "bob@shop.test", "password": "correct-horse" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: AuthResponse = json_body(response.into_body()).await;
    assert_eq!(body.token_type, "Bearer");
    assert_eq!(body.expires_in, 3600);
    assert_eq!(body.user.id, buyer.id);

    let claims = jwt().verify_token(&body.access_token).unwrap();
    assert_eq!(claims.sub, buyer.id.to_string());
    assert_eq!(claims.roles, vec!["BUYER".to_string()]);
}

#[tokio::test]
async fn test_login_wrong_password_returns_401() {
    let (app, _, _, _) = setup().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "bob@shop.test", "password": "wrong-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_blocked_user_returns_401() {
    let (app, service, _, buyer) = setup().await;
    service.block_user(&buyer.email, "chargebacks").await.unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "bob@shop.test", "password": "correct-horse" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let (app, _, _, _) = setup().await;

    let response = app.oneshot(empty("GET", "/users/me")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_caller() {
    let (app, _, _, buyer) = setup().await;

    let response = app
        .oneshot(as_user(empty("GET", "/users/me"), &buyer))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: UserResponse = json_body(response.into_body()).await;
    assert_eq!(body.email, "bob@shop.test");
}

#[tokio::test]
async fn test_become_seller_grants_role_once() {
    let (app, service, _, buyer) = setup().await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(as_user(empty("POST", "/users/me/become-seller"), &buyer))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let roles = service.get_user_roles(&buyer.email).await.unwrap();
    assert_eq!(roles, vec![Role::Buyer, Role::Seller]);
}

#[tokio::test]
async fn test_change_own_password_returns_204() {
    let (app, service, _, buyer) = setup().await;

    let response = app
        .oneshot(as_user(
            json_request(
                "PUT",
                "/users/me/password",
                json!({ "password": "brand-new-secret" }),
            ),
            &buyer,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(
        service
            .authenticate(&buyer.email, "brand-new-secret")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_admin_routes_forbid_non_admins() {
    let (app, _, _, buyer) = setup().await;

    let response = app
        .oneshot(as_user(empty("GET", "/admin/users"), &buyer))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_lists_users_with_role_filter() {
    let (app, _, admin, _) = setup().await;

    let response = app
        .oneshot(as_user(empty("GET", "/admin/users?role=APP_ADMIN"), &admin))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let users: Vec<UserResponse> = json_body(response.into_body()).await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, admin.id);
}

#[tokio::test]
async fn test_admin_get_user_invalid_uuid_returns_400() {
    let (app, _, admin, _) = setup().await;

    let response = app
        .oneshot(as_user(empty("GET", "/admin/users/not-a-uuid"), &admin))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_get_by_email_malformed_returns_400() {
    let (app, _, admin, _) = setup().await;

    let response = app
        .oneshot(as_user(
            empty("GET", "/admin/users/by-email/not%20an%20email"),
            &admin,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_block_twice_reports_already_blocked() {
    let (app, _, admin, _) = setup().await;
    let uri = "/admin/users/by-email/bob@shop.test/block";

    let first = app
        .clone()
        .oneshot(as_user(
            json_request("POST", uri, json!({ "reason": "fraud" })),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body: MessageResponse = json_body(first.into_body()).await;
    assert_eq!(body.message, "User blocked successfully.");

    let second = app
        .oneshot(as_user(
            json_request("POST", uri, json!({ "reason": "fraud" })),
            &admin,
        ))
        .await
        .unwrap();
    let body: MessageResponse = json_body(second.into_body()).await;
    assert_eq!(body.message, "User is already blocked.");
}

#[tokio::test]
async fn test_admin_delete_then_restore() {
    let (app, service, admin, buyer) = setup().await;

    let response = app
        .clone()
        .oneshot(as_user(
            empty("DELETE", &format!("/admin/users/{}", buyer.id)),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(service.get_user(buyer.id).await.unwrap().deleted);

    let response = app
        .oneshot(as_user(
            empty("POST", "/admin/users/by-email/bob@shop.test/restore"),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: UserResponse = json_body(response.into_body()).await;
    assert!(!body.deleted);
}

#[tokio::test]
async fn test_admin_role_assignment_and_removal() {
    let (app, _, admin, _) = setup().await;

    let response = app
        .clone()
        .oneshot(as_user(
            json_request(
                "POST",
                "/admin/users/by-email/bob@shop.test/roles",
                json!({ "role": "company_admin_seller" }),
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(as_user(
            empty("GET", "/admin/users/by-email/bob@shop.test/roles"),
            &admin,
        ))
        .await
        .unwrap();
    let roles: Vec<Role> = json_body(response.into_body()).await;
    assert_eq!(roles, vec![Role::Buyer, Role::CompanyAdminSeller]);

    let response = app
        .oneshot(as_user(
            empty(
                "DELETE",
                "/admin/users/by-email/bob@shop.test/roles/BUYER",
            ),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_seller_toggle() {
    let (app, service, admin, buyer) = setup().await;
    let uri = "/admin/users/by-email/bob@shop.test/seller";

    let response = app
        .clone()
        .oneshot(as_user(empty("POST", uri), &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(service.get_user(buyer.id).await.unwrap().has_role(Role::Seller));

    let response = app
        .oneshot(as_user(empty("DELETE", uri), &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!service.get_user(buyer.id).await.unwrap().has_role(Role::Seller));
}
