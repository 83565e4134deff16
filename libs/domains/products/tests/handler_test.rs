//! Handler tests for the products domain

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum_helpers::JwtClaims;
use domain_categories::{Category, CategoryRepository, InMemoryCategoryRepository};
use domain_products::*;
use domain_users::{InMemoryUserRepository, Role, User, UserRepository};
use http_body_util::BodyExt;
use imaging::{ImageConfig, ImageProcessor};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()
use uuid::Uuid;

const BOUNDARY: &str = "shop-boundary";

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn as_user(mut request: Request<Body>, user: &User) -> Request<Body> {
    request.extensions_mut().insert(JwtClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: user.full_name(),
        roles: user.role_names(),
        exp: i64::MAX,
        iat: 0,
        jti: "test".to_string(),
    });
    request
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn png() -> Vec<u8> {
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    let img = ImageBuffer::from_pixel(16, 9, Rgb([0u8, 90, 180]));
    let mut out = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Multipart body with an optional `product` JSON part and PNG files.
fn multipart(method: &str, uri: &str, product: Option<Value>, files: &[(&str, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(product) = product {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"product\"\r\n\r\n{}\r\n",
                product
            )
            .as_bytes(),
        );
    }
    for (field, file_name) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

struct TestApp {
    app: Router,
    seller: User,
    buyer: User,
    admin: User,
    category_id: Uuid,
}

async fn setup() -> TestApp {
    let users = Arc::new(InMemoryUserRepository::new());
    let categories = Arc::new(InMemoryCategoryRepository::new());
    let category = categories
        .create(Category::new("Audio".into(), None, None))
        .await
        .unwrap();

    let mut seller = User::new("Sia".into(), "Seller".into(), "sia@shop.test", None, "h".into());
    seller.grant(Role::Seller);
    let seller = users.create(seller).await.unwrap();

    let buyer = User::new("Bo".into(), "Buyer".into(), "bo@shop.test", None, "h".into());
    let buyer = users.create(buyer).await.unwrap();

    let mut admin = User::new("Ada".into(), "Admin".into(), "ada@shop.test", None, "h".into());
    admin.grant(Role::AppAdmin);
    let admin = users.create(admin).await.unwrap();

    let service = ProductService::new(
        InMemoryProductRepository::new(),
        users,
        categories,
        ImageProcessor::new(ImageConfig::default()),
    );

    TestApp {
        app: handlers::router(service, 20 * 1024 * 1024),
        seller,
        buyer,
        admin,
        category_id: category.id,
    }
}

fn product_json(category_id: Uuid) -> Value {
    json!({
        "name": "Studio Headphones",
        "price": "89.90",
        "quantity": 3,
        "condition": "LIKE_NEW",
        "category_id": category_id
    })
}

async fn create(t: &TestApp, files: &[(&str, &str)]) -> ProductDetails {
    let response = t
        .app
        .clone()
        .oneshot(as_user(
            multipart("POST", "/seller/products", Some(product_json(t.category_id)), files),
            &t.seller,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_create_product_with_images_returns_201() {
    let t = setup().await;

    let details = create(&t, &[("images", "front.png"), ("images", "back.png")]).await;

    assert_eq!(details.product.name, "Studio Headphones");
    assert_eq!(details.product.status, ProductStatus::Available);
    assert_eq!(details.product.condition, ProductCondition::LikeNew);
    assert_eq!(details.images.len(), 2);
    assert!(details.images[0].is_primary);
    assert_eq!(details.images[0].file_name, "front.png");
}

#[tokio::test]
async fn test_create_product_requires_auth_and_seller() {
    let t = setup().await;

    let request = multipart("POST", "/seller/products", Some(product_json(t.category_id)), &[]);
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = multipart("POST", "/seller/products", Some(product_json(t.category_id)), &[]);
    let response = t.app.clone().oneshot(as_user(request, &t.buyer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_product_without_json_part_is_400() {
    let t = setup().await;

    let request = multipart("POST", "/seller/products", None, &[("images", "a.png")]);
    let response = t.app.oneshot(as_user(request, &t.seller)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_product_with_unknown_category_is_400() {
    let t = setup().await;

    let request = multipart(
        "POST",
        "/seller/products",
        Some(product_json(Uuid::now_v7())),
        &[],
    );
    let response = t.app.oneshot(as_user(request, &t.seller)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_product_counts_views_and_serves_images() {
    let t = setup().await;
    let details = create(&t, &[("images", "front.png")]).await;
    let id = details.product.id;
    let image_id = details.images[0].id;

    let response = t
        .app
        .clone()
        .oneshot(get(&format!("/products/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: ProductDetails = json_body(response.into_body()).await;
    assert_eq!(fetched.product.view_count, 1);

    let response = t
        .app
        .clone()
        .oneshot(get(&format!("/products/{}/images/{}", id, image_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let response = t
        .app
        .oneshot(get(&format!("/products/{}/images/{}/thumbnail", id, image_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_unknown_product_is_404() {
    let t = setup().await;
    let response = t
        .app
        .oneshot(get(&format!("/products/{}", Uuid::now_v7())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_products_filters_by_name() {
    let t = setup().await;
    create(&t, &[]).await;

    let response = t
        .app
        .clone()
        .oneshot(get("/products?name=headphones"))
        .await
        .unwrap();
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(products.len(), 1);

    let response = t.app.oneshot(get("/products?name=guitar")).await.unwrap();
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_quantity_and_price_updates() {
    let t = setup().await;
    let id = create(&t, &[]).await.product.id;

    let response = t
        .app
        .clone()
        .oneshot(as_user(
            json_request(
                "PATCH",
                &format!("/seller/products/{}/quantity", id),
                json!({ "quantity": 0 }),
            ),
            &t.seller,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let product: Product = json_body(response.into_body()).await;
    assert_eq!(product.status, ProductStatus::OutOfStock);

    let response = t
        .app
        .clone()
        .oneshot(as_user(
            json_request(
                "PATCH",
                &format!("/seller/products/{}/price", id),
                json!({ "price": "-5" }),
            ),
            &t.seller,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Invalid Price");

    // Other users may not touch the listing
    let response = t
        .app
        .oneshot(as_user(
            json_request(
                "PATCH",
                &format!("/seller/products/{}/price", id),
                json!({ "price": "10" }),
            ),
            &t.buyer,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_product_with_new_image() {
    let t = setup().await;
    let details = create(&t, &[("images", "front.png")]).await;

    let response = t
        .app
        .oneshot(as_user(
            multipart(
                "PUT",
                &format!("/seller/products/{}", details.product.id),
                Some(json!({ "brand": "Sonora", "quantity": 0 })),
                &[("images", "side.png")],
            ),
            &t.seller,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let updated: ProductDetails = json_body(response.into_body()).await;
    assert_eq!(updated.product.brand.as_deref(), Some("Sonora"));
    assert_eq!(updated.product.status, ProductStatus::OutOfStock);
    assert_eq!(updated.images.len(), 2);
    let primary: Vec<&ProductImage> = updated.images.iter().filter(|i| i.is_primary).collect();
    assert_eq!(primary.len(), 1);
    assert_eq!(primary[0].file_name, "side.png");
}

#[tokio::test]
async fn test_upload_and_delete_image() {
    let t = setup().await;
    let id = create(&t, &[]).await.product.id;

    let response = t
        .app
        .clone()
        .oneshot(as_user(
            multipart(
                "POST",
                &format!("/seller/products/{}/images?is_primary=true", id),
                None,
                &[("image", "one.png")],
            ),
            &t.seller,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let image: ProductImage = json_body(response.into_body()).await;
    assert!(image.is_primary);

    let response = t
        .app
        .clone()
        .oneshot(as_user(
            Request::builder()
                .method("DELETE")
                .uri(format!("/seller/products/{}/images/{}", id, image.id))
                .body(Body::empty())
                .unwrap(),
            &t.seller,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t
        .app
        .oneshot(get(&format!("/products/{}/images", id)))
        .await
        .unwrap();
    let images: Vec<ProductImage> = json_body(response.into_body()).await;
    assert!(images.is_empty());
}

#[tokio::test]
async fn test_unsupported_image_type_is_400() {
    let t = setup().await;
    let id = create(&t, &[]).await.product.id;

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri(format!("/seller/products/{}/images", id))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = t.app.oneshot(as_user(request, &t.seller)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Unsupported file type");
}

#[tokio::test]
async fn test_delete_product_hides_it() {
    let t = setup().await;
    let id = create(&t, &[]).await.product.id;

    let delete = |user: &User| {
        as_user(
            Request::builder()
                .method("DELETE")
                .uri(format!("/seller/products/{}", id))
                .body(Body::empty())
                .unwrap(),
            user,
        )
    };

    let response = t.app.clone().oneshot(delete(&t.seller)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t
        .app
        .clone()
        .oneshot(get(&format!("/products/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t.app.oneshot(delete(&t.seller)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_delete_requires_app_admin() {
    let t = setup().await;
    let id = create(&t, &[]).await.product.id;

    let delete = |user: &User| {
        as_user(
            Request::builder()
                .method("DELETE")
                .uri(format!("/admin/products/{}", id))
                .body(Body::empty())
                .unwrap(),
            user,
        )
    };

    let response = t.app.clone().oneshot(delete(&t.seller)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = t.app.oneshot(delete(&t.admin)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_invalid_uuid_is_400() {
    let t = setup().await;
    let response = t.app.oneshot(get("/products/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_toggle_favorite_and_list_favorites() {
    let t = setup().await;
    let details = create(&t, &[]).await;
    let uri = format!("/users/me/favorites/{}", details.product.id);

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().method("POST").uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let toggle = || {
        let request = Request::builder().method("POST").uri(&uri).body(Body::empty()).unwrap();
        as_user(request, &t.buyer)
    };
    let response = t.app.clone().oneshot(toggle()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status: FavoriteStatus = json_body(response.into_body()).await;
    assert!(status.favorited);
    assert_eq!(status.favorite_count, 1);

    let response = t
        .app
        .clone()
        .oneshot(as_user(get("/users/me/favorites?limit=5"), &t.buyer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let favorites: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].favorite_count, 1);

    let response = t.app.clone().oneshot(toggle()).await.unwrap();
    let status: FavoriteStatus = json_body(response.into_body()).await;
    assert!(!status.favorited);
    assert_eq!(status.favorite_count, 0);

    let response = t
        .app
        .clone()
        .oneshot(as_user(get("/users/me/favorites"), &t.buyer))
        .await
        .unwrap();
    let favorites: Vec<Product> = json_body(response.into_body()).await;
    assert!(favorites.is_empty());
}

#[tokio::test]
async fn test_favorite_unknown_product_is_404() {
    let t = setup().await;
    let uri = format!("/users/me/favorites/{}", Uuid::now_v7());
    let request = Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap();

    let response = t.app.oneshot(as_user(request, &t.buyer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_name_filter_treats_wildcards_literally() {
    let t = setup().await;
    create(&t, &[]).await;

    let response = t.app.clone().oneshot(get("/products?name=%25")).await.unwrap();
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert!(products.is_empty());

    let response = t.app.oneshot(get("/products?name=dio%20h")).await.unwrap();
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(products.len(), 1);
}
