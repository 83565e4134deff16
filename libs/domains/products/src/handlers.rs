use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, CurrentUser, MultipartForm, UuidPath, UuidPathPair,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use imaging::UploadedFile;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateProduct, FavoriteStatus, FavoritesQuery, ImageUploadQuery, NewArrivalsQuery, Product,
    ProductCondition, ProductDetails, ProductFilter, ProductImage, ProductSellType, ProductStatus,
    UpdatePriceRequest, UpdateProduct, UpdateQuantityRequest,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

const TAG: &str = "products";
const SELLER_TAG: &str = "seller-products";
const FAVORITES_TAG: &str = "favorites";

/// OpenAPI documentation for the products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        new_arrivals,
        get_product,
        list_images,
        get_image,
        get_thumbnail,
        create_product,
        update_product,
        delete_product,
        update_quantity,
        update_price,
        upload_image,
        delete_image,
        admin_delete_product,
        toggle_favorite,
        list_favorites,
    ),
    components(
        schemas(
            Product, ProductDetails, ProductImage, ProductStatus, ProductSellType,
            ProductCondition, CreateProduct, UpdateProduct, UpdateQuantityRequest,
            UpdatePriceRequest, ProductFilter, FavoriteStatus, FavoritesQuery
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestUuidResponse,
            ForbiddenResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Public catalogue"),
        (name = SELLER_TAG, description = "Listing management for sellers"),
        (name = FAVORITES_TAG, description = "The caller's favorite products")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<ProductService<R>>>;

/// Create the products router. `max_upload_bytes` bounds each multipart body.
pub fn router<R: ProductRepository + 'static>(
    service: ProductService<R>,
    max_upload_bytes: usize,
) -> Router {
    let shared_service = Arc::new(service);
    let upload_limit = DefaultBodyLimit::max(max_upload_bytes);

    Router::new()
        .route("/products", get(list_products))
        .route("/products/new-arrivals", get(new_arrivals))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/images", get(list_images))
        .route("/products/{id}/images/{image_id}", get(get_image))
        .route(
            "/products/{id}/images/{image_id}/thumbnail",
            get(get_thumbnail),
        )
        .route(
            "/seller/products",
            post(create_product).layer(upload_limit.clone()),
        )
        .route(
            "/seller/products/{id}",
            axum::routing::put(update_product)
                .layer(upload_limit.clone())
                .delete(delete_product),
        )
        .route("/seller/products/{id}/quantity", patch(update_quantity))
        .route("/seller/products/{id}/price", patch(update_price))
        .route(
            "/seller/products/{id}/images",
            post(upload_image).layer(upload_limit),
        )
        .route(
            "/seller/products/{id}/images/{image_id}",
            delete(delete_image),
        )
        .route("/admin/products/{id}", delete(admin_delete_product))
        .route("/users/me/favorites", get(list_favorites))
        .route("/users/me/favorites/{id}", post(toggle_favorite))
        .with_state(shared_service)
}

fn audit(
    user: &CurrentUser,
    headers: &HeaderMap,
    action: &str,
    id: Uuid,
    details: serde_json::Value,
) {
    AuditEvent::for_user(user, action, Some(format!("product:{}", id)), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers))
        .with_details(details)
        .log();
}

fn json_part<T: DeserializeOwned>(form: &MultipartForm) -> ProductResult<Option<T>> {
    form.json_field("product").map_err(|e| match e {
        AppError::BadRequest(msg) => ProductError::Validation(msg),
        other => ProductError::Internal(other.to_string()),
    })
}

fn uploads<'a>(form: &'a MultipartForm, field: &'a str) -> impl Iterator<Item = UploadedFile> + 'a {
    form.files_named(field).map(|part| {
        UploadedFile::new(
            part.file_name.clone(),
            part.content_type.clone(),
            part.bytes.clone(),
        )
    })
}

/// List products
#[utoipa::path(
    get,
    path = "/products",
    tag = TAG,
    params(ProductFilter),
    responses(
        (status = 200, description = "Matching products, newest first", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): SharedService<R>,
    Query(filter): Query<ProductFilter>,
) -> ProductResult<Json<Vec<Product>>> {
    Ok(Json(service.list_products(filter).await?))
}

/// Most recent listings
#[utoipa::path(
    get,
    path = "/products/new-arrivals",
    tag = TAG,
    params(NewArrivalsQuery),
    responses((status = 200, description = "Newest products", body = Vec<Product>))
)]
async fn new_arrivals<R: ProductRepository>(
    State(service): SharedService<R>,
    Query(query): Query<NewArrivalsQuery>,
) -> ProductResult<Json<Vec<Product>>> {
    Ok(Json(service.new_arrivals(query.limit).await?))
}

/// Get a product with its image metadata
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductDetails),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<ProductDetails>> {
    Ok(Json(service.get_product(id).await?))
}

/// Image metadata in display order
#[utoipa::path(
    get,
    path = "/products/{id}/images",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Images", body = Vec<ProductImage>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_images<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<Vec<ProductImage>>> {
    Ok(Json(service.list_images(id).await?))
}

/// Resized image bytes
#[utoipa::path(
    get,
    path = "/products/{id}/images/{image_id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_image<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPathPair(id, image_id): UuidPathPair,
) -> ProductResult<impl IntoResponse> {
    let (content_type, bytes) = service.get_image(id, image_id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Thumbnail bytes
#[utoipa::path(
    get,
    path = "/products/{id}/images/{image_id}/thumbnail",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes", content_type = "image/*"),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_thumbnail<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPathPair(id, image_id): UuidPathPair,
) -> ProductResult<impl IntoResponse> {
    let (content_type, bytes) = service.get_thumbnail(id, image_id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// List a product (multipart: JSON field `product`, files `images`)
#[utoipa::path(
    post,
    path = "/seller/products",
    tag = SELLER_TAG,
    request_body(content_type = "multipart/form-data", description = "`product` JSON plus `images` files"),
    responses(
        (status = 201, description = "Product created", body = ProductDetails),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    form: MultipartForm,
) -> ProductResult<impl IntoResponse> {
    let input: CreateProduct = json_part(&form)?
        .ok_or_else(|| ProductError::Validation("Missing field 'product'".to_string()))?;
    let files = uploads(&form, "images").collect();

    let details = service.create_product(input, files, user.id).await?;
    audit(
        &user,
        &headers,
        "product.create",
        details.product.id,
        json!({ "images": details.images.len() }),
    );
    Ok((StatusCode::CREATED, Json(details)))
}

/// Update a listing (multipart: optional JSON field `product`, files `images`)
#[utoipa::path(
    put,
    path = "/seller/products/{id}",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "`product` JSON plus `images` files"),
    responses(
        (status = 200, description = "Product updated", body = ProductDetails),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    form: MultipartForm,
) -> ProductResult<Json<ProductDetails>> {
    let input: UpdateProduct = json_part(&form)?.unwrap_or_default();
    let files = uploads(&form, "images").collect();

    let details = service.update_product(id, input, files, user.id).await?;
    audit(&user, &headers, "product.update", id, json!({}));
    Ok(Json(details))
}

/// Soft delete a listing
#[utoipa::path(
    delete,
    path = "/seller/products/{id}",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> ProductResult<StatusCode> {
    service.delete_product(id, user.id).await?;
    audit(&user, &headers, "product.delete", id, json!({}));
    Ok(StatusCode::NO_CONTENT)
}

/// Set the stock level
#[utoipa::path(
    patch,
    path = "/seller/products/{id}/quantity",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_quantity<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    Json(input): Json<UpdateQuantityRequest>,
) -> ProductResult<Json<Product>> {
    let product = service.update_quantity(id, input.quantity, user.id).await?;
    audit(
        &user,
        &headers,
        "product.quantity",
        id,
        json!({ "quantity": product.quantity }),
    );
    Ok(Json(product))
}

/// Set the unit price
#[utoipa::path(
    patch,
    path = "/seller/products/{id}/price",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdatePriceRequest,
    responses(
        (status = 200, description = "Price updated", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_price<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    Json(input): Json<UpdatePriceRequest>,
) -> ProductResult<Json<Product>> {
    let product = service.update_price(id, input.price, user.id).await?;
    audit(
        &user,
        &headers,
        "product.price",
        id,
        json!({ "price": product.price.to_string() }),
    );
    Ok(Json(product))
}

/// Add one picture (multipart field `image`)
#[utoipa::path(
    post,
    path = "/seller/products/{id}/images",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Product ID"), ImageUploadQuery),
    request_body(content_type = "multipart/form-data", description = "Field `image`"),
    responses(
        (status = 201, description = "Image stored", body = ProductImage),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn upload_image<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    Query(query): Query<ImageUploadQuery>,
    form: MultipartForm,
) -> ProductResult<impl IntoResponse> {
    let file = uploads(&form, "image")
        .next()
        .ok_or_else(|| ProductError::Validation("Missing file field 'image'".to_string()))?;

    let image = service
        .upload_image(id, file, query.is_primary, user.id)
        .await?;
    audit(
        &user,
        &headers,
        "product.image.upload",
        id,
        json!({ "image_id": image.id, "primary": image.is_primary }),
    );
    Ok((StatusCode::CREATED, Json(image)))
}

/// Remove one picture
#[utoipa::path(
    delete,
    path = "/seller/products/{id}/images/{image_id}",
    tag = SELLER_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_image<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPathPair(id, image_id): UuidPathPair,
) -> ProductResult<StatusCode> {
    service.delete_image(id, image_id, user.id).await?;
    audit(
        &user,
        &headers,
        "product.image.delete",
        id,
        json!({ "image_id": image_id }),
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Remove any listing (APP_ADMIN)
#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn admin_delete_product<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> ProductResult<StatusCode> {
    service.admin_delete_product(id, user.id).await?;
    audit(&user, &headers, "product.admin_delete", id, json!({}));
    Ok(StatusCode::NO_CONTENT)
}

/// Add a product to the caller's favorites, or remove it if present
#[utoipa::path(
    post,
    path = "/users/me/favorites/{id}",
    tag = FAVORITES_TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Favorite toggled", body = FavoriteStatus),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn toggle_favorite<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<FavoriteStatus>> {
    let status = service.toggle_favorite(id, user.id).await?;
    let action = if status.favorited {
        "product.favorite"
    } else {
        "product.unfavorite"
    };
    audit(&user, &headers, action, id, json!({}));
    Ok(Json(status))
}

/// The caller's favorites, most recently added first
#[utoipa::path(
    get,
    path = "/users/me/favorites",
    tag = FAVORITES_TAG,
    params(FavoritesQuery),
    responses(
        (status = 200, description = "Favorite products", body = Vec<Product>),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_favorites<R: ProductRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    Query(query): Query<FavoritesQuery>,
) -> ProductResult<Json<Vec<Product>>> {
    Ok(Json(service.list_favorites(user.id, query).await?))
}
