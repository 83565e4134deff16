use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, CurrentUser, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::CouponResult;
use crate::models::{
    Coupon, CouponCategory, CouponQuote, CouponRequest, CouponScope, CouponState, CouponType,
    ValidateCouponRequest,
};
use crate::repository::CouponRepository;
use crate::service::CouponService;

const TAG: &str = "coupons";
const SELLER_TAG: &str = "seller-coupons";

/// OpenAPI documentation for the coupons API
#[derive(OpenApi)]
#[openapi(
    paths(
        get_coupon,
        validate_coupon,
        list_seller_coupons,
        create_coupon,
        update_coupon,
        delete_coupon,
    ),
    components(
        schemas(
            Coupon, CouponRequest, CouponQuote, ValidateCouponRequest, CouponState,
            CouponCategory, CouponScope, CouponType
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestUuidResponse,
            BadRequestValidationResponse,
            ForbiddenResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Coupon lookup and checkout validation"),
        (name = SELLER_TAG, description = "Coupon management for sellers")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<CouponService<R>>>;

pub fn router<R: CouponRepository + 'static>(service: CouponService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/coupons/validate", post(validate_coupon))
        .route("/coupons/{id}", get(get_coupon))
        .route(
            "/seller/coupons",
            post(create_coupon).get(list_seller_coupons),
        )
        .route(
            "/seller/coupons/{id}",
            put(update_coupon).delete(delete_coupon),
        )
        .with_state(shared_service)
}

fn audit(user: &CurrentUser, headers: &HeaderMap, action: &str, id: Uuid, code: Option<&str>) {
    AuditEvent::for_user(user, action, Some(format!("coupon:{}", id)), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers))
        .with_details(json!({ "code": code }))
        .log();
}

/// Get a coupon by ID
#[utoipa::path(
    get,
    path = "/coupons/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Coupon found", body = Coupon),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_coupon<R: CouponRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> CouponResult<Json<Coupon>> {
    Ok(Json(service.get_coupon(id).await?))
}

/// Check a code against an order total and preview the discount
#[utoipa::path(
    post,
    path = "/coupons/validate",
    tag = TAG,
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Coupon applies", body = CouponQuote),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn validate_coupon<R: CouponRepository>(
    State(service): SharedService<R>,
    ValidatedJson(input): ValidatedJson<ValidateCouponRequest>,
) -> CouponResult<Json<CouponQuote>> {
    Ok(Json(service.quote(&input.code, input.order_total).await?))
}

/// List the caller's coupons
#[utoipa::path(
    get,
    path = "/seller/coupons",
    tag = SELLER_TAG,
    responses(
        (status = 200, description = "Coupons, newest first", body = Vec<Coupon>),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn list_seller_coupons<R: CouponRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
) -> CouponResult<Json<Vec<Coupon>>> {
    Ok(Json(service.get_seller_coupons(user.id).await?))
}

/// Create a coupon
#[utoipa::path(
    post,
    path = "/seller/coupons",
    tag = SELLER_TAG,
    request_body = CouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = Coupon),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn create_coupon<R: CouponRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CouponRequest>,
) -> CouponResult<impl IntoResponse> {
    let coupon = service.create_coupon(input, user.id).await?;
    audit(&user, &headers, "coupon.create", coupon.id, Some(&coupon.code));
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Replace a coupon's fields
#[utoipa::path(
    put,
    path = "/seller/coupons/{id}",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Coupon ID")),
    request_body = CouponRequest,
    responses(
        (status = 200, description = "Coupon updated", body = Coupon),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_coupon<R: CouponRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<CouponRequest>,
) -> CouponResult<Json<Coupon>> {
    let coupon = service.update_coupon(id, input, user.id).await?;
    audit(&user, &headers, "coupon.update", id, Some(&coupon.code));
    Ok(Json(coupon))
}

/// Mark a coupon as deleted
#[utoipa::path(
    delete,
    path = "/seller/coupons/{id}",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 204, description = "Coupon deleted"),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_coupon<R: CouponRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> CouponResult<StatusCode> {
    service.delete_coupon(id, user.id).await?;
    audit(&user, &headers, "coupon.delete", id, None);
    Ok(StatusCode::NO_CONTENT)
}
