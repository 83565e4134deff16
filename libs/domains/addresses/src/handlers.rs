use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{HeaderMap, StatusCode, request::Parts},
    response::IntoResponse,
    routing::{get, put},
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, CurrentUser, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::AddressResult;
use crate::models::{
    Address, AddressOwner, AddressPage, AddressRequest, AddressSummary, AddressType,
    DeletedResponse, HasDefaultResponse, PageRequest,
};
use crate::repository::AddressRepository;
use crate::service::AddressService;

const TAG: &str = "addresses";

/// OpenAPI documentation for the address book API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_addresses,
        add_address,
        delete_all_addresses,
        list_page,
        summary,
        list_by_type,
        get_default,
        has_default,
        get_address,
        update_address,
        delete_address,
        set_default,
    ),
    components(
        schemas(
            Address, AddressOwner, AddressType, AddressRequest, AddressPage, AddressSummary,
            HasDefaultResponse, DeletedResponse, PageRequest
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            ForbiddenResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags((name = TAG, description = "Address books of users and companies"))
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<AddressService<R>>>;

/// Address book the request targets, plus the caller.
///
/// Routes with a `{company_id}` segment target that company; the others
/// target the caller's own book.
struct Scope {
    owner: AddressOwner,
    caller: CurrentUser,
    params: HashMap<String, String>,
}

impl Scope {
    fn address_id(&self) -> Result<Uuid, AppError> {
        self.uuid_param("id")
    }

    fn address_type(&self) -> Result<AddressType, AppError> {
        let raw = self.param("address_type")?;
        AddressType::from_str(raw)
            .map_err(|_| AppError::BadRequest(format!("Unknown address type: {}", raw)))
    }

    fn param(&self, name: &str) -> Result<&str, AppError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::BadRequest(format!("Missing path parameter '{}'", name)))
    }

    fn uuid_param(&self, name: &str) -> Result<Uuid, AppError> {
        let raw = self.param(name)?;
        Uuid::parse_str(raw).map_err(|_| AppError::InvalidUuid(format!("Invalid UUID: {}", raw)))
    }

    fn audit(&self, headers: &HeaderMap, action: &str, details: serde_json::Value) {
        let resource = format!("{}:{}", self.owner.kind().to_lowercase(), self.owner.id());
        AuditEvent::for_user(&self.caller, action, Some(resource), AuditOutcome::Success)
            .with_ip(extract_ip_from_headers(headers))
            .with_user_agent(extract_user_agent(headers))
            .with_details(details)
            .log();
    }
}

impl<S> FromRequestParts<S> for Scope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = CurrentUser::from_request_parts(parts, state).await?;
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut scope = Scope {
            owner: AddressOwner::User(caller.id),
            caller,
            params,
        };
        if scope.params.contains_key("company_id") {
            scope.owner = AddressOwner::Company(scope.uuid_param("company_id")?);
        }
        Ok(scope)
    }
}

fn book_routes<R: AddressRepository + 'static>() -> Router<Arc<AddressService<R>>> {
    Router::new()
        .route(
            "/",
            get(list_addresses::<R>)
                .post(add_address::<R>)
                .delete(delete_all_addresses::<R>),
        )
        .route("/page", get(list_page::<R>))
        .route("/summary", get(summary::<R>))
        .route("/types/{address_type}", get(list_by_type::<R>))
        .route("/types/{address_type}/default", get(get_default::<R>))
        .route("/types/{address_type}/has-default", get(has_default::<R>))
        .route(
            "/{id}",
            get(get_address::<R>)
                .put(update_address::<R>)
                .delete(delete_address::<R>),
        )
        .route("/{id}/default", put(set_default::<R>))
}

/// Create the addresses router for user and company address books.
pub fn router<R: AddressRepository + 'static>(service: AddressService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .nest("/users/me/addresses", book_routes::<R>())
        .nest("/companies/{company_id}/addresses", book_routes::<R>())
        .with_state(shared_service)
}

/// All addresses, default first
#[utoipa::path(
    get,
    path = "/users/me/addresses",
    tag = TAG,
    responses(
        (status = 200, description = "Addresses", body = Vec<Address>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_addresses<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
) -> AddressResult<Json<Vec<Address>>> {
    Ok(Json(service.list(scope.owner, scope.caller.id).await?))
}

/// Add an address; a new default replaces the previous default of its type
#[utoipa::path(
    post,
    path = "/users/me/addresses",
    tag = TAG,
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Address added", body = Address),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn add_address<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<AddressRequest>,
) -> AddressResult<impl IntoResponse> {
    let address = service.add(scope.owner, input, scope.caller.id).await?;
    scope.audit(
        &headers,
        "address.add",
        json!({ "address_id": address.id, "default": address.is_default }),
    );
    Ok((StatusCode::CREATED, Json(address)))
}

/// Remove every address of the book
#[utoipa::path(
    delete,
    path = "/users/me/addresses",
    tag = TAG,
    responses(
        (status = 200, description = "Addresses removed", body = DeletedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn delete_all_addresses<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
    headers: HeaderMap,
) -> AddressResult<Json<DeletedResponse>> {
    let deleted = service.delete_all(scope.owner, scope.caller.id).await?;
    scope.audit(&headers, "address.delete_all", json!({ "deleted": deleted }));
    Ok(Json(DeletedResponse { deleted }))
}

#[utoipa::path(
    get,
    path = "/users/me/addresses/page",
    tag = TAG,
    params(PageRequest),
    responses(
        (status = 200, description = "One page", body = AddressPage),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn list_page<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
    Query(page): Query<PageRequest>,
) -> AddressResult<Json<AddressPage>> {
    Ok(Json(
        service
            .list_paginated(scope.owner, page, scope.caller.id)
            .await?,
    ))
}

/// Address count
#[utoipa::path(
    get,
    path = "/users/me/addresses/summary",
    tag = TAG,
    responses((status = 200, description = "Count", body = AddressSummary))
)]
async fn summary<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
) -> AddressResult<Json<AddressSummary>> {
    let count = service.count(scope.owner, scope.caller.id).await?;
    Ok(Json(AddressSummary {
        count,
        has_addresses: count > 0,
    }))
}

#[utoipa::path(
    get,
    path = "/users/me/addresses/types/{address_type}",
    tag = TAG,
    params(("address_type" = AddressType, Path, description = "Address type")),
    responses(
        (status = 200, description = "Addresses of that type", body = Vec<Address>),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn list_by_type<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
) -> Result<Json<Vec<Address>>, AppError> {
    let address_type = scope.address_type()?;
    Ok(Json(
        service
            .list_by_type(scope.owner, address_type, scope.caller.id)
            .await?,
    ))
}

/// Default address of a type
#[utoipa::path(
    get,
    path = "/users/me/addresses/types/{address_type}/default",
    tag = TAG,
    params(("address_type" = AddressType, Path, description = "Address type")),
    responses(
        (status = 200, description = "Default address", body = Address),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_default<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
) -> Result<Json<Address>, AppError> {
    let address_type = scope.address_type()?;
    Ok(Json(
        service
            .get_default(scope.owner, address_type, scope.caller.id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/users/me/addresses/types/{address_type}/has-default",
    tag = TAG,
    params(("address_type" = AddressType, Path, description = "Address type")),
    responses((status = 200, description = "Whether a default exists", body = HasDefaultResponse))
)]
async fn has_default<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
) -> Result<Json<HasDefaultResponse>, AppError> {
    let address_type = scope.address_type()?;
    let has_default = service
        .has_default(scope.owner, address_type, scope.caller.id)
        .await?;
    Ok(Json(HasDefaultResponse {
        address_type,
        has_default,
    }))
}

#[utoipa::path(
    get,
    path = "/users/me/addresses/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address", body = Address),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_address<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
) -> Result<Json<Address>, AppError> {
    let id = scope.address_id()?;
    Ok(Json(service.get(scope.owner, id, scope.caller.id).await?))
}

/// Replace an address
#[utoipa::path(
    put,
    path = "/users/me/addresses/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Address ID")),
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Address updated", body = Address),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_address<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<AddressRequest>,
) -> Result<Json<Address>, AppError> {
    let id = scope.address_id()?;
    let address = service
        .update(scope.owner, id, input, scope.caller.id)
        .await?;
    scope.audit(&headers, "address.update", json!({ "address_id": id }));
    Ok(Json(address))
}

#[utoipa::path(
    delete,
    path = "/users/me/addresses/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_address<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let id = scope.address_id()?;
    service.delete(scope.owner, id, scope.caller.id).await?;
    scope.audit(&headers, "address.delete", json!({ "address_id": id }));
    Ok(StatusCode::NO_CONTENT)
}

/// Make an address the default of its type
#[utoipa::path(
    put,
    path = "/users/me/addresses/{id}/default",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Default changed", body = Address),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn set_default<R: AddressRepository>(
    State(service): SharedService<R>,
    scope: Scope,
    headers: HeaderMap,
) -> Result<Json<Address>, AppError> {
    let id = scope.address_id()?;
    let address = service
        .set_default(scope.owner, id, scope.caller.id)
        .await?;
    scope.audit(&headers, "address.default", json!({ "address_id": id }));
    Ok(Json(address))
}
