use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, CurrentUser, MultipartForm, UuidPath, UuidPathPair, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ConflictResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use domain_users::UserResponse;
use imaging::UploadedFile;
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{CompanyError, CompanyResult};
use crate::models::{
    ApproveRightsRequest, AssignAdminRights, Company, CompanyAdminRights, CompanyFilter,
    RegisterCompany, SellerRequest, UpdateCompany,
};
use crate::repository::CompanyRepository;
use crate::service::CompanyService;

const TAG: &str = "companies";
const SELLER_TAG: &str = "seller-companies";

/// OpenAPI documentation for the companies API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_companies,
        get_company,
        get_logo,
        get_admins,
        register_company,
        update_company,
        delete_company,
        assign_admin_rights,
        update_admin_rights,
        add_seller,
        remove_seller,
        upload_logo,
        restore_company,
    ),
    components(
        schemas(
            Company, CompanyAdminRights, CompanyFilter, RegisterCompany, UpdateCompany,
            AssignAdminRights, ApproveRightsRequest, SellerRequest
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestUuidResponse,
            BadRequestValidationResponse,
            ConflictResponse,
            ForbiddenResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Public company directory"),
        (name = SELLER_TAG, description = "Company administration for admin sellers")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<CompanyService<R>>>;

/// Create the companies router. `max_upload_bytes` bounds the logo upload body.
pub fn router<R: CompanyRepository + 'static>(
    service: CompanyService<R>,
    max_upload_bytes: usize,
) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/companies", get(list_companies))
        .route("/companies/{id}", get(get_company))
        .route("/companies/{id}/logo", get(get_logo))
        .route("/companies/{id}/admins", get(get_admins))
        .route("/seller/companies", post(register_company))
        .route(
            "/seller/companies/{id}",
            put(update_company).delete(delete_company),
        )
        .route("/seller/companies/{id}/admins", post(assign_admin_rights))
        .route(
            "/seller/companies/{id}/admins/{user_id}",
            put(update_admin_rights),
        )
        .route("/seller/companies/{id}/sellers", post(add_seller))
        .route(
            "/seller/companies/{id}/sellers/{email}",
            axum::routing::delete(remove_seller),
        )
        .route(
            "/seller/companies/{id}/logo",
            post(upload_logo).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/admin/companies/{id}/restore", post(restore_company))
        .with_state(shared_service)
}

fn audit(
    user: &CurrentUser,
    headers: &HeaderMap,
    action: &str,
    id: Uuid,
    details: serde_json::Value,
) {
    AuditEvent::for_user(user, action, Some(format!("company:{}", id)), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers))
        .with_details(details)
        .log();
}

/// List active companies
#[utoipa::path(
    get,
    path = "/companies",
    tag = TAG,
    params(CompanyFilter),
    responses(
        (status = 200, description = "Companies by name", body = Vec<Company>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_companies<R: CompanyRepository>(
    State(service): SharedService<R>,
    Query(filter): Query<CompanyFilter>,
) -> CompanyResult<Json<Vec<Company>>> {
    Ok(Json(service.list_companies(filter).await?))
}

/// Get a company
#[utoipa::path(
    get,
    path = "/companies/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company found", body = Company),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_company<R: CompanyRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> CompanyResult<Json<Company>> {
    Ok(Json(service.get_company(id).await?))
}

/// Logo bytes
#[utoipa::path(
    get,
    path = "/companies/{id}/logo",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Logo bytes", content_type = "image/*"),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_logo<R: CompanyRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> CompanyResult<impl IntoResponse> {
    let (content_type, bytes) = service.get_logo(id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Approved admins
#[utoipa::path(
    get,
    path = "/companies/{id}/admins",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Admin rights", body = Vec<CompanyAdminRights>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_admins<R: CompanyRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> CompanyResult<Json<Vec<CompanyAdminRights>>> {
    Ok(Json(service.get_company_admins(id).await?))
}

/// Register a company; the caller becomes its primary admin
#[utoipa::path(
    post,
    path = "/seller/companies",
    tag = SELLER_TAG,
    request_body = RegisterCompany,
    responses(
        (status = 201, description = "Company registered, or the existing one with that name", body = Company),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn register_company<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(input): Json<RegisterCompany>,
) -> CompanyResult<impl IntoResponse> {
    let company = service.register_company(input, user.id).await?;
    audit(
        &user,
        &headers,
        "company.register",
        company.id,
        json!({ "name": company.name }),
    );
    Ok((StatusCode::CREATED, Json(company)))
}

/// Update company details
#[utoipa::path(
    put,
    path = "/seller/companies/{id}",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = UpdateCompany,
    responses(
        (status = 200, description = "Company updated", body = Company),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_company<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCompany>,
) -> CompanyResult<Json<Company>> {
    let company = service.update_company(id, input, user.id).await?;
    audit(&user, &headers, "company.update", id, json!({}));
    Ok(Json(company))
}

/// Soft delete a company
#[utoipa::path(
    delete,
    path = "/seller/companies/{id}",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_company<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> CompanyResult<StatusCode> {
    service.delete_company(id, user.id).await?;
    audit(&user, &headers, "company.delete", id, json!({}));
    Ok(StatusCode::NO_CONTENT)
}

/// Grant admin rights to a seller of the company
#[utoipa::path(
    post,
    path = "/seller/companies/{id}/admins",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = AssignAdminRights,
    responses(
        (status = 200, description = "Rights saved", body = CompanyAdminRights),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn assign_admin_rights<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<AssignAdminRights>,
) -> CompanyResult<Json<CompanyAdminRights>> {
    let rights = service.assign_admin_rights(id, user.id, input).await?;
    audit(
        &user,
        &headers,
        "company.admin.assign",
        id,
        json!({ "user_id": rights.user_id, "approved": rights.approved }),
    );
    Ok(Json(rights))
}

/// Approve or suspend an admin
#[utoipa::path(
    put,
    path = "/seller/companies/{id}/admins/{user_id}",
    tag = SELLER_TAG,
    params(
        ("id" = Uuid, Path, description = "Company ID"),
        ("user_id" = Uuid, Path, description = "Admin user ID")
    ),
    request_body = ApproveRightsRequest,
    responses(
        (status = 200, description = "Rights updated", body = CompanyAdminRights),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_admin_rights<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPathPair(id, target_id): UuidPathPair,
    Json(input): Json<ApproveRightsRequest>,
) -> CompanyResult<Json<CompanyAdminRights>> {
    let rights = service
        .update_admin_rights(id, user.id, target_id, input.approved)
        .await?;
    audit(
        &user,
        &headers,
        "company.admin.approve",
        id,
        json!({ "user_id": target_id, "approved": input.approved }),
    );
    Ok(Json(rights))
}

/// Attach a seller to the company
#[utoipa::path(
    post,
    path = "/seller/companies/{id}/sellers",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = SellerRequest,
    responses(
        (status = 200, description = "Seller added", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn add_seller<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<SellerRequest>,
) -> CompanyResult<Json<UserResponse>> {
    let seller = service.add_seller(id, &input.email, user.id).await?;
    audit(
        &user,
        &headers,
        "company.seller.add",
        id,
        json!({ "seller_id": seller.id }),
    );
    Ok(Json(seller.into()))
}

/// Detach a seller from the company
#[utoipa::path(
    delete,
    path = "/seller/companies/{id}/sellers/{email}",
    tag = SELLER_TAG,
    params(
        ("id" = Uuid, Path, description = "Company ID"),
        ("email" = String, Path, description = "Seller email")
    ),
    responses(
        (status = 204, description = "Seller removed"),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn remove_seller<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    Path((id, email)): Path<(Uuid, String)>,
) -> CompanyResult<StatusCode> {
    service.remove_seller(id, &email, user.id).await?;
    audit(
        &user,
        &headers,
        "company.seller.remove",
        id,
        json!({ "email": email }),
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Upload the logo (multipart field `logo`)
#[utoipa::path(
    post,
    path = "/seller/companies/{id}/logo",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body(content_type = "multipart/form-data", description = "Field `logo`"),
    responses(
        (status = 200, description = "Logo stored", body = Company),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn upload_logo<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    form: MultipartForm,
) -> CompanyResult<Json<Company>> {
    let part = form
        .files_named("logo")
        .next()
        .ok_or_else(|| CompanyError::Validation("Missing file field 'logo'".to_string()))?;
    let file = UploadedFile::new(
        part.file_name.clone(),
        part.content_type.clone(),
        part.bytes.clone(),
    );

    let company = service.upload_logo(id, user.id, file).await?;
    audit(&user, &headers, "company.logo", id, json!({}));
    Ok(Json(company))
}

/// Undo a soft delete (APP_ADMIN)
#[utoipa::path(
    post,
    path = "/admin/companies/{id}/restore",
    tag = SELLER_TAG,
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company restored", body = Company),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn restore_company<R: CompanyRepository>(
    State(service): SharedService<R>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> CompanyResult<Json<Company>> {
    let company = service.restore_company(id, user.id).await?;
    audit(&user, &headers, "company.restore", id, json!({}));
    Ok(Json(company))
}
