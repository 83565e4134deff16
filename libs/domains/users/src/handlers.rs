use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, CurrentUser, JwtAuth, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ConflictResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{
    AuthResponse, BlockUserRequest, CreateUser, LoginRequest, MessageResponse, Role, RoleRequest,
    UpdatePasswordRequest, User, UserFilter, UserResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

const TAG: &str = "users";
const ADMIN_TAG: &str = "admin-users";

/// OpenAPI documentation for the users API
#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        login,
        me,
        become_seller,
        change_own_password,
        list_users,
        get_user,
        get_user_by_email,
        delete_user,
        restore_user,
        block_user,
        unblock_user,
        set_password,
        get_roles,
        assign_role,
        remove_role,
        assign_seller,
        remove_seller,
    ),
    components(
        schemas(
            User, UserResponse, CreateUser, LoginRequest, AuthResponse, BlockUserRequest,
            UpdatePasswordRequest, RoleRequest, MessageResponse, Role, UserFilter
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            ForbiddenResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Registration, login and the caller's own account"),
        (name = ADMIN_TAG, description = "Account administration (APP_ADMIN)")
    )
)]
pub struct ApiDoc;

struct UsersState<R: UserRepository> {
    service: UserService<R>,
    auth: JwtAuth,
}

type SharedState<R> = State<Arc<UsersState<R>>>;

/// Create the users router; `auth` signs tokens on login.
pub fn router<R: UserRepository + 'static>(service: UserService<R>, auth: JwtAuth) -> Router {
    let state = Arc::new(UsersState { service, auth });

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users/me", get(me))
        .route("/users/me/become-seller", post(become_seller))
        .route("/users/me/password", put(change_own_password))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}", get(get_user).delete(delete_user))
        .route("/admin/users/{id}/password", put(set_password))
        .route("/admin/users/by-email/{email}", get(get_user_by_email))
        .route("/admin/users/by-email/{email}/restore", post(restore_user))
        .route("/admin/users/by-email/{email}/block", post(block_user))
        .route("/admin/users/by-email/{email}/unblock", post(unblock_user))
        .route(
            "/admin/users/by-email/{email}/roles",
            get(get_roles).post(assign_role),
        )
        .route(
            "/admin/users/by-email/{email}/roles/{role}",
            delete(remove_role),
        )
        .route(
            "/admin/users/by-email/{email}/seller",
            post(assign_seller).delete(remove_seller),
        )
        .with_state(state)
}

fn require_admin(user: &CurrentUser) -> UserResult<()> {
    if user.has_role(&Role::AppAdmin.to_string()) {
        Ok(())
    } else {
        Err(UserError::Forbidden("Admin access required".to_string()))
    }
}

fn audit(
    admin: &CurrentUser,
    headers: &HeaderMap,
    action: &str,
    target: &str,
    details: serde_json::Value,
) {
    AuditEvent::for_user(admin, action, Some(format!("user:{}", target)), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers))
        .with_details(details)
        .log();
}

/// Register a buyer account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = TAG,
    request_body = CreateUser,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: UserRepository>(
    State(state): SharedState<R>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = state.service.register(input).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(state): SharedState<R>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, axum_helpers::AppError> {
    let user = match state.service.authenticate(&input.email, &input.password).await {
        Ok(user) => user,
        Err(e) => {
            AuditEvent::new(None, "user.login", None, AuditOutcome::Failure)
                .with_ip(extract_ip_from_headers(&headers))
                .with_details(json!({ "email": input.email }))
                .log();
            return Err(e.into());
        }
    };

    let token =
        state
            .auth
            .issue_token(user.id, &user.email, &user.full_name(), &user.role_names())?;

    AuditEvent::new(
        Some(user.id.to_string()),
        "user.login",
        None,
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers))
    .log();

    Ok(Json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.ttl_secs(),
        user: user.into(),
    }))
}

/// The authenticated caller
#[utoipa::path(
    get,
    path = "/users/me",
    tag = TAG,
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn me<R: UserRepository>(
    State(state): SharedState<R>,
    caller: CurrentUser,
) -> UserResult<Json<UserResponse>> {
    let user = state.service.get_user(caller.id).await?;
    Ok(Json(user.into()))
}

/// Start selling as an individual
#[utoipa::path(
    post,
    path = "/users/me/become-seller",
    tag = TAG,
    responses(
        (status = 200, description = "Caller now holds SELLER", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn become_seller<R: UserRepository>(
    State(state): SharedState<R>,
    caller: CurrentUser,
) -> UserResult<Json<UserResponse>> {
    let user = state.service.become_individual_seller(caller.id).await?;
    Ok(Json(user.into()))
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/users/me/password",
    tag = TAG,
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn change_own_password<R: UserRepository>(
    State(state): SharedState<R>,
    caller: CurrentUser,
    Json(input): Json<UpdatePasswordRequest>,
) -> UserResult<StatusCode> {
    state
        .service
        .update_password(caller.id, &input.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List users
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = ADMIN_TAG,
    params(UserFilter),
    responses(
        (status = 200, description = "Users, newest first", body = Vec<UserResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    Query(filter): Query<UserFilter>,
) -> UserResult<Json<Vec<UserResponse>>> {
    require_admin(&admin)?;
    let users = state.service.list_users(filter).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = ADMIN_TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    require_admin(&admin)?;
    Ok(Json(state.service.get_user(id).await?.into()))
}

/// Get a user by email
#[utoipa::path(
    get,
    path = "/admin/users/by-email/{email}",
    tag = ADMIN_TAG,
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_user_by_email<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    Path(email): Path<String>,
) -> UserResult<Json<UserResponse>> {
    require_admin(&admin)?;
    Ok(Json(state.service.get_user_by_email(&email).await?.into()))
}

/// Soft-delete a user
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = ADMIN_TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> UserResult<StatusCode> {
    require_admin(&admin)?;
    state.service.delete_user(id).await?;
    audit(&admin, &headers, "user.delete", &id.to_string(), json!({}));
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted user
#[utoipa::path(
    post,
    path = "/admin/users/by-email/{email}/restore",
    tag = ADMIN_TAG,
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "User restored", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn restore_user<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> UserResult<Json<UserResponse>> {
    require_admin(&admin)?;
    let user = state.service.restore_user(&email).await?;
    audit(&admin, &headers, "user.restore", &user.id.to_string(), json!({}));
    Ok(Json(user.into()))
}

/// Block a user
#[utoipa::path(
    post,
    path = "/admin/users/by-email/{email}/block",
    tag = ADMIN_TAG,
    params(("email" = String, Path, description = "User email")),
    request_body = BlockUserRequest,
    responses(
        (status = 200, description = "Outcome message", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn block_user<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    Path(email): Path<String>,
    Json(input): Json<BlockUserRequest>,
) -> UserResult<Json<MessageResponse>> {
    require_admin(&admin)?;
    let message = state.service.block_user(&email, &input.reason).await?;
    audit(
        &admin,
        &headers,
        "user.block",
        &email,
        json!({ "reason": input.reason, "result": message }),
    );
    Ok(Json(MessageResponse::new(message)))
}

/// Unblock a user
#[utoipa::path(
    post,
    path = "/admin/users/by-email/{email}/unblock",
    tag = ADMIN_TAG,
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "Outcome message", body = MessageResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn unblock_user<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> UserResult<Json<MessageResponse>> {
    require_admin(&admin)?;
    let message = state.service.unblock_user(&email).await?;
    audit(&admin, &headers, "user.unblock", &email, json!({ "result": message }));
    Ok(Json(MessageResponse::new(message)))
}

/// Reset a user's password
#[utoipa::path(
    put,
    path = "/admin/users/{id}/password",
    tag = ADMIN_TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn set_password<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    Json(input): Json<UpdatePasswordRequest>,
) -> UserResult<StatusCode> {
    require_admin(&admin)?;
    state.service.update_password(id, &input.password).await?;
    audit(&admin, &headers, "user.password_reset", &id.to_string(), json!({}));
    Ok(StatusCode::NO_CONTENT)
}

/// Roles held by a user
#[utoipa::path(
    get,
    path = "/admin/users/by-email/{email}/roles",
    tag = ADMIN_TAG,
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "Roles", body = Vec<Role>),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_roles<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    Path(email): Path<String>,
) -> UserResult<Json<Vec<Role>>> {
    require_admin(&admin)?;
    Ok(Json(state.service.get_user_roles(&email).await?))
}

/// Grant a role
#[utoipa::path(
    post,
    path = "/admin/users/by-email/{email}/roles",
    tag = ADMIN_TAG,
    params(("email" = String, Path, description = "User email")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn assign_role<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    Path(email): Path<String>,
    Json(input): Json<RoleRequest>,
) -> UserResult<Json<UserResponse>> {
    require_admin(&admin)?;
    let user = state.service.assign_role(&email, &input.role).await?;
    audit(
        &admin,
        &headers,
        "user.role.assign",
        &user.id.to_string(),
        json!({ "role": input.role }),
    );
    Ok(Json(user.into()))
}

/// Revoke a role
#[utoipa::path(
    delete,
    path = "/admin/users/by-email/{email}/roles/{role}",
    tag = ADMIN_TAG,
    params(
        ("email" = String, Path, description = "User email"),
        ("role" = String, Path, description = "Role name")
    ),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn remove_role<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    Path((email, role)): Path<(String, String)>,
) -> UserResult<Json<UserResponse>> {
    require_admin(&admin)?;
    let user = state.service.remove_role(&email, &role).await?;
    audit(
        &admin,
        &headers,
        "user.role.remove",
        &user.id.to_string(),
        json!({ "role": role }),
    );
    Ok(Json(user.into()))
}

/// Grant SELLER
#[utoipa::path(
    post,
    path = "/admin/users/by-email/{email}/seller",
    tag = ADMIN_TAG,
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn assign_seller<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> UserResult<Json<UserResponse>> {
    require_admin(&admin)?;
    let user = state.service.assign_seller_role(&email).await?;
    audit(
        &admin,
        &headers,
        "user.role.assign",
        &user.id.to_string(),
        json!({ "role": Role::Seller }),
    );
    Ok(Json(user.into()))
}

/// Revoke SELLER
#[utoipa::path(
    delete,
    path = "/admin/users/by-email/{email}/seller",
    tag = ADMIN_TAG,
    params(("email" = String, Path, description = "User email")),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn remove_seller<R: UserRepository>(
    State(state): SharedState<R>,
    admin: CurrentUser,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> UserResult<Json<UserResponse>> {
    require_admin(&admin)?;
    let user = state.service.remove_seller_role(&email).await?;
    audit(
        &admin,
        &headers,
        "user.role.remove",
        &user.id.to_string(),
        json!({ "role": Role::Seller }),
    );
    Ok(Json(user.into()))
}
