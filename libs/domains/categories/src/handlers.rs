use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, CurrentUser, MultipartForm, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ConflictResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    extract_ip_from_headers,
};
use imaging::UploadedFile;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{
    Category, CategoryFilter, CategoryMetric, CategoryMetricTotal, CategoryNode, CreateCategory,
    ExistsResponse, InlineImage, NameQuery, UpdateCategory,
};
use crate::repository::CategoryRepository;
use crate::service::CategoryService;

const TAG: &str = "categories";
const ADMIN_ROLE: &str = "APP_ADMIN";

/// OpenAPI documentation for the categories API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_categories,
        list_all,
        tree,
        search,
        roots,
        leaves,
        by_metric,
        get_category,
        exists,
        subcategories,
        get_image,
        create_category,
        update_category,
        delete_category,
        upload_image,
    ),
    components(
        schemas(
            Category, CategoryNode, CategoryMetric, CategoryMetricTotal, CreateCategory,
            UpdateCategory, ExistsResponse, InlineImage
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
    tags((name = TAG, description = "Category tree"))
)]
pub struct ApiDoc;

/// Create the categories router. `max_upload_bytes` bounds image uploads.
pub fn router<R: CategoryRepository + 'static>(
    service: CategoryService<R>,
    max_upload_bytes: usize,
) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/all", get(list_all))
        .route("/categories/tree", get(tree))
        .route("/categories/search", get(search))
        .route("/categories/roots", get(roots))
        .route("/categories/leaves", get(leaves))
        .route("/categories/by-metric/{metric}", get(by_metric))
        .route("/categories/{id}", get(get_category))
        .route("/categories/{id}/exists", get(exists))
        .route("/categories/{id}/subcategories", get(subcategories))
        .route("/categories/{id}/image", get(get_image))
        .route("/admin/categories", post(create_category))
        .route(
            "/admin/categories/{id}",
            axum::routing::put(update_category).delete(delete_category),
        )
        .route(
            "/admin/categories/{id}/image",
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(shared_service)
}

fn require_admin(user: &CurrentUser) -> CategoryResult<()> {
    if user.has_role(ADMIN_ROLE) {
        Ok(())
    } else {
        Err(CategoryError::Forbidden("Admin access required".to_string()))
    }
}

fn audit(user: &CurrentUser, headers: &HeaderMap, action: &str, id: Uuid) {
    AuditEvent::for_user(user, action, Some(format!("category:{}", id)), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .log();
}

/// List categories by name, paginated
#[utoipa::path(
    get,
    path = "/categories",
    tag = TAG,
    params(CategoryFilter),
    responses(
        (status = 200, description = "Page of categories", body = Vec<Category>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Query(filter): Query<CategoryFilter>,
) -> CategoryResult<Json<Vec<Category>>> {
    Ok(Json(service.list_categories(filter).await?))
}

/// Every category
#[utoipa::path(
    get,
    path = "/categories/all",
    tag = TAG,
    responses((status = 200, description = "All categories", body = Vec<Category>))
)]
async fn list_all<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
) -> CategoryResult<Json<Vec<Category>>> {
    Ok(Json(service.list_all().await?))
}

/// Nested tree from the roots
#[utoipa::path(
    get,
    path = "/categories/tree",
    tag = TAG,
    responses((status = 200, description = "Category forest", body = Vec<CategoryNode>))
)]
async fn tree<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
) -> CategoryResult<Json<Vec<CategoryNode>>> {
    Ok(Json(service.tree().await?))
}

/// Find categories whose name contains a fragment
#[utoipa::path(
    get,
    path = "/categories/search",
    tag = TAG,
    params(NameQuery),
    responses((status = 200, description = "Matches", body = Vec<Category>))
)]
async fn search<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Query(query): Query<NameQuery>,
) -> CategoryResult<Json<Vec<Category>>> {
    Ok(Json(service.find_by_name(&query.name).await?))
}

/// Categories without a parent
#[utoipa::path(
    get,
    path = "/categories/roots",
    tag = TAG,
    responses((status = 200, description = "Root categories", body = Vec<Category>))
)]
async fn roots<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
) -> CategoryResult<Json<Vec<Category>>> {
    Ok(Json(service.parent_categories().await?))
}

/// Categories without children
#[utoipa::path(
    get,
    path = "/categories/leaves",
    tag = TAG,
    responses((status = 200, description = "Leaf categories", body = Vec<Category>))
)]
async fn leaves<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
) -> CategoryResult<Json<Vec<Category>>> {
    Ok(Json(service.leaf_categories().await?))
}

/// Categories ranked by a product aggregate
#[utoipa::path(
    get,
    path = "/categories/by-metric/{metric}",
    tag = TAG,
    params(
        ("metric" = CategoryMetric, Path, description = "Aggregate to rank by"),
        CategoryFilter
    ),
    responses(
        (status = 200, description = "Ranked categories", body = Vec<CategoryMetricTotal>),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn by_metric<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Path(metric): Path<String>,
    Query(page): Query<CategoryFilter>,
) -> CategoryResult<Json<Vec<CategoryMetricTotal>>> {
    let metric = CategoryMetric::from_str(&metric)
        .map_err(|_| CategoryError::Validation(format!("Unknown category metric: {}", metric)))?;
    Ok(Json(service.sorted_by_metric(metric, page).await?))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    UuidPath(id): UuidPath,
) -> CategoryResult<Json<Category>> {
    Ok(Json(service.get_category(id).await?))
}

/// Whether a category exists
#[utoipa::path(
    get,
    path = "/categories/{id}/exists",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Existence flag", body = ExistsResponse),
        (status = 400, response = BadRequestUuidResponse)
    )
)]
async fn exists<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    UuidPath(id): UuidPath,
) -> CategoryResult<Json<ExistsResponse>> {
    Ok(Json(ExistsResponse {
        exists: service.exists(id).await?,
    }))
}

/// Direct children of a category
#[utoipa::path(
    get,
    path = "/categories/{id}/subcategories",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Children", body = Vec<Category>),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn subcategories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    UuidPath(id): UuidPath,
) -> CategoryResult<Json<Vec<Category>>> {
    Ok(Json(service.subcategories(id).await?))
}

/// Category picture
#[utoipa::path(
    get,
    path = "/categories/{id}/image",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_image<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    UuidPath(id): UuidPath,
) -> CategoryResult<impl IntoResponse> {
    let (content_type, bytes) = service.get_image(id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/admin/categories",
    tag = TAG,
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn create_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    user: CurrentUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> CategoryResult<impl IntoResponse> {
    require_admin(&user)?;
    let category = service.create_category(input).await?;
    audit(&user, &headers, "category.create", category.id);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Replace a category's name, description and parent
#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCategory>,
) -> CategoryResult<Json<Category>> {
    require_admin(&user)?;
    let category = service.update_category(id, input).await?;
    audit(&user, &headers, "category.update", id);
    Ok(Json(category))
}

/// Delete a category without children
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> CategoryResult<StatusCode> {
    require_admin(&user)?;
    service.delete_category(id).await?;
    audit(&user, &headers, "category.delete", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Upload the category picture (multipart field `image`)
#[utoipa::path(
    post,
    path = "/admin/categories/{id}/image",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body(content_type = "multipart/form-data", description = "Field `image`"),
    responses(
        (status = 200, description = "Image stored", body = Category),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn upload_image<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    form: MultipartForm,
) -> CategoryResult<Json<Category>> {
    require_admin(&user)?;
    let part = form
        .files_named("image")
        .next()
        .ok_or_else(|| CategoryError::Validation("Missing file field 'image'".to_string()))?;

    let file = UploadedFile::new(
        part.file_name.clone(),
        part.content_type.clone(),
        part.bytes.clone(),
    );
    let category = service.upload_image(id, file).await?;
    audit(&user, &headers, "category.image.upload", id);
    Ok(Json(category))
}
