use axum::{Router, middleware, routing::get};
use axum_helpers::optional_jwt_auth_middleware;
use domain_addresses::{AddressService, PgAddressRepository};
use domain_categories::{CategoryRepository, CategoryService, PgCategoryRepository};
use domain_companies::{CompanyRepository, CompanyService, PgCompanyRepository};
use domain_coupons::{CouponService, PgCouponRepository};
use domain_products::{PgProductRepository, ProductCategoryMetrics, ProductRepository, ProductService};
use domain_users::{PgUserRepository, UserRepository, UserService};
use imaging::ImageProcessor;
use std::sync::Arc;

use crate::state::AppState;

pub mod health;

/// All domain routes, without the `/api` prefix that `create_router` adds.
///
/// Services share repositories through `Arc` handles, so one Postgres pool
/// backs every domain. Claims are attached by the optional JWT middleware;
/// handlers that need a caller reject anonymous requests themselves.
pub fn routes(state: &AppState) -> Router {
    let db = state.db.clone();
    let images = ImageProcessor::new(state.config.images.clone());
    let upload_limit = state.config.upload_body_limit();

    let user_service = UserService::new(PgUserRepository::new(db.clone()));
    let users: Arc<dyn UserRepository> = user_service.repository();

    let category_service = CategoryService::new(PgCategoryRepository::new(db.clone()), images.clone());
    let categories: Arc<dyn CategoryRepository> = category_service.repository();

    let product_service = ProductService::new(
        PgProductRepository::new(db.clone()),
        users.clone(),
        categories,
        images.clone(),
    );
    let products: Arc<dyn ProductRepository> = product_service.repository();
    let category_service = category_service.with_metrics(Arc::new(ProductCategoryMetrics::new(
        product_service.repository(),
    )));

    let company_service = CompanyService::new(
        PgCompanyRepository::new(db.clone()),
        users.clone(),
        products,
        images,
    );
    let companies: Arc<dyn CompanyRepository> = company_service.repository();

    let address_service = AddressService::new(PgAddressRepository::new(db.clone()), users.clone(), companies);
    let coupon_service = CouponService::new(PgCouponRepository::new(db), users);

    Router::new()
        .merge(domain_users::handlers::router(user_service, state.jwt_auth.clone()))
        .merge(domain_categories::handlers::router(category_service, upload_limit))
        .merge(domain_products::handlers::router(product_service, upload_limit))
        .merge(domain_companies::handlers::router(company_service, upload_limit))
        .merge(domain_addresses::handlers::router(address_service))
        .merge(domain_coupons::handlers::router(coupon_service))
        .layer(middleware::from_fn_with_state(
            state.jwt_auth.clone(),
            optional_jwt_auth_middleware,
        ))
}

/// `/ready`, which checks the database before reporting ready.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
