use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(schemas(axum_helpers::ErrorResponse)),
    info(
        title = "Shop API",
        version = "0.1.0",
        description = "Users, companies, addresses, categories, products and coupons for the shop"
    ),
    servers((url = "/api", description = "API base path"))
)]
struct ShopDoc;

/// The shop document with every domain's paths merged in.
///
/// Domain routers are merged at the API root, so their documents are merged
/// rather than nested.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        let mut doc = ShopDoc::openapi();
        doc.merge(domain_users::handlers::ApiDoc::openapi());
        doc.merge(domain_categories::handlers::ApiDoc::openapi());
        doc.merge(domain_products::handlers::ApiDoc::openapi());
        doc.merge(domain_companies::handlers::ApiDoc::openapi());
        doc.merge(domain_addresses::handlers::ApiDoc::openapi());
        doc.merge(domain_coupons::handlers::ApiDoc::openapi());
        doc
    }
}
