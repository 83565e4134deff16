//! Companies Domain
//!
//! Seller companies, their members and the per-company admin rights.
//! Membership is stored on the user (`company_id`); deleting a company is a
//! soft delete that detaches members, rights and product listings.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_companies::{handlers, CompanyService, PgCompanyRepository};
//! use domain_products::PgProductRepository;
//! use domain_users::PgUserRepository;
//! use imaging::{ImageConfig, ImageProcessor};
//! use sea_orm::DatabaseConnection;
//!
//! # fn example(db: DatabaseConnection) {
//! let service = CompanyService::new(
//!     PgCompanyRepository::new(db.clone()),
//!     Arc::new(PgUserRepository::new(db.clone())),
//!     Arc::new(PgProductRepository::new(db)),
//!     ImageProcessor::new(ImageConfig::default()),
//! );
//! let router = handlers::router(service, 10 * 1024 * 1024);
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CompanyError, CompanyResult};
pub use models::{
    ApproveRightsRequest, AssignAdminRights, Company, CompanyAdminRights, CompanyFilter,
    RegisterCompany, SellerRequest, UpdateCompany,
};
pub use postgres::PgCompanyRepository;
pub use repository::{CompanyRepository, InMemoryCompanyRepository};
pub use service::CompanyService;
