//! Products Domain
//!
//! Seller listings with their pictures, the public catalogue, user
//! favorites and the per-category aggregates behind
//! `/categories/by-metric/{metric}`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, multipart uploads
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Ownership checks, image limits, primary image
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + Postgres implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_categories::PgCategoryRepository;
//! use domain_products::{handlers, PgProductRepository, ProductService};
//! use domain_users::PgUserRepository;
//! use imaging::{ImageConfig, ImageProcessor};
//! use sea_orm::DatabaseConnection;
//!
//! # fn example(db: DatabaseConnection) {
//! let service = ProductService::new(
//!     PgProductRepository::new(db.clone()),
//!     Arc::new(PgUserRepository::new(db.clone())),
//!     Arc::new(PgCategoryRepository::new(db)),
//!     ImageProcessor::new(ImageConfig::default()),
//! );
//! let router = handlers::router(service, 50 * 1024 * 1024);
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{ProductError, ProductResult};
pub use models::{
    CreateProduct, FavoriteStatus, FavoritesQuery, ImageUploadQuery, NewArrivalsQuery, Product,
    ProductCondition, ProductDetails, ProductFilter, ProductImage, ProductSellType, ProductStatus,
    UpdatePriceRequest, UpdateProduct, UpdateQuantityRequest,
};
pub use postgres::PgProductRepository;
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::{ProductCategoryMetrics, ProductService};
