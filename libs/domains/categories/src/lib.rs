//! Categories Domain
//!
//! A tree of product categories. Roots have no parent; leaves have no
//! children. Mutations are reserved for `APP_ADMIN`.
//!
//! Ranking categories by product activity needs product data, which this
//! crate reads through [`CategoryMetricSource`].

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CategoryError, CategoryResult};
pub use models::{
    Category, CategoryFilter, CategoryMetric, CategoryMetricTotal, CategoryNode, CreateCategory,
    ExistsResponse, InlineImage, NameQuery, UpdateCategory,
};
pub use postgres::PgCategoryRepository;
pub use repository::{CategoryMetricSource, CategoryRepository, InMemoryCategoryRepository};
pub use service::CategoryService;
