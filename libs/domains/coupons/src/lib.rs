//! Coupons Domain
//!
//! Seller-authored discount codes. A coupon is either a percentage or a fixed
//! amount, valid inside a date window, optionally gated on a minimum order
//! total. Deleting a coupon only flips its state to `DELETED`.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CouponError, CouponResult};
pub use models::{
    Coupon, CouponCategory, CouponQuote, CouponRequest, CouponScope, CouponState, CouponType,
    ValidateCouponRequest,
};
pub use postgres::PgCouponRepository;
pub use repository::{CouponRepository, InMemoryCouponRepository};
pub use service::CouponService;
