use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CouponError, CouponResult};
use crate::models::{Coupon, CouponState};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn create(&self, coupon: Coupon) -> CouponResult<Coupon>;

    /// Includes DELETED coupons
    async fn get_by_id(&self, id: Uuid) -> CouponResult<Option<Coupon>>;

    async fn get_by_code(&self, code: &str) -> CouponResult<Option<Coupon>>;

    /// Whether another coupon (other than `exclude`) already uses `code`
    async fn code_taken(&self, code: &str, exclude: Option<Uuid>) -> CouponResult<bool>;

    /// Non-deleted coupons of one author, newest first
    async fn list_by_author(&self, author_id: Uuid) -> CouponResult<Vec<Coupon>>;

    async fn update(&self, coupon: Coupon) -> CouponResult<Coupon>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryCouponRepository {
    coupons: Arc<RwLock<HashMap<Uuid, Coupon>>>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn create(&self, coupon: Coupon) -> CouponResult<Coupon> {
        let mut coupons = self.coupons.write().await;
        if coupons.values().any(|c| c.code == coupon.code) {
            return Err(CouponError::Validation(format!(
                "Coupon code already exists: {}",
                coupon.code
            )));
        }
        coupons.insert(coupon.id, coupon.clone());
        Ok(coupon)
    }

    async fn get_by_id(&self, id: Uuid) -> CouponResult<Option<Coupon>> {
        Ok(self.coupons.read().await.get(&id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> CouponResult<Option<Coupon>> {
        let coupons = self.coupons.read().await;
        Ok(coupons.values().find(|c| c.code == code).cloned())
    }

    async fn code_taken(&self, code: &str, exclude: Option<Uuid>) -> CouponResult<bool> {
        let coupons = self.coupons.read().await;
        Ok(coupons
            .values()
            .any(|c| c.code == code && Some(c.id) != exclude))
    }

    async fn list_by_author(&self, author_id: Uuid) -> CouponResult<Vec<Coupon>> {
        let coupons = self.coupons.read().await;
        let mut result: Vec<Coupon> = coupons
            .values()
            .filter(|c| c.author_id == author_id && c.state != CouponState::Deleted)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, coupon: Coupon) -> CouponResult<Coupon> {
        let mut coupons = self.coupons.write().await;
        if !coupons.contains_key(&coupon.id) {
            return Err(CouponError::NotFound(coupon.id.to_string()));
        }
        coupons.insert(coupon.id, coupon.clone());
        Ok(coupon)
    }
}
