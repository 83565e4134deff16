use chrono::{DateTime, Utc};
use domain_users::{Role, User, UserRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CouponError, CouponResult};
use crate::models::{Coupon, CouponQuote, CouponRequest, CouponState, CouponType};
use crate::repository::CouponRepository;

/// Coupon service
///
/// Sellers manage their own coupons; anyone may check a code against a total.
pub struct CouponService<R: CouponRepository> {
    repository: Arc<R>,
    users: Arc<dyn UserRepository>,
}

impl<R: CouponRepository> CouponService<R> {
    pub fn new(repository: R, users: Arc<dyn UserRepository>) -> Self {
        Self {
            repository: Arc::new(repository),
            users,
        }
    }

    async fn load_seller(&self, caller_id: Uuid) -> CouponResult<User> {
        self.users
            .get_by_id(caller_id)
            .await?
            .filter(|u| u.exists() && u.has_role(Role::Seller))
            .ok_or_else(|| CouponError::Forbidden("Only sellers can manage coupons".to_string()))
    }

    async fn load(&self, id: Uuid) -> CouponResult<Coupon> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| CouponError::NotFound(id.to_string()))
    }

    async fn check_request(&self, input: &CouponRequest, exclude: Option<Uuid>) -> CouponResult<()> {
        input
            .validate()
            .map_err(|e| CouponError::Validation(e.to_string()))?;

        if input.start_from > input.end_at {
            return Err(CouponError::Validation(
                "Start date must be before end date".to_string(),
            ));
        }
        match input.coupon_type {
            CouponType::Percentage if input.discount_percentage.is_none() => {
                return Err(CouponError::Validation(
                    "Discount percentage must be set for PERCENTAGE coupon".to_string(),
                ));
            }
            CouponType::Fixed if input.discount_fixed_amount.is_none() => {
                return Err(CouponError::Validation(
                    "Discount fixed amount must be set for FIXED coupon".to_string(),
                ));
            }
            _ => {}
        }

        let code = input.code.trim();
        if self.repository.code_taken(code, exclude).await? {
            return Err(CouponError::Validation(format!(
                "Coupon code already exists: {}",
                code
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_coupon(&self, input: CouponRequest, caller_id: Uuid) -> CouponResult<Coupon> {
        let seller = self.load_seller(caller_id).await?;
        self.check_request(&input, None).await?;

        let coupon = self.repository.create(Coupon::new(input, seller.id)).await?;
        tracing::info!(coupon_id = %coupon.id, author_id = %seller.id, "Coupon created");
        Ok(coupon)
    }

    #[instrument(skip(self, input))]
    pub async fn update_coupon(
        &self,
        id: Uuid,
        input: CouponRequest,
        caller_id: Uuid,
    ) -> CouponResult<Coupon> {
        self.load_seller(caller_id).await?;
        let mut coupon = self.load(id).await?;
        if coupon.author_id != caller_id {
            return Err(CouponError::Forbidden(
                "Only the coupon author can update it".to_string(),
            ));
        }
        self.check_request(&input, Some(id)).await?;

        input.apply_to(&mut coupon);
        coupon.touch();
        self.repository.update(coupon).await
    }

    /// Soft delete: the coupon keeps its code but stops being listed.
    #[instrument(skip(self))]
    pub async fn delete_coupon(&self, id: Uuid, caller_id: Uuid) -> CouponResult<()> {
        self.load_seller(caller_id).await?;
        let mut coupon = self.load(id).await?;
        if coupon.author_id != caller_id {
            return Err(CouponError::Forbidden(
                "Only the coupon author can delete it".to_string(),
            ));
        }

        coupon.state = CouponState::Deleted;
        coupon.touch();
        self.repository.update(coupon).await?;
        tracing::info!(coupon_id = %id, "Coupon deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_seller_coupons(&self, caller_id: Uuid) -> CouponResult<Vec<Coupon>> {
        self.load_seller(caller_id).await?;
        self.repository.list_by_author(caller_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_coupon(&self, id: Uuid) -> CouponResult<Coupon> {
        self.load(id).await
    }

    /// Checks that `code` can be redeemed against `order_total` at `now`.
    #[instrument(skip(self))]
    pub async fn validate_coupon(
        &self,
        code: &str,
        order_total: Decimal,
        now: DateTime<Utc>,
    ) -> CouponResult<Coupon> {
        let code = code.trim();
        let coupon = self
            .repository
            .get_by_code(code)
            .await?
            .ok_or_else(|| CouponError::NotFound(code.to_string()))?;

        if coupon.state != CouponState::Active {
            return Err(CouponError::Validation(format!(
                "Coupon is not active: {}",
                code
            )));
        }
        if !coupon.is_valid_at(now) {
            return Err(CouponError::Validation(format!(
                "Coupon is expired or not yet valid: {}",
                code
            )));
        }
        if let Some(minimum) = coupon.minimum_order_amount {
            if order_total < minimum {
                return Err(CouponError::Validation(format!(
                    "Order total does not meet minimum amount for coupon: {}",
                    code
                )));
            }
        }
        Ok(coupon)
    }

    pub fn calculate_discount(&self, coupon: &Coupon, applicable_total: Decimal) -> Decimal {
        coupon.discount_for(applicable_total)
    }

    /// Validation and discount in one step, for the checkout preview.
    pub async fn quote(&self, code: &str, order_total: Decimal) -> CouponResult<CouponQuote> {
        let coupon = self.validate_coupon(code, order_total, Utc::now()).await?;
        let discount = self.calculate_discount(&coupon, order_total);
        Ok(CouponQuote { coupon, discount })
    }
}
