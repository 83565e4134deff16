use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponState {
    Active,
    #[default]
    Inactive,
    Deleted,
}

/// Who or what a coupon is restricted to
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponCategory {
    #[default]
    General,
    UserSpecific,
    ProductSpecific,
    CategorySpecific,
    CompanySpecific,
}

/// Whether the discount applies to the whole order or to eligible items
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponScope {
    #[default]
    Order,
    Item,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponType {
    #[default]
    Percentage,
    Fixed,
}

/// Seller discount coupon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    pub id: Uuid,
    /// Unique across all sellers
    pub code: String,
    pub description: Option<String>,
    pub state: CouponState,
    pub category: CouponCategory,
    pub scope: CouponScope,
    pub coupon_type: CouponType,
    #[schema(value_type = Option<String>)]
    pub minimum_order_amount: Option<Decimal>,
    /// 0 means unlimited
    pub max_uses: i32,
    pub max_uses_per_user: i32,
    pub start_from: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub discount_percentage: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub discount_fixed_amount: Option<Decimal>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn new(input: CouponRequest, author_id: Uuid) -> Self {
        let now = Utc::now();
        let mut coupon = Self {
            id: Uuid::now_v7(),
            code: String::new(),
            description: None,
            state: CouponState::default(),
            category: input.category,
            scope: CouponScope::default(),
            coupon_type: input.coupon_type,
            minimum_order_amount: None,
            max_uses: 0,
            max_uses_per_user: 0,
            start_from: input.start_from,
            end_at: input.end_at,
            discount_percentage: None,
            discount_fixed_amount: None,
            author_id,
            created_at: now,
            updated_at: now,
        };
        input.apply_to(&mut coupon);
        coupon
    }

    /// Inclusive on both ends
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.start_from <= now && now <= self.end_at
    }

    /// Discount on `applicable_total`, never more than `applicable_total`.
    ///
    /// Percentages are rounded to cents, halves away from zero.
    pub fn discount_for(&self, applicable_total: Decimal) -> Decimal {
        let discount = match self.coupon_type {
            CouponType::Fixed => self.discount_fixed_amount.unwrap_or_default(),
            CouponType::Percentage => {
                let pct = self.discount_percentage.unwrap_or_default();
                (applicable_total * pct / Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            }
        };
        discount.min(applicable_total)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positive")
            .with_message("Minimum order amount must be greater than 0".into()));
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("percentage")
            .with_message("Discount percentage must be between 0 and 100".into()));
    }
    Ok(())
}

/// Body for creating or replacing a coupon
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// INACTIVE on create, unchanged on update, when absent
    pub state: Option<CouponState>,
    pub category: CouponCategory,
    pub scope: Option<CouponScope>,
    pub coupon_type: CouponType,
    #[validate(custom(function = "positive"))]
    #[schema(value_type = Option<String>)]
    pub minimum_order_amount: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub max_uses: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub max_uses_per_user: i32,
    pub start_from: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[validate(custom(function = "percentage"))]
    #[schema(value_type = Option<String>)]
    pub discount_percentage: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>)]
    pub discount_fixed_amount: Option<Decimal>,
}

impl CouponRequest {
    pub fn apply_to(self, coupon: &mut Coupon) {
        coupon.code = self.code.trim().to_string();
        coupon.description = self.description;
        if let Some(state) = self.state {
            coupon.state = state;
        }
        coupon.category = self.category;
        if let Some(scope) = self.scope {
            coupon.scope = scope;
        }
        coupon.coupon_type = self.coupon_type;
        coupon.minimum_order_amount = self.minimum_order_amount;
        coupon.max_uses = self.max_uses;
        coupon.max_uses_per_user = self.max_uses_per_user;
        coupon.start_from = self.start_from;
        coupon.end_at = self.end_at;
        coupon.discount_percentage = self.discount_percentage;
        coupon.discount_fixed_amount = self.discount_fixed_amount;
    }
}

/// Check a code against an order total
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String)]
    pub order_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CouponQuote {
    pub coupon: Coupon,
    #[schema(value_type = String)]
    pub discount: Decimal,
}
