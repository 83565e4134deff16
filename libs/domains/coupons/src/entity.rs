//! SeaORM entity for `coupons`.

use crate::models::Coupon;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    pub state: String,
    pub category: String,
    pub scope: String,
    pub coupon_type: String,
    pub minimum_order_amount: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub max_uses_per_user: Option<i32>,
    pub start_from: DateTimeWithTimeZone,
    pub end_at: DateTimeWithTimeZone,
    pub discount_percentage: Option<Decimal>,
    pub discount_fixed_amount: Option<Decimal>,
    pub author_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn parse<T: FromStr>(column: &str, value: &str) -> Result<T, DbErr> {
    T::from_str(value).map_err(|_| DbErr::Type(format!("Unknown coupon {}: {}", column, value)))
}

impl TryFrom<Model> for Coupon {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            code: model.code,
            description: model.description,
            state: parse("state", &model.state)?,
            category: parse("category", &model.category)?,
            scope: parse("scope", &model.scope)?,
            coupon_type: parse("type", &model.coupon_type)?,
            minimum_order_amount: model.minimum_order_amount,
            max_uses: model.max_uses.unwrap_or_default(),
            max_uses_per_user: model.max_uses_per_user.unwrap_or_default(),
            start_from: model.start_from.into(),
            end_at: model.end_at.into(),
            discount_percentage: model.discount_percentage,
            discount_fixed_amount: model.discount_fixed_amount,
            author_id: model.author_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<Coupon> for ActiveModel {
    fn from(coupon: Coupon) -> Self {
        ActiveModel {
            id: Set(coupon.id),
            code: Set(coupon.code),
            description: Set(coupon.description),
            state: Set(coupon.state.to_string()),
            category: Set(coupon.category.to_string()),
            scope: Set(coupon.scope.to_string()),
            coupon_type: Set(coupon.coupon_type.to_string()),
            minimum_order_amount: Set(coupon.minimum_order_amount),
            max_uses: Set(Some(coupon.max_uses)),
            max_uses_per_user: Set(Some(coupon.max_uses_per_user)),
            start_from: Set(coupon.start_from.into()),
            end_at: Set(coupon.end_at.into()),
            discount_percentage: Set(coupon.discount_percentage),
            discount_fixed_amount: Set(coupon.discount_fixed_amount),
            author_id: Set(coupon.author_id),
            created_at: Set(coupon.created_at.into()),
            updated_at: Set(coupon.updated_at.into()),
        }
    }
}
