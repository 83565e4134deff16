use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Product status
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
pub enum ProductStatus {
    /// In stock and for sale
    #[default]
    Available,
    /// Quantity reached zero
    OutOfStock,
    /// Withdrawn by the seller
    Inactive,
}

impl ProductStatus {
    /// Status implied by a stock level.
    pub fn for_quantity(quantity: i32) -> Self {
        if quantity > 0 {
            ProductStatus::Available
        } else {
            ProductStatus::OutOfStock
        }
    }
}

/// How the product is sold
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
pub enum ProductSellType {
    #[default]
    Direct,
    Auction,
    Offer,
}

/// Physical condition
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
pub enum ProductCondition {
    #[default]
    New,
    LikeNew,
    Used,
    Refurbished,
    ForParts,
}

/// Product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub status: ProductStatus,
    pub sell_type: ProductSellType,
    pub condition: ProductCondition,
    pub condition_comment: Option<String>,
    /// Unit price
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Discounted price, if any
    #[schema(value_type = Option<String>)]
    pub offer_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub shipping_cost: Option<Decimal>,
    /// Shipping charged per extra unit in the same order
    #[schema(value_type = Option<String>)]
    pub each_additional_item_shipping_cost: Option<Decimal>,
    /// Units in stock
    pub quantity: i32,
    pub inventory_location: Option<String>,
    pub warranty: Option<String>,
    pub brand: Option<String>,
    pub product_code: Option<String>,
    pub manufacturing_piece_number: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    /// European Article Number
    pub ean: Option<String>,
    pub manufacturing_place: Option<String>,
    pub category_id: Uuid,
    /// Owning company; `None` for individual sellers
    pub company_id: Option<Uuid>,
    /// Seller who listed the product
    pub author_id: Uuid,
    pub view_count: i64,
    pub favorite_count: i64,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a new listing owned by `author_id`.
    pub fn from_request(input: CreateProduct, author_id: Uuid, company_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name.trim().to_string(),
            status: ProductStatus::for_quantity(input.quantity),
            sell_type: input.sell_type,
            condition: input.condition,
            condition_comment: input.condition_comment,
            price: input.price,
            offer_price: input.offer_price,
            shipping_cost: input.shipping_cost,
            each_additional_item_shipping_cost: input.each_additional_item_shipping_cost,
            quantity: input.quantity,
            inventory_location: input.inventory_location,
            warranty: input.warranty,
            brand: input.brand,
            product_code: input.product_code,
            manufacturing_piece_number: input.manufacturing_piece_number,
            manufacturing_date: input.manufacturing_date,
            expiration_date: input.expiration_date,
            ean: input.ean,
            manufacturing_place: input.manufacturing_place,
            category_id: input.category_id,
            company_id,
            author_id,
            view_count: 0,
            favorite_count: 0,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the stock level and the status that goes with it.
    pub fn set_quantity(&mut self, quantity: i32) {
        self.quantity = quantity;
        self.status = ProductStatus::for_quantity(quantity);
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Stored product picture. Bytes are served by the image endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    /// Size of the stored (resized) image in bytes
    pub file_size: i64,
    pub file_extension: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    #[serde(skip)]
    pub thumbnail: Option<Vec<u8>>,
    pub is_primary: bool,
    /// Position in upload order
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Product with its pictures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductDetails {
    pub product: Product,
    pub images: Vec<ProductImage>,
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub sell_type: ProductSellType,
    #[serde(default)]
    pub condition: ProductCondition,
    #[validate(length(max = 500))]
    pub condition_comment: Option<String>,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String)]
    pub price: Decimal,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>)]
    pub offer_price: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>)]
    pub shipping_cost: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>)]
    pub each_additional_item_shipping_cost: Option<Decimal>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity: i32,
    #[validate(length(max = 255))]
    pub inventory_location: Option<String>,
    #[validate(length(max = 255))]
    pub warranty: Option<String>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(max = 100))]
    pub product_code: Option<String>,
    #[validate(length(max = 100))]
    pub manufacturing_piece_number: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub ean: Option<String>,
    #[validate(length(max = 255))]
    pub manufacturing_place: Option<String>,
    pub category_id: Uuid,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub status: Option<ProductStatus>,
    pub sell_type: Option<ProductSellType>,
    pub condition: Option<ProductCondition>,
    #[validate(length(max = 500))]
    pub condition_comment: Option<String>,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>)]
    pub offer_price: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>)]
    pub shipping_cost: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>)]
    pub each_additional_item_shipping_cost: Option<Decimal>,
    /// Also recalculates the status
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    #[validate(length(max = 255))]
    pub inventory_location: Option<String>,
    #[validate(length(max = 255))]
    pub warranty: Option<String>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(max = 100))]
    pub product_code: Option<String>,
    #[validate(length(max = 100))]
    pub manufacturing_piece_number: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub ean: Option<String>,
    #[validate(length(max = 255))]
    pub manufacturing_place: Option<String>,
    pub category_id: Option<Uuid>,
    /// Images to delete before new ones are appended
    #[serde(default)]
    pub remove_image_ids: Vec<Uuid>,
    /// Image to mark primary after the update
    pub primary_image_id: Option<Uuid>,
}

impl UpdateProduct {
    /// Copies every present field onto `product`.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(sell_type) = self.sell_type {
            product.sell_type = sell_type;
        }
        if let Some(condition) = self.condition {
            product.condition = condition;
        }
        if let Some(comment) = &self.condition_comment {
            product.condition_comment = Some(comment.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(offer_price) = self.offer_price {
            product.offer_price = Some(offer_price);
        }
        if let Some(shipping_cost) = self.shipping_cost {
            product.shipping_cost = Some(shipping_cost);
        }
        if let Some(cost) = self.each_additional_item_shipping_cost {
            product.each_additional_item_shipping_cost = Some(cost);
        }
        if let Some(quantity) = self.quantity {
            product.set_quantity(quantity);
        }
        if let Some(location) = &self.inventory_location {
            product.inventory_location = Some(location.clone());
        }
        if let Some(warranty) = &self.warranty {
            product.warranty = Some(warranty.clone());
        }
        if let Some(brand) = &self.brand {
            product.brand = Some(brand.clone());
        }
        if let Some(code) = &self.product_code {
            product.product_code = Some(code.clone());
        }
        if let Some(piece) = &self.manufacturing_piece_number {
            product.manufacturing_piece_number = Some(piece.clone());
        }
        if let Some(date) = self.manufacturing_date {
            product.manufacturing_date = Some(date);
        }
        if let Some(date) = self.expiration_date {
            product.expiration_date = Some(date);
        }
        if let Some(ean) = &self.ean {
            product.ean = Some(ean.clone());
        }
        if let Some(place) = &self.manufacturing_place {
            product.manufacturing_place = Some(place.clone());
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdatePriceRequest {
    #[schema(value_type = String)]
    pub price: Decimal,
}

/// Query filters for listing products. Deleted products are never listed.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    /// Case-insensitive fragment of the name
    pub name: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category_id: None,
            author_id: None,
            company_id: None,
            name: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        !product.deleted
            && self.category_id.is_none_or(|id| product.category_id == id)
            && self.author_id.is_none_or(|id| product.author_id == id)
            && self.company_id.is_none_or(|id| product.company_id == Some(id))
            && self.name.as_deref().is_none_or(|needle| {
                product
                    .name
                    .to_lowercase()
                    .contains(&needle.trim().to_lowercase())
            })
    }
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct NewArrivalsQuery {
    #[serde(default = "default_arrivals")]
    pub limit: usize,
}

fn default_arrivals() -> usize {
    10
}

/// Paging for the caller's favorites
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct FavoritesQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for FavoritesQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Outcome of toggling a favorite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FavoriteStatus {
    pub product_id: Uuid,
    /// True when the product is now among the caller's favorites
    pub favorited: bool,
    pub favorite_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct ImageUploadQuery {
    /// Make the uploaded image the primary one
    #[serde(default)]
    pub is_primary: bool,
}
