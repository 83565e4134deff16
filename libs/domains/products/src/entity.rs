//! SeaORM entities for `products`, `product_images` and
//! `user_favorite_products`.
//!
//! Enum columns are stored as their SCREAMING_SNAKE names.

pub mod product {
    use crate::models::Product;
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;
    use std::str::FromStr;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "products")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        pub status: String,
        pub sell_type: String,
        pub condition: String,
        pub condition_comment: Option<String>,
        pub price: Decimal,
        pub offer_price: Option<Decimal>,
        pub shipping_cost: Option<Decimal>,
        pub each_additional_item_shipping_cost: Option<Decimal>,
        pub quantity: i32,
        pub inventory_location: Option<String>,
        pub warranty: Option<String>,
        pub brand: Option<String>,
        pub product_code: Option<String>,
        pub manufacturing_piece_number: Option<String>,
        pub manufacturing_date: Option<Date>,
        pub expiration_date: Option<Date>,
        pub ean: Option<String>,
        pub manufacturing_place: Option<String>,
        pub category_id: Uuid,
        pub company_id: Option<Uuid>,
        pub author_id: Uuid,
        pub view_count: i64,
        pub favorite_count: i64,
        pub deleted: bool,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Product {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                name: model.name,
                status: FromStr::from_str(&model.status).unwrap_or_default(),
                sell_type: FromStr::from_str(&model.sell_type).unwrap_or_default(),
                condition: FromStr::from_str(&model.condition).unwrap_or_default(),
                condition_comment: model.condition_comment,
                price: model.price,
                offer_price: model.offer_price,
                shipping_cost: model.shipping_cost,
                each_additional_item_shipping_cost: model.each_additional_item_shipping_cost,
                quantity: model.quantity,
                inventory_location: model.inventory_location,
                warranty: model.warranty,
                brand: model.brand,
                product_code: model.product_code,
                manufacturing_piece_number: model.manufacturing_piece_number,
                manufacturing_date: model.manufacturing_date,
                expiration_date: model.expiration_date,
                ean: model.ean,
                manufacturing_place: model.manufacturing_place,
                category_id: model.category_id,
                company_id: model.company_id,
                author_id: model.author_id,
                view_count: model.view_count,
                favorite_count: model.favorite_count,
                deleted: model.deleted,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<Product> for ActiveModel {
        fn from(product: Product) -> Self {
            ActiveModel {
                id: Set(product.id),
                name: Set(product.name),
                status: Set(product.status.to_string()),
                sell_type: Set(product.sell_type.to_string()),
                condition: Set(product.condition.to_string()),
                condition_comment: Set(product.condition_comment),
                price: Set(product.price),
                offer_price: Set(product.offer_price),
                shipping_cost: Set(product.shipping_cost),
                each_additional_item_shipping_cost: Set(product.each_additional_item_shipping_cost),
                quantity: Set(product.quantity),
                inventory_location: Set(product.inventory_location),
                warranty: Set(product.warranty),
                brand: Set(product.brand),
                product_code: Set(product.product_code),
                manufacturing_piece_number: Set(product.manufacturing_piece_number),
                manufacturing_date: Set(product.manufacturing_date),
                expiration_date: Set(product.expiration_date),
                ean: Set(product.ean),
                manufacturing_place: Set(product.manufacturing_place),
                category_id: Set(product.category_id),
                company_id: Set(product.company_id),
                author_id: Set(product.author_id),
                view_count: Set(product.view_count),
                favorite_count: Set(product.favorite_count),
                deleted: Set(product.deleted),
                created_at: Set(product.created_at.into()),
                updated_at: Set(product.updated_at.into()),
            }
        }
    }
}

pub mod product_image {
    use crate::models::ProductImage;
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "product_images")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub product_id: Uuid,
        pub file_name: String,
        pub content_type: String,
        pub file_size: i64,
        pub file_extension: String,
        pub content: Vec<u8>,
        pub thumbnail: Option<Vec<u8>>,
        pub is_primary: bool,
        pub display_order: i32,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for ProductImage {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                product_id: model.product_id,
                file_name: model.file_name,
                content_type: model.content_type,
                file_size: model.file_size,
                file_extension: model.file_extension,
                content: model.content,
                thumbnail: model.thumbnail,
                is_primary: model.is_primary,
                display_order: model.display_order,
                created_at: model.created_at.into(),
            }
        }
    }

    impl From<ProductImage> for ActiveModel {
        fn from(image: ProductImage) -> Self {
            ActiveModel {
                id: Set(image.id),
                product_id: Set(image.product_id),
                file_name: Set(image.file_name),
                content_type: Set(image.content_type),
                file_size: Set(image.file_size),
                file_extension: Set(image.file_extension),
                content: Set(image.content),
                thumbnail: Set(image.thumbnail),
                is_primary: Set(image.is_primary),
                display_order: Set(image.display_order),
                created_at: Set(image.created_at.into()),
            }
        }
    }
}

pub mod user_favorite {
    use sea_orm::entity::prelude::*;

    /// One row per (user, product) pair the user has favorited.
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "user_favorite_products")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub product_id: Uuid,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::product::Entity",
            from = "Column::ProductId",
            to = "super::product::Column::Id"
        )]
        Product,
    }

    impl Related<super::product::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Product.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
