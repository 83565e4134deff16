//! SeaORM entity for `addresses`. The owner is stored as (`owner_kind`, `owner_id`).

use crate::models::{Address, AddressOwner, AddressType};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_kind: String,
    pub owner_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub reference: Option<String>,
    pub address_type: String,
    pub is_default: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Address {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let owner = AddressOwner::from_parts(&model.owner_kind, model.owner_id).ok_or_else(|| {
            DbErr::Type(format!("Unknown address owner kind: {}", model.owner_kind))
        })?;
        let address_type = AddressType::from_str(&model.address_type)
            .map_err(|_| DbErr::Type(format!("Unknown address type: {}", model.address_type)))?;

        Ok(Self {
            id: model.id,
            owner,
            name: model.name,
            email: model.email,
            phone_number: model.phone_number,
            address_line1: model.address_line1,
            address_line2: model.address_line2,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            country: model.country,
            reference: model.reference,
            address_type,
            is_default: model.is_default,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<Address> for ActiveModel {
    fn from(address: Address) -> Self {
        ActiveModel {
            id: Set(address.id),
            owner_kind: Set(address.owner.kind().to_string()),
            owner_id: Set(address.owner.id()),
            name: Set(address.name),
            email: Set(address.email),
            phone_number: Set(address.phone_number),
            address_line1: Set(address.address_line1),
            address_line2: Set(address.address_line2),
            city: Set(address.city),
            state: Set(address.state),
            postal_code: Set(address.postal_code),
            country: Set(address.country),
            reference: Set(address.reference),
            address_type: Set(address.address_type.to_string()),
            is_default: Set(address.is_default),
            created_at: Set(address.created_at.into()),
            updated_at: Set(address.updated_at.into()),
        }
    }
}
